/*
 * request.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Couchwire, a CouchDB HTTP transport library.
 *
 * Couchwire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Couchwire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Couchwire.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP request: method, path, query parameters, headers, optional body.
//!
//! Built by the API layer, then handed to a `TransportAdapter::send`.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::protocol::http::message::{Envelope, HttpMessage};
use crate::protocol::http::registry::{MessageKind, Registries};

/// RFC 3986 §2.3: everything but unreserved characters is encoded.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    /// WebDAV COPY, used by CouchDB to copy documents (`Destination` header).
    Copy,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Copy => "COPY",
            Method::Other(s) => s,
        }
    }
}

impl From<&str> for Method {
    fn from(verb: &str) -> Self {
        match verb {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            "COPY" => Method::Copy,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_query_param_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Mutable request: method, path, query parameters, headers, body.
#[derive(Debug, Clone)]
pub struct Request {
    envelope: Envelope,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
}

impl Request {
    /// `GET /` against the standard registries.
    pub fn new() -> Self {
        Self::with_registries(Registries::standard())
    }

    pub fn with_registries(registries: Arc<Registries>) -> Self {
        Self {
            envelope: Envelope::new(MessageKind::Request, registries),
            method: Method::Get,
            path: "/".to_string(),
            query: Vec::new(),
        }
    }

    /// Shorthand for `new` + `set_method` + `set_path`.
    pub fn build(method: Method, path: impl Into<String>) -> Result<Self> {
        let mut request = Self::new();
        request.set_method(method)?;
        request.set_path(path)?;
        Ok(request)
    }

    pub fn registries(&self) -> &Arc<Registries> {
        self.envelope.registries()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Fails with `UnsupportedMethod` unless the verb is registered.
    pub fn set_method(&mut self, method: impl Into<Method>) -> Result<()> {
        let method = method.into();
        if !self.registries().methods().contains(method.as_str()) {
            return Err(Error::UnsupportedMethod(method.as_str().to_string()));
        }
        self.method = method;
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stored verbatim: path segments must already be percent-encoded. Spaces and
    /// control characters would split the request line and are rejected.
    pub fn set_path(&mut self, path: impl Into<String>) -> Result<()> {
        let path = path.into();
        if path.is_empty() || path.bytes().any(|b| b == b' ' || b.is_ascii_control()) {
            return Err(Error::invalid_argument(format!("invalid request path {:?}", path)));
        }
        self.path = path;
        Ok(())
    }

    /// Set a query parameter, replacing an earlier value of the same name.
    pub fn set_query_param(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        if !is_query_param_name(name) {
            return Err(Error::invalid_argument(format!("invalid query parameter name {:?}", name)));
        }
        let value = value.into();
        match self.query.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.query.push((name.to_string(), value)),
        }
        Ok(())
    }

    /// Set a query parameter to the JSON encoding of `value` (CouchDB view keys).
    pub fn set_json_query_param<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.set_query_param(name, encoded)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// `""` with no parameters, else `?a=1&b=x%20y`.
    pub fn query_string(&self) -> String {
        if self.query.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = self
            .query
            .iter()
            .map(|(name, value)| format!("{}={}", name, utf8_percent_encode(value, QUERY_VALUE)))
            .collect();
        format!("?{}", pairs.join("&"))
    }

    /// Path followed by the query string, as written on the request line.
    pub fn request_target(&self) -> String {
        format!("{}{}", self.path, self.query_string())
    }

    /// `Authorization: Basic base64(user:pass)`.
    pub fn set_basic_auth(&mut self, user: &str, password: &str) -> Result<()> {
        let token = BASE64.encode(format!("{}:{}", user, password));
        self.set_header_field("Authorization", &format!("Basic {}", token))
    }

    pub fn set_body(&mut self, body: impl Into<bytes::Bytes>) {
        self.envelope.set_body(body);
    }

    /// Serialize `value` as the body and set `Content-Type: application/json`.
    pub fn set_json_body<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let body = serde_json::to_vec(value)?;
        self.set_header_field("Content-Type", "application/json")?;
        self.envelope.set_body(body);
        Ok(())
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMessage for Request {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}
