/*
 * response.rs
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

//! HTTP response: status, headers, body. Produced only by the head parser.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::protocol::http::message::{Envelope, HttpMessage};
use crate::protocol::http::registry::{MessageKind, Registries};

/// Coarse status ranges used to decide whether a response is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 1xx and 2xx.
    Success,
    /// 4xx.
    ClientError,
    /// 5xx.
    ServerError,
    /// Anything else, including 3xx.
    Unknown,
}

impl StatusClass {
    pub fn of(code: u16) -> Self {
        match code {
            100..=299 => StatusClass::Success,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    envelope: Envelope,
    minor_version: u8,
    code: u16,
    reason: String,
}

impl Response {
    /// Fails with `UnknownStatusCode` unless `code` is registered.
    pub(crate) fn new(registries: Arc<Registries>, minor_version: u8, code: u16) -> Result<Self> {
        let reason = registries
            .statuses()
            .reason(code)
            .ok_or(Error::UnknownStatusCode(code))?
            .to_string();
        Ok(Self {
            envelope: Envelope::new(MessageKind::Response, registries),
            minor_version,
            code,
            reason,
        })
    }

    pub fn status_code(&self) -> u16 {
        self.code
    }

    /// Reason phrase from the status registry (not the one the server sent).
    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    /// 0 for HTTP/1.0, 1 for HTTP/1.1.
    pub fn minor_version(&self) -> u8 {
        self.minor_version
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.code)
    }

    pub fn is_success(&self) -> bool {
        self.status_class() == StatusClass::Success
    }

    /// `Transfer-Encoding: chunked` (last coding wins, per RFC 7230 §3.3.1).
    pub fn is_chunked(&self) -> bool {
        self.header_field_values("Transfer-Encoding")
            .iter()
            .flat_map(|v| v.split(','))
            .last()
            .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            .unwrap_or(false)
    }

    /// Parsed `Content-Length`, `None` when absent.
    pub fn content_length(&self) -> Result<Option<u64>> {
        match self.header_field_value("Content-Length") {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| Error::MalformedHeader {
                    name: "Content-Length".to_string(),
                    value: value.to_string(),
                }),
        }
    }

    /// True when the server will close the connection after this response.
    pub fn closes_connection(&self) -> bool {
        let close = self
            .header_field_values("Connection")
            .iter()
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case("close"));
        close || (self.minor_version == 0 && !self.keep_alive_requested())
    }

    fn keep_alive_requested(&self) -> bool {
        self.header_field_values("Connection")
            .iter()
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case("keep-alive"))
    }

    /// Assigned once the body has been read.
    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.envelope.set_body(body);
    }

    /// Deserialize the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(self.body())?)
    }
}

impl HttpMessage for Response {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}
