/*
 * registry.rs
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

//! Header-field, method and status-code registries.
//!
//! The standard tables are built once per process and shared as `Arc<Registries>`.
//! Custom entries are added through `&mut` on an owned bundle; use `Arc::make_mut`
//! to get a private copy of the shared one:
//!
//! ```
//! use std::sync::Arc;
//! use couchwire_core::protocol::http::Registries;
//!
//! let mut registries = Registries::standard();
//! Arc::make_mut(&mut registries).add_custom_method("PURGE").unwrap();
//! assert!(registries.methods().contains("PURGE"));
//! assert!(!Registries::standard().methods().contains("PURGE"));
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

/// Fields legal in both requests and responses (RFC 2616 §4.5 general, §7.1 entity).
const GENERAL_ENTITY_FIELDS: &[&str] = &[
    "Cache-Control",
    "Connection",
    "Date",
    "Pragma",
    "Trailer",
    "Transfer-Encoding",
    "Upgrade",
    "Via",
    "Warning",
    "Allow",
    "Content-Encoding",
    "Content-Language",
    "Content-Length",
    "Content-Location",
    "Content-MD5",
    "Content-Range",
    "Content-Type",
    "Expires",
    "Last-Modified",
    "X-Couch-Full-Commit",
];

const REQUEST_FIELDS: &[&str] = &[
    "Accept",
    "Accept-Charset",
    "Accept-Encoding",
    "Accept-Language",
    "Authorization",
    "Cookie",
    "Destination",
    "Expect",
    "From",
    "Host",
    "If-Match",
    "If-Modified-Since",
    "If-None-Match",
    "If-Range",
    "If-Unmodified-Since",
    "Max-Forwards",
    "Proxy-Authorization",
    "Range",
    "Referer",
    "TE",
    "User-Agent",
];

const RESPONSE_FIELDS: &[&str] = &[
    "Accept-Ranges",
    "Age",
    "ETag",
    "Location",
    "Proxy-Authenticate",
    "Retry-After",
    "Server",
    "Set-Cookie",
    "Vary",
    "WWW-Authenticate",
    "X-CouchDB-WWW-Authenticate",
];

const STANDARD_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS", "TRACE", "CONNECT", "PATCH", "COPY",
];

const STANDARD_STATUSES: &[(u16, &str)] = &[
    (100, "Continue"),
    (101, "Switching Protocols"),
    (102, "Processing"),
    (103, "Early Hints"),
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (207, "Multi-Status"),
    (208, "Already Reported"),
    (226, "IM Used"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (305, "Use Proxy"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Request Entity Too Large"),
    (414, "Request-URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Requested Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (421, "Misdirected Request"),
    (422, "Unprocessable Entity"),
    (423, "Locked"),
    (424, "Failed Dependency"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (507, "Insufficient Storage"),
    (508, "Loop Detected"),
    (510, "Not Extended"),
    (511, "Network Authentication Required"),
];

/// Which message kind a header registry governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// RFC 7230 `token`: the characters allowed in a header field name or method.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Set of legal header field names. Lookup is case-insensitive; the casing given at
/// registration is the one written on the wire.
#[derive(Debug, Clone, Default)]
pub struct HeaderRegistry {
    fields: BTreeMap<String, String>,
}

impl HeaderRegistry {
    fn from_tables(tables: &[&[&str]]) -> Self {
        let mut fields = BTreeMap::new();
        for table in tables {
            for name in *table {
                fields.insert(name.to_ascii_lowercase(), name.to_string());
            }
        }
        Self { fields }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Registration-time casing of `name`, if registered.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Register a new field name. Fails if the name is not a token or already known.
    pub fn register(&mut self, name: &str) -> Result<()> {
        if !is_token(name) {
            return Err(Error::invalid_argument(format!("invalid header field name {:?}", name)));
        }
        let key = name.to_ascii_lowercase();
        if self.fields.contains_key(&key) {
            return Err(Error::invalid_argument(format!(
                "header field {} is already registered",
                name
            )));
        }
        self.fields.insert(key, name.to_string());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.values().map(String::as_str)
    }
}

/// Set of legal request methods (verbs are case-sensitive per RFC 7231 §4.1).
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    verbs: Vec<String>,
}

impl MethodRegistry {
    pub fn contains(&self, verb: &str) -> bool {
        self.verbs.iter().any(|v| v == verb)
    }

    pub fn register(&mut self, verb: &str) -> Result<()> {
        if !is_token(verb) {
            return Err(Error::invalid_argument(format!("invalid method {:?}", verb)));
        }
        if self.contains(verb) {
            return Err(Error::invalid_argument(format!("method {} is already registered", verb)));
        }
        self.verbs.push(verb.to_string());
        Ok(())
    }
}

/// Status code → reason phrase.
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    codes: BTreeMap<u16, String>,
}

impl StatusRegistry {
    pub fn reason(&self, code: u16) -> Option<&str> {
        self.codes.get(&code).map(String::as_str)
    }

    pub fn contains(&self, code: u16) -> bool {
        self.codes.contains_key(&code)
    }

    pub fn register(&mut self, code: u16, reason: &str) -> Result<()> {
        if !(100..=999).contains(&code) {
            return Err(Error::invalid_argument(format!("status code {} is not three digits", code)));
        }
        if reason.contains(['\r', '\n']) {
            return Err(Error::invalid_argument("reason phrase contains a line break"));
        }
        if self.codes.contains_key(&code) {
            return Err(Error::invalid_argument(format!("status code {} is already registered", code)));
        }
        self.codes.insert(code, reason.to_string());
        Ok(())
    }
}

/// The registries consulted by requests and responses.
#[derive(Debug, Clone)]
pub struct Registries {
    request_headers: HeaderRegistry,
    response_headers: HeaderRegistry,
    methods: MethodRegistry,
    statuses: StatusRegistry,
}

static STANDARD: OnceLock<Arc<Registries>> = OnceLock::new();

impl Registries {
    /// Shared standard tables, built on first call.
    pub fn standard() -> Arc<Registries> {
        STANDARD.get_or_init(|| Arc::new(Self::build_standard())).clone()
    }

    fn build_standard() -> Self {
        Self {
            request_headers: HeaderRegistry::from_tables(&[GENERAL_ENTITY_FIELDS, REQUEST_FIELDS]),
            response_headers: HeaderRegistry::from_tables(&[GENERAL_ENTITY_FIELDS, RESPONSE_FIELDS]),
            methods: MethodRegistry {
                verbs: STANDARD_METHODS.iter().map(|m| m.to_string()).collect(),
            },
            statuses: StatusRegistry {
                codes: STANDARD_STATUSES
                    .iter()
                    .map(|(code, reason)| (*code, reason.to_string()))
                    .collect(),
            },
        }
    }

    pub fn headers(&self, kind: MessageKind) -> &HeaderRegistry {
        match kind {
            MessageKind::Request => &self.request_headers,
            MessageKind::Response => &self.response_headers,
        }
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    pub fn add_custom_header_field(&mut self, kind: MessageKind, name: &str) -> Result<()> {
        match kind {
            MessageKind::Request => self.request_headers.register(name),
            MessageKind::Response => self.response_headers.register(name),
        }
    }

    pub fn add_custom_method(&mut self, verb: &str) -> Result<()> {
        self.methods.register(verb)
    }

    pub fn add_custom_status_code(&mut self, code: u16, reason: &str) -> Result<()> {
        self.statuses.register(code, reason)
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::build_standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn couchdb_extensions_are_standard() {
        let r = Registries::standard();
        assert!(r.methods().contains("COPY"));
        assert!(r.headers(MessageKind::Request).contains("destination"));
        assert!(r.headers(MessageKind::Request).contains("X-Couch-Full-Commit"));
        assert!(r.headers(MessageKind::Response).contains("x-couchdb-www-authenticate"));
        assert!(!r.headers(MessageKind::Response).contains("Destination"));
    }

    #[test]
    fn canonical_casing_is_registration_casing() {
        let r = Registries::standard();
        let req = r.headers(MessageKind::Request);
        assert_eq!(req.canonical("te"), Some("TE"));
        assert_eq!(req.canonical("CONTENT-MD5"), Some("Content-MD5"));
        assert_eq!(r.headers(MessageKind::Response).canonical("etag"), Some("ETag"));
    }

    #[test]
    fn registering_twice_fails() {
        let mut r = Registries::default();
        r.add_custom_header_field(MessageKind::Request, "X-Trace").unwrap();
        assert!(r.add_custom_header_field(MessageKind::Request, "x-trace").is_err());
        assert!(r.add_custom_method("GET").is_err());
        assert!(r.add_custom_status_code(200, "Fine").is_err());
    }

    #[test]
    fn rejects_non_token_names() {
        let mut r = Registries::default();
        assert!(matches!(
            r.add_custom_header_field(MessageKind::Request, "Bad Name"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(r.add_custom_method("").is_err());
    }

    #[test]
    fn custom_status_code() {
        let mut r = Registries::default();
        assert!(!r.statuses().contains(999));
        r.add_custom_status_code(999, "Nope").unwrap();
        assert_eq!(r.statuses().reason(999), Some("Nope"));
        assert!(r.add_custom_status_code(1000, "Too long").is_err());
    }

    #[test]
    fn make_mut_leaves_shared_standard_untouched() {
        let mut r = Registries::standard();
        Arc::make_mut(&mut r).add_custom_method("PURGE").unwrap();
        assert!(r.methods().contains("PURGE"));
        assert!(!Registries::standard().methods().contains("PURGE"));
    }
}
