/*
 * error.rs
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

//! Transport errors.
//!
//! Registry failures are recoverable by registering the missing entry. Parse failures
//! (`MalformedStatusLine`, `MalformedChunkedBody`, `MalformedHeader`) mean the connection
//! can no longer be trusted. Nothing is retried inside the transport.

use std::io;

use thiserror::Error;

use crate::protocol::http::{Response, StatusClass};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported header field: {0}")]
    UnsupportedHeaderField(String),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("unknown status code: {0}")]
    UnknownStatusCode(u16),

    #[error("malformed status line: {:?}", String::from_utf8_lossy(.raw))]
    MalformedStatusLine { raw: Vec<u8> },

    #[error("malformed chunked body: {:?}", String::from_utf8_lossy(.raw))]
    MalformedChunkedBody { raw: Vec<u8> },

    #[error("malformed {name} header: {value:?}")]
    MalformedHeader { name: String, value: String },

    /// Socket, TLS or libcurl failure. The message is the underlying error text.
    #[error("{message}")]
    Transport {
        message: String,
        kind: Option<io::ErrorKind>,
    },

    /// The exchange succeeded but the server answered 4xx/5xx.
    #[error("HTTP {} {}", .response.status_code(), .response.reason_phrase())]
    HttpStatus {
        class: StatusClass,
        response: Box<Response>,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            kind: None,
        }
    }

    pub fn malformed_status_line(raw: &[u8]) -> Self {
        Self::MalformedStatusLine { raw: raw.to_vec() }
    }

    pub fn malformed_chunked_body(raw: &[u8]) -> Self {
        Self::MalformedChunkedBody { raw: raw.to_vec() }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
            kind: Some(e.kind()),
        }
    }
}

#[cfg(feature = "curl")]
impl From<curl::Error> for Error {
    fn from(e: curl::Error) -> Self {
        let message = match e.extra_description() {
            Some(extra) => format!("{}: {}", e.description(), extra),
            None => e.description().to_string(),
        };
        Self::transport(message)
    }
}
