/*
 * mod.rs
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

//! HTTP/1.1 for CouchDB: message model, extensible registries, and the transports
//! that move requests to the server.
//!
//! - Registries: immutable standard tables for header fields, methods and status codes;
//!   custom entries go into a copy owned by whoever registered them.
//! - `Request` / `Response` share an `Envelope` (headers and body) through `HttpMessage`.
//! - `h1`: wire format (request serialization, head parsing, body framing).
//! - Transports implement `TransportAdapter`: `SocketAdapter` (TCP or rustls TLS) and,
//!   with the `curl` feature, `CurlAdapter`.

mod adapter;
mod handler;
mod message;
mod registry;
mod request;
mod response;

pub mod client;
pub mod connection;
pub mod h1;
#[cfg(feature = "curl")]
pub mod libcurl;

pub use adapter::{classify, decorate_request, send_checked, Outcome, TransportAdapter};
pub use client::HttpStream;
pub use connection::SocketAdapter;
pub use handler::ChunkSink;
#[cfg(feature = "curl")]
pub use libcurl::CurlAdapter;
pub use message::{title_case, Envelope, HttpMessage};
pub use registry::{HeaderRegistry, MessageKind, MethodRegistry, Registries, StatusRegistry};
pub use request::{Method, Request};
pub use response::{Response, StatusClass};
