/*
 * lib.rs
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

//! Couchwire core: the HTTP/1.1 transport under a CouchDB client.
//!
//! Build a [`Request`](protocol::http::Request), hand it to a
//! [`TransportAdapter`](protocol::http::TransportAdapter) and get a
//! [`Response`](protocol::http::Response) back, or stream the body into a
//! [`ChunkSink`](protocol::http::ChunkSink).

pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod uri;

pub use config::{ConnectionMode, TransportConfig};
pub use error::{Error, Result};
pub use uri::{Endpoint, Scheme};
