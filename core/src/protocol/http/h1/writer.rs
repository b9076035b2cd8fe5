/*
 * writer.rs
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

//! HTTP/1.1 request serialization.

use crate::protocol::http::message::HttpMessage;
use crate::protocol::http::request::Request;

/// Request line, header lines, blank line, then the body followed by CRLF when
/// there is one. Headers are written as they stand; decorate the request first.
pub fn serialize_request(request: &Request) -> Vec<u8> {
    let target = request.request_target();
    let body = request.body();
    let mut out = Vec::with_capacity(256 + body.len());
    out.extend_from_slice(request.method().as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(target.as_bytes());
    out.extend_from_slice(b" HTTP/1.1\r\n");
    request.envelope().write_header_lines(&mut out);
    out.extend_from_slice(b"\r\n");
    if !body.is_empty() {
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
    }
    out
}
