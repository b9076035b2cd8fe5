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

//! HTTP/1.1 wire format: request writer, response head parser, body framing.

pub mod body;
mod parser;
mod writer;

pub use body::{
    body_framing, read_body, read_chunked, read_fixed, read_head, read_line, read_to_close,
    BodyFraming,
};
pub use parser::{parse_header_lines, parse_response_head, parse_status_line};
pub use writer::serialize_request;
