/*
 * body.rs
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

//! Blocking readers for the response head and body over a buffered stream.
//!
//! Body framing (RFC 7230 §3.3.3): chunked, Content-Length, or read until close.
//! Every read accumulates across short reads; nothing assumes the body is text.

use std::io::{self, BufRead, Read};

use log::trace;

use crate::error::{Error, Result};
use crate::protocol::http::handler::ChunkSink;
use crate::protocol::http::message::HttpMessage;
use crate::protocol::http::request::Method;
use crate::protocol::http::response::Response;

/// How the body of a response is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// HEAD responses, 1xx, 204 and 304.
    Empty,
    Chunked,
    Length(u64),
    /// No length information: the body ends when the server closes the stream.
    UntilClose,
}

/// Decide the body framing of `response` to a `method` request (RFC 7230 §3.3.3).
pub fn body_framing(method: &Method, response: &Response) -> Result<BodyFraming> {
    let code = response.status_code();
    if *method == Method::Head || (100..200).contains(&code) || code == 204 || code == 304 {
        return Ok(BodyFraming::Empty);
    }
    if response.is_chunked() {
        return Ok(BodyFraming::Chunked);
    }
    if response.has_header_field("Transfer-Encoding") {
        // A coding other than chunked last: only the close delimits it.
        return Ok(BodyFraming::UntilClose);
    }
    if let Some(length) = response.content_length()? {
        return Ok(BodyFraming::Length(length));
    }
    if response.closes_connection() {
        return Ok(BodyFraming::UntilClose);
    }
    Ok(BodyFraming::Empty)
}

/// Read the body with the given framing into `sink`.
pub fn read_body<R: BufRead>(reader: &mut R, framing: BodyFraming, sink: &mut dyn ChunkSink) -> Result<()> {
    match framing {
        BodyFraming::Empty => {}
        BodyFraming::Chunked => {
            read_chunked(reader, sink)?;
        }
        BodyFraming::Length(length) => read_fixed(reader, length, sink)?,
        BodyFraming::UntilClose => {
            read_to_close(reader, sink)?;
        }
    }
    Ok(())
}

/// Longest accepted line (status line, header line, chunk-size line).
pub const MAX_LINE: usize = 8192;

/// Longest accepted head (status line plus all headers).
pub const MAX_HEAD: usize = 64 * 1024;

/// Read one line and strip its CRLF (or bare LF).
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE as u64 + 2)
        .read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed while reading a line",
        ));
    }
    if line.last() != Some(&b'\n') {
        if line.len() > MAX_LINE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", MAX_LINE),
            ));
        }
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed in the middle of a line",
        ));
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

/// Read a status line and header block up to and including the blank line.
/// Blank lines before the status line are skipped. Lines are re-terminated with CRLF.
pub fn read_head<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut head = Vec::new();
    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            if head.is_empty() {
                continue;
            }
            head.extend_from_slice(b"\r\n");
            return Ok(head);
        }
        if head.len() + line.len() > MAX_HEAD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("response head exceeds {} bytes", MAX_HEAD),
            )
            .into());
        }
        head.extend_from_slice(&line);
        head.extend_from_slice(b"\r\n");
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64> {
    let size = line.split(|&b| b == b';').next().unwrap_or(line);
    let size = std::str::from_utf8(size)
        .map_err(|_| Error::malformed_chunked_body(line))?
        .trim_matches(|c| c == ' ' || c == '\t');
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::malformed_chunked_body(line));
    }
    u64::from_str_radix(size, 16).map_err(|_| Error::malformed_chunked_body(line))
}

/// Decode a chunked body, handing each chunk to `sink`. Stops after the zero-size
/// chunk and its trailer block; nothing past that is consumed. Returns the body length.
pub fn read_chunked<R: BufRead>(reader: &mut R, sink: &mut dyn ChunkSink) -> Result<u64> {
    let mut total = 0u64;
    loop {
        let mut line = read_line(reader)?;
        while line.iter().all(|b| b.is_ascii_whitespace()) {
            line = read_line(reader)?;
        }
        let size = parse_chunk_size(&line)?;
        if size == 0 {
            // Trailers carry nothing CouchDB needs.
            loop {
                let trailer = read_line(reader)?;
                if trailer.is_empty() {
                    break;
                }
                trace!("Discarding trailer {:?}", String::from_utf8_lossy(&trailer));
            }
            trace!("Chunked body complete: {} bytes", total);
            return Ok(total);
        }

        let mut chunk = Vec::new();
        let n = reader.by_ref().take(size).read_to_end(&mut chunk)?;
        if (n as u64) < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection closed after {} of {} chunk bytes", n, size),
            )
            .into());
        }
        let end = read_line(reader)?;
        if !end.is_empty() {
            return Err(Error::malformed_chunked_body(&end));
        }
        trace!("Read chunk of {} bytes", size);
        sink.process(&chunk);
        total += size;
    }
}

/// Read exactly `length` body bytes, delivering them as they arrive.
pub fn read_fixed<R: Read>(reader: &mut R, length: u64, sink: &mut dyn ChunkSink) -> Result<()> {
    let mut buf = vec![0u8; MAX_LINE];
    let mut remaining = length;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("connection closed after {} of {} body bytes", length - remaining, length),
                )
                .into())
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        sink.process(&buf[..n]);
        remaining -= n as u64;
    }
    Ok(())
}

/// Read until the peer closes the connection.
pub fn read_to_close<R: Read>(reader: &mut R, sink: &mut dyn ChunkSink) -> Result<u64> {
    let mut buf = vec![0u8; MAX_LINE];
    let mut total = 0u64;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                sink.process(&buf[..n]);
                total += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
