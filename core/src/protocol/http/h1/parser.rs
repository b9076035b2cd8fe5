/*
 * parser.rs
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

//! HTTP/1.x response head parser: status line and header block.
//!
//! Input is the raw head as the adapter read it, already split from the body. Both
//! adapters use it: the socket adapter on the lines it read, the libcurl adapter on
//! the bytes its header callback collected.

use std::sync::Arc;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::http::message::HttpMessage;
use crate::protocol::http::registry::{is_token, Registries};
use crate::protocol::http::response::Response;

const STATUS_CONTINUE: u16 = 100;

/// Lines of one head block (line terminators stripped) and the bytes after it.
fn split_block(raw: &[u8]) -> (Vec<&[u8]>, &[u8]) {
    let mut lines = Vec::new();
    let mut pos = 0;
    while pos < raw.len() {
        let (line, next) = match raw[pos..].iter().position(|&b| b == b'\n') {
            Some(n) => (&raw[pos..pos + n], pos + n + 1),
            None => (&raw[pos..], raw.len()),
        };
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        pos = next;
        if line.is_empty() {
            if lines.is_empty() {
                // Stray blank line before the status line.
                continue;
            }
            return (lines, &raw[pos..]);
        }
        lines.push(line);
    }
    (lines, &raw[pos..])
}

/// `HTTP/1.<0|1> <3 digits>` followed by a space or the end of the line.
/// Returns (minor version, status code).
pub fn parse_status_line(line: &[u8]) -> Result<(u8, u16)> {
    let malformed = || Error::malformed_status_line(line);
    let rest = line.strip_prefix(b"HTTP/1.").ok_or_else(malformed)?;
    let minor = match rest.first() {
        Some(b'0') => 0,
        Some(b'1') => 1,
        _ => return Err(malformed()),
    };
    if rest.get(1) != Some(&b' ') {
        return Err(malformed());
    }
    let digits = rest.get(2..5).ok_or_else(malformed)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    match rest.get(5) {
        None | Some(b' ') => {}
        Some(_) => return Err(malformed()),
    }
    let code = digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    Ok((minor, code))
}

/// Turn header lines into `(name, value)` pairs, unfolding obsolete line folding
/// (RFC 2616 §2.2): a line starting with SP or HT continues the previous value.
pub fn parse_header_lines<'a, I>(lines: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in lines {
        let text = String::from_utf8_lossy(line);
        if line.first().map_or(false, |b| *b == b' ' || *b == b'\t') {
            match headers.last_mut() {
                Some((_, value)) => {
                    let folded = text.trim_matches(|c| c == ' ' || c == '\t');
                    if !folded.is_empty() {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(folded);
                    }
                }
                None => debug!("Continuation line without a header: {:?}", text),
            }
            continue;
        }
        let Some(colon) = text.find(':') else {
            debug!("Skipping header line without colon: {:?}", text);
            continue;
        };
        let name = text[..colon].trim();
        if !is_token(name) {
            debug!("Skipping header with invalid name: {:?}", name);
            continue;
        }
        let value = text[colon + 1..].trim_matches(|c| c == ' ' || c == '\t');
        headers.push((name.to_string(), value.to_string()));
    }
    headers
}

/// Parse a status line and header block into a `Response` (body empty).
///
/// A `100 Continue` head followed by another block yields the second block's
/// response. When nothing follows, the 100 response itself is returned and the
/// caller is expected to read the next block and parse again.
pub fn parse_response_head(raw: &[u8], registries: &Arc<Registries>) -> Result<Response> {
    let (lines, rest) = split_block(raw);
    let status_line = lines.first().copied().unwrap_or(raw);
    let (minor, code) = parse_status_line(status_line)?;
    if code == STATUS_CONTINUE && rest.iter().any(|b| !b.is_ascii_whitespace()) {
        trace!("Skipping 100 Continue head");
        return parse_response_head(rest, registries);
    }

    let mut response = Response::new(registries.clone(), minor, code)?;
    for (name, value) in parse_header_lines(lines.into_iter().skip(1)) {
        response.envelope_mut().append_parsed_header(&name, &value);
    }
    trace!(
        "Parsed head: HTTP/1.{} {} ({} header lines)",
        minor,
        code,
        response.envelope().header_fields().count()
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::{MessageKind, Method, Request};

    fn parse(raw: &[u8]) -> Result<Response> {
        parse_response_head(raw, &Registries::standard())
    }

    #[test]
    fn status_and_headers() {
        let r = parse(b"HTTP/1.1 201 Created\r\ncontent-type: application/json\r\nETag: \"1-abc\"\r\n\r\n")
            .unwrap();
        assert_eq!(r.status_code(), 201);
        assert_eq!(r.minor_version(), 1);
        assert_eq!(r.header_field_value("Content-Type"), Some("application/json"));
        assert_eq!(r.header_field_value("etag"), Some("\"1-abc\""));
        let names: Vec<_> = r.envelope().header_fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["Content-Type", "Etag"]);
    }

    #[test]
    fn status_line_without_reason() {
        assert_eq!(parse_status_line(b"HTTP/1.0 204").unwrap(), (0, 204));
        assert_eq!(parse_status_line(b"HTTP/1.1 200 OK").unwrap(), (1, 200));
    }

    #[test]
    fn malformed_status_lines() {
        for line in [
            &b"HTTP/2 200 OK"[..],
            b"HTTP/1.2 200 OK",
            b"HTTP/1.1 20 OK",
            b"HTTP/1.1 2000 OK",
            b"HTTP/1.1  200 OK",
            b"ICY 200 OK",
            b"",
        ] {
            match parse_status_line(line) {
                Err(Error::MalformedStatusLine { raw }) => assert_eq!(raw, line),
                other => panic!("{:?} gave {:?}", String::from_utf8_lossy(line), other),
            }
        }
    }

    #[test]
    fn unknown_status_code_unless_registered() {
        assert!(matches!(
            parse(b"HTTP/1.1 999 Nope\r\n\r\n"),
            Err(Error::UnknownStatusCode(999))
        ));

        let mut registries = Registries::standard();
        Arc::make_mut(&mut registries)
            .add_custom_status_code(999, "Nope")
            .unwrap();
        let r = parse_response_head(b"HTTP/1.1 999 Nope\r\n\r\n", &registries).unwrap();
        assert_eq!(r.status_code(), 999);
        assert_eq!(r.reason_phrase(), "Nope");
    }

    #[test]
    fn unfolds_continuation_lines() {
        let r = parse(b"HTTP/1.1 200 OK\r\nX-Long: first\r\n  second\r\n\tthird\r\nServer: CouchDB\r\n\r\n")
            .unwrap();
        assert_eq!(r.header_field_value("x-long"), Some("first second third"));
        assert_eq!(r.header_field_value("Server"), Some("CouchDB"));
    }

    #[test]
    fn repeated_headers_accumulate() {
        let r = parse(b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nset-cookie: b=2\r\n\r\n").unwrap();
        assert_eq!(r.header_field_values("Set-Cookie"), ["a=1", "b=2"]);
    }

    #[test]
    fn skips_lines_without_colon() {
        let r = parse(b"HTTP/1.1 200 OK\r\ngarbage\r\nServer: x\r\n\r\n").unwrap();
        assert_eq!(r.envelope().header_fields().count(), 1);
    }

    #[test]
    fn continue_recurses_into_second_block() {
        let r = parse(
            b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 201 Created\r\nLocation: /db/doc\r\n\r\n",
        )
        .unwrap();
        assert_eq!(r.status_code(), 201);
        assert_eq!(r.header_field_value("Location"), Some("/db/doc"));
    }

    #[test]
    fn lone_continue_is_returned() {
        let r = parse(b"HTTP/1.1 100 Continue\r\n\r\n").unwrap();
        assert_eq!(r.status_code(), 100);
    }

    #[test]
    fn bare_lf_line_endings() {
        let r = parse(b"HTTP/1.1 200 OK\nContent-Length: 2\n\n").unwrap();
        assert_eq!(r.content_length().unwrap(), Some(2));
    }

    #[test]
    fn request_headers_round_trip_through_header_parser() {
        let mut request = Request::build(Method::Put, "/db/doc").unwrap();
        request.set_header_field("content-type", "application/json").unwrap();
        request.envelope_mut().set_body(&b"{\"a\":1}"[..]);
        assert_eq!(request.envelope().kind(), MessageKind::Request);

        let wire = crate::protocol::http::h1::serialize_request(&request);
        let (lines, rest) = split_block(&wire);
        assert_eq!(lines[0], b"PUT /db/doc HTTP/1.1");
        assert_eq!(rest, b"{\"a\":1}\r\n");

        let headers = parse_header_lines(lines.into_iter().skip(1));
        assert_eq!(
            headers,
            [("Content-Type".to_string(), "application/json".to_string())]
        );
    }
}
