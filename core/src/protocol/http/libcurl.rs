/*
 * libcurl.rs
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

//! libcurl transport. The handle does connection reuse, TLS and body framing; we
//! supply the decorated headers and parse the head it hands back.

use bytes::BytesMut;
use curl::easy::{Easy, HttpVersion, List};
use log::{debug, trace};

use crate::config::{ConnectionMode, TransportConfig};
use crate::error::Result;
use crate::protocol::http::adapter::{decorate_request, TransportAdapter};
use crate::protocol::http::h1::parse_response_head;
use crate::protocol::http::handler::{ChunkSink, HeaderSink};
use crate::protocol::http::message::HttpMessage;
use crate::protocol::http::request::{Method, Request};
use crate::protocol::http::response::Response;
use crate::uri::Endpoint;

/// Transport over one libcurl easy handle.
pub struct CurlAdapter {
    endpoint: Endpoint,
    config: TransportConfig,
    easy: Easy,
}

/// Request header lines in libcurl's form. An empty value is written `Name;`
/// (libcurl drops `Name:` with nothing after it). `Expect:` disables the
/// `100-continue` handshake unless the caller asked for one.
fn header_lines(request: &Request) -> Vec<String> {
    let mut lines: Vec<String> = request
        .envelope()
        .header_fields()
        .map(|(name, value)| {
            if value.is_empty() {
                format!("{};", name)
            } else {
                format!("{}: {}", name, value)
            }
        })
        .collect();
    if !request.has_header_field("Expect") {
        lines.push("Expect:".to_string());
    }
    lines
}

impl CurlAdapter {
    pub fn new(endpoint: Endpoint, config: TransportConfig) -> Self {
        Self {
            endpoint,
            config,
            easy: Easy::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn prepare(&mut self, request: &Request) -> Result<()> {
        let easy = &mut self.easy;
        easy.reset();
        easy.url(&self.endpoint.url(&request.request_target()))?;
        easy.http_version(HttpVersion::V11)?;
        easy.connect_timeout(self.config.socket_timeout)?;
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.config.socket_timeout)?;
        if self.config.connection == ConnectionMode::Ephemeral {
            easy.forbid_reuse(true)?;
        }

        let length = request.body_length() as u64;
        match request.method() {
            Method::Get => easy.get(true)?,
            Method::Head => easy.nobody(true)?,
            Method::Post => {
                easy.post(true)?;
                easy.post_field_size(length)?;
            }
            Method::Put => {
                easy.upload(true)?;
                easy.in_filesize(length)?;
            }
            other => {
                easy.custom_request(other.as_str())?;
                if request.has_body() {
                    easy.post(true)?;
                    easy.post_field_size(length)?;
                }
            }
        }

        let mut list = List::new();
        for line in header_lines(request) {
            list.append(&line)?;
        }
        easy.http_headers(list)?;
        Ok(())
    }

    /// Run the prepared transfer. Body bytes go to `sink`; the returned buffer holds
    /// the final response head.
    fn perform(&mut self, request: &Request, sink: &mut dyn ChunkSink) -> Result<BytesMut> {
        let mut head = BytesMut::new();
        let mut upload: &[u8] = request.body();
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|line| {
                // Each status line starts a new head; keep only the last (after 1xx).
                if line.starts_with(b"HTTP/") {
                    head.clear();
                }
                head.header_line(line);
                true
            })?;
            transfer.write_function(|data| {
                sink.process(data);
                Ok(data.len())
            })?;
            transfer.read_function(|buf| {
                let n = upload.len().min(buf.len());
                buf[..n].copy_from_slice(&upload[..n]);
                upload = &upload[n..];
                Ok(n)
            })?;
            transfer.perform()?;
        }
        Ok(head)
    }
}

impl TransportAdapter for CurlAdapter {
    fn send(&mut self, request: &mut Request, sink: Option<&mut dyn ChunkSink>) -> Result<Response> {
        decorate_request(request, &self.endpoint, &self.config)?;
        if self.config.connection == ConnectionMode::Ephemeral {
            request.set_header_field("Connection", "close")?;
        }
        debug!("{} {} to {} via libcurl", request.method(), request.request_target(), self.endpoint);
        self.prepare(request)?;

        let mut body = BytesMut::new();
        let head = match sink {
            Some(sink) => self.perform(request, sink)?,
            None => self.perform(request, &mut body)?,
        };
        trace!("libcurl head: {} bytes, body: {} bytes", head.len(), body.len());
        let mut response = parse_response_head(&head, request.registries())?;
        response.set_body(body.freeze());
        debug!("{} {}", response.status_code(), response.reason_phrase());
        Ok(response)
    }
}
