/*
 * connection.rs
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

//! Socket transport: writes HTTP/1.1 requests on a TCP or TLS stream and reads the
//! response head and body off it.
//!
//! In `Persistent` mode the stream is opened when the adapter is created and kept
//! between requests. It is dropped (and dialled again on the next send) when the
//! server answers `Connection: close`, when the body was delimited by the close, or
//! when an exchange fails part way. In `Ephemeral` mode every send dials, sends
//! `Connection: close` and drops the stream afterwards.

use std::io::{BufReader, Read, Write};

use bytes::BytesMut;
use log::{debug, trace};

use crate::config::{ConnectionMode, TransportConfig};
use crate::error::{Error, Result};
use crate::protocol::http::adapter::{decorate_request, TransportAdapter};
use crate::protocol::http::client::{dial, HttpStream};
use crate::protocol::http::h1::{
    body_framing, parse_response_head, read_body, read_head, serialize_request, BodyFraming,
};
use crate::protocol::http::handler::ChunkSink;
use crate::protocol::http::message::HttpMessage;
use crate::protocol::http::request::Request;
use crate::protocol::http::response::Response;
use crate::uri::Endpoint;

const STATUS_SWITCHING_PROTOCOLS: u16 = 101;

type Dialer<S> = Box<dyn FnMut() -> Result<S> + Send>;

/// HTTP/1.1 over one socket at a time.
pub struct SocketAdapter<S = HttpStream> {
    endpoint: Endpoint,
    config: TransportConfig,
    dialer: Dialer<S>,
    stream: Option<BufReader<S>>,
}

impl SocketAdapter<HttpStream> {
    /// Adapter for `endpoint`. A persistent adapter connects immediately so that an
    /// unreachable server is reported here rather than on the first send.
    pub fn connect(endpoint: Endpoint, config: TransportConfig) -> Result<Self> {
        let (dial_endpoint, dial_config) = (endpoint.clone(), config.clone());
        let mut adapter = Self::with_dialer(endpoint, config, move || dial(&dial_endpoint, &dial_config));
        if adapter.config.connection == ConnectionMode::Persistent {
            adapter.ensure_connected()?;
        }
        Ok(adapter)
    }
}

impl<S: Read + Write> SocketAdapter<S> {
    /// Adapter whose streams come from `dialer`. Nothing is dialled until the first send.
    pub fn with_dialer<F>(endpoint: Endpoint, config: TransportConfig, dialer: F) -> Self
    where
        F: FnMut() -> Result<S> + Send + 'static,
    {
        Self {
            endpoint,
            config,
            dialer: Box::new(dialer),
            stream: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// True while a kept stream is held for the next request.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Drop the kept stream, if any.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("Closed connection to {}", self.endpoint);
        }
    }

    fn ensure_connected(&mut self) -> Result<()> {
        if self.stream.is_none() {
            debug!("Connecting to {}", self.endpoint);
            let stream = (self.dialer)()?;
            self.stream = Some(BufReader::new(stream));
        }
        Ok(())
    }

    fn take_stream(&mut self) -> Result<BufReader<S>> {
        self.ensure_connected()?;
        match self.stream.take() {
            Some(stream) => Ok(stream),
            None => Err(Error::transport("no connection")),
        }
    }
}

/// One request/response exchange on `stream`. Returns the response with its body
/// set when no sink was given, plus whether the stream may carry another request.
fn exchange<S: Read + Write>(
    stream: &mut BufReader<S>,
    request: &Request,
    sink: Option<&mut dyn ChunkSink>,
) -> Result<(Response, bool)> {
    let wire = serialize_request(request);
    trace!("Writing {} byte request", wire.len());
    stream.get_mut().write_all(&wire)?;
    stream.get_mut().flush()?;

    let mut response = loop {
        let head = read_head(stream)?;
        let response = parse_response_head(&head, request.registries())?;
        let code = response.status_code();
        if (100..200).contains(&code) && code != STATUS_SWITCHING_PROTOCOLS {
            trace!("Interim {} response, reading next head", code);
            continue;
        }
        break response;
    };

    let framing = body_framing(request.method(), &response)?;
    trace!("Body framing {:?}", framing);
    match sink {
        Some(sink) => read_body(stream, framing, sink)?,
        None => {
            let mut body = BytesMut::new();
            read_body(stream, framing, &mut body)?;
            response.set_body(body.freeze());
        }
    }

    // After 101 the stream speaks another protocol.
    let reusable = framing != BodyFraming::UntilClose
        && !response.closes_connection()
        && response.status_code() != STATUS_SWITCHING_PROTOCOLS;
    Ok((response, reusable))
}

impl<S: Read + Write> TransportAdapter for SocketAdapter<S> {
    fn send(&mut self, request: &mut Request, sink: Option<&mut dyn ChunkSink>) -> Result<Response> {
        decorate_request(request, &self.endpoint, &self.config)?;
        let persistent = self.config.connection == ConnectionMode::Persistent;
        if !persistent {
            request.set_header_field("Connection", "close")?;
        }
        debug!("{} {} to {}", request.method(), request.request_target(), self.endpoint);

        let mut stream = self.take_stream()?;
        let (response, reusable) = exchange(&mut stream, request, sink)?;
        debug!(
            "{} {} ({} body bytes)",
            response.status_code(),
            response.reason_phrase(),
            response.body_length()
        );
        if persistent && reusable {
            self.stream = Some(stream);
        } else {
            trace!("Dropping connection to {}", self.endpoint);
        }
        Ok(response)
    }
}
