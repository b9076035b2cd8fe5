/*
 * client.rs
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

//! Opening the stream for an endpoint: TCP, then TLS for `ssl://` / `tls://`.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use log::debug;

use crate::config::TransportConfig;
use crate::error::Result;
use crate::net::{connect_tcp, wrap_tls, TlsStream};
use crate::uri::Endpoint;

/// Unified stream: plain TCP or TLS.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TlsStream>),
}

impl Read for HttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            HttpStream::Plain(s) => s.read(buf),
            HttpStream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for HttpStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            HttpStream::Plain(s) => s.write(buf),
            HttpStream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            HttpStream::Plain(s) => s.flush(),
            HttpStream::Tls(s) => s.flush(),
        }
    }
}

impl Drop for HttpStream {
    fn drop(&mut self) {
        if let HttpStream::Tls(s) = self {
            let stream = &mut **s;
            stream.conn.send_close_notify();
            // Flush the alert only; never block reading on drop.
            while stream.conn.wants_write() {
                match stream.conn.write_tls(&mut stream.sock) {
                    Ok(n) if n > 0 => {}
                    _ => break,
                }
            }
        }
    }
}

/// Connect to the endpoint with the configured timeout, wrapping in TLS when the
/// scheme asks for it.
pub fn dial(endpoint: &Endpoint, config: &TransportConfig) -> Result<HttpStream> {
    let tcp = connect_tcp(&endpoint.socket_addr(), config.socket_timeout)?;
    if endpoint.is_tls() {
        debug!("Starting TLS with {}", endpoint.host());
        let tls = wrap_tls(tcp, endpoint.host())?;
        Ok(HttpStream::Tls(Box::new(tls)))
    } else {
        Ok(HttpStream::Plain(tcp))
    }
}
