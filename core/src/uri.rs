/*
 * uri.rs
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

//! Server endpoint URIs: `tcp://host:port` (cleartext), `ssl://` or `tls://` (TLS).
//! `http://` and `https://` are accepted as aliases. Userinfo (`user:pass@`) is
//! percent-decoded and used for Basic authentication.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{Error, Result};

/// Userinfo in authority: encode @ and other reserved so one @ separates userinfo from host.
const USERINFO: &AsciiSet = &CONTROLS
    .add(b'@')
    .add(b':')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'[')
    .add(b']');

/// CouchDB's listening ports.
const COUCHDB_PORT: u16 = 5984;
const COUCHDB_TLS_PORT: u16 = 6984;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Tcp,
    Tls,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
}

fn decode_userinfo(part: &str) -> Result<String> {
    percent_decode_str(part)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| Error::invalid_argument("userinfo is not valid UTF-8"))
}

impl Endpoint {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Parse `scheme://[user[:pass]@]host[:port][/]`. IPv6 hosts go in brackets.
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |why: &str| Error::invalid_argument(format!("endpoint {:?}: {}", uri, why));
        let (scheme, rest) = uri.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        let (scheme, default_port) = match scheme.to_ascii_lowercase().as_str() {
            "tcp" => (Scheme::Tcp, COUCHDB_PORT),
            "ssl" | "tls" => (Scheme::Tls, COUCHDB_TLS_PORT),
            "http" => (Scheme::Tcp, 80),
            "https" => (Scheme::Tls, 443),
            _ => return Err(invalid("unsupported scheme")),
        };
        let authority = rest.trim_end_matches('/');
        if authority.contains(['/', '?', '#']) {
            return Err(invalid("endpoint must not carry a path"));
        }

        let (credentials, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => {
                let (user, pass) = userinfo.split_once(':').unwrap_or((userinfo, ""));
                (Some((decode_userinfo(user)?, decode_userinfo(pass)?)), host_port)
            }
            None => (None, authority),
        };

        let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let (host, after) = bracketed.split_once(']').ok_or_else(|| invalid("unclosed ["))?;
            match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if after.is_empty() => (host, None),
                None => return Err(invalid("garbage after IPv6 host")),
            }
        } else {
            match host_port.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (host_port, None),
            }
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid("invalid port"))?,
            None => default_port,
        };

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            credentials,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_tls(&self) -> bool {
        self.scheme == Scheme::Tls
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    fn host_for_authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// `Host` header value: the port is omitted when it is the scheme default.
    pub fn host_header(&self) -> String {
        if (self.is_tls() && self.port == 443) || (!self.is_tls() && self.port == 80) {
            self.host_for_authority()
        } else {
            format!("{}:{}", self.host_for_authority(), self.port)
        }
    }

    /// `host:port` for connecting.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host_for_authority(), self.port)
    }

    /// Absolute `http(s)` URL for a request target (path + query string).
    pub fn url(&self, target: &str) -> String {
        let scheme = if self.is_tls() { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host_for_authority(), self.port, target)
    }
}

/// Displays as a URI with the password elided.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            Scheme::Tcp => "tcp",
            Scheme::Tls => "tls",
        };
        write!(f, "{}://", scheme)?;
        if let Some((user, _)) = &self.credentials {
            write!(f, "{}:***@", utf8_percent_encode(user, USERINFO))?;
        }
        write!(f, "{}:{}", self.host_for_authority(), self.port)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({})", self)
    }
}
