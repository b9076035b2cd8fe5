/*
 * config.rs
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

//! Transport settings: socket timeout, user agent, connection reuse.
//!
//! The socket timeout default comes from `COUCHWIRE_SOCKET_TIMEOUT` (seconds, fractions
//! allowed), read once per process. Adapters copy the config at construction.

use std::sync::OnceLock;
use std::time::Duration;

use log::warn;

/// Environment variable holding the default socket timeout in seconds.
pub const SOCKET_TIMEOUT_ENV: &str = "COUCHWIRE_SOCKET_TIMEOUT";

pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_USER_AGENT: &str = concat!("couchwire/", env!("CARGO_PKG_VERSION"));

static ENV_SOCKET_TIMEOUT: OnceLock<Duration> = OnceLock::new();

/// Whether the socket adapter keeps its stream across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// One stream opened at construction and reused (keep-alive).
    #[default]
    Persistent,
    /// A new stream per request, sent with `Connection: close`.
    Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Read/write timeout on the socket (libcurl: whole-transfer timeout).
    pub socket_timeout: Duration,
    pub user_agent: String,
    pub connection: ConnectionMode,
}

/// Parse a timeout in seconds. Returns None for missing, negative, zero or non-numeric input.
pub fn parse_timeout_secs(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if secs.is_finite() && secs > 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Socket timeout from the environment, falling back to 60 seconds.
pub fn default_socket_timeout() -> Duration {
    *ENV_SOCKET_TIMEOUT.get_or_init(|| match std::env::var(SOCKET_TIMEOUT_ENV) {
        Ok(value) => parse_timeout_secs(&value).unwrap_or_else(|| {
            warn!(
                "Ignoring {}={:?}: not a positive number of seconds",
                SOCKET_TIMEOUT_ENV, value
            );
            DEFAULT_SOCKET_TIMEOUT
        }),
        Err(_) => DEFAULT_SOCKET_TIMEOUT,
    })
}

impl TransportConfig {
    /// Defaults, with the socket timeout taken from the environment.
    pub fn from_env() -> Self {
        Self {
            socket_timeout: default_socket_timeout(),
            ..Self::default()
        }
    }

    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connection(mut self, mode: ConnectionMode) -> Self {
        self.connection = mode;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connection: ConnectionMode::Persistent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds() {
        assert_eq!(parse_timeout_secs("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout_secs(" 0.5 "), Some(Duration::from_millis(500)));
        assert_eq!(parse_timeout_secs("0"), None);
        assert_eq!(parse_timeout_secs("-1"), None);
        assert_eq!(parse_timeout_secs("soon"), None);
        assert_eq!(parse_timeout_secs("inf"), None);
    }

    #[test]
    fn builder_overrides() {
        let config = TransportConfig::default()
            .with_socket_timeout(Duration::from_secs(2))
            .with_user_agent("test/1")
            .with_connection(ConnectionMode::Ephemeral);
        assert_eq!(config.socket_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "test/1");
        assert_eq!(config.connection, ConnectionMode::Ephemeral);
    }

    #[test]
    fn default_user_agent_names_the_crate() {
        assert!(TransportConfig::default().user_agent.starts_with("couchwire/"));
    }
}
