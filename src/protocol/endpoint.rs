// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device endpoint (host and port).

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Address of one plug.
///
/// # Examples
///
/// ```
/// use cozy_power::protocol::Endpoint;
///
/// let endpoint: Endpoint = "10.0.0.5".parse().unwrap();
/// assert_eq!(endpoint.port(), 5555);
///
/// let endpoint: Endpoint = "10.0.0.5:6000".parse().unwrap();
/// assert_eq!(endpoint.to_string(), "10.0.0.5:6000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Port the CozyLife firmware listens on.
    pub const DEFAULT_PORT: u16 = 5555;

    /// Creates an endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or contains whitespace, or if the
    /// port is zero.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        let host = host.into();
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if host.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidAddress(host.to_string()));
        }
        if port == 0 {
            return Err(ConfigError::InvalidPort(port.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Creates an endpoint on [`DEFAULT_PORT`](Self::DEFAULT_PORT).
    ///
    /// # Errors
    ///
    /// Returns error if the host is invalid.
    pub fn with_default_port(host: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(host, Self::DEFAULT_PORT)
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    /// Accepts `host`, `host:port`, a bare IPv6 literal, or `[v6]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| ConfigError::InvalidAddress(s.to_string()))?;
            return match tail {
                "" => Self::with_default_port(host),
                _ => {
                    let port = tail
                        .strip_prefix(':')
                        .ok_or_else(|| ConfigError::InvalidAddress(s.to_string()))?;
                    Self::new(host, parse_port(port)?)
                }
            };
        }

        match s.matches(':').count() {
            0 => Self::with_default_port(s),
            1 => {
                let (host, port) = s.split_once(':').unwrap_or((s, ""));
                Self::new(host, parse_port(port)?)
            }
            _ => Self::with_default_port(s),
        }
    }
}

fn parse_port(text: &str) -> Result<u16, ConfigError> {
    text.parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::InvalidPort(text.to_string()))
}
