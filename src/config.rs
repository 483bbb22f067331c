// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and polling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::{DeviceLink, Endpoint};

/// Configuration for one plug.
///
/// Deserializes from the config-entry shape used by home automation hubs:
/// `ip_address` is required, `port` and `name` are optional.
///
/// # Examples
///
/// ```
/// use cozy_power::DeviceConfig;
///
/// let config: DeviceConfig =
///     serde_json::from_str(r#"{"ip_address": "10.0.0.5", "name": "Desk"}"#).unwrap();
/// assert_eq!(config.port, 5555);
/// assert_eq!(config.display_name(), "Desk");
///
/// let config = DeviceConfig::new("10.0.0.6").with_port(6000);
/// assert_eq!(config.display_name(), "Cozy Power 10.0.0.6");
/// assert_eq!(config.endpoint().unwrap().to_string(), "10.0.0.6:6000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// IP address or hostname of the plug.
    #[serde(rename = "ip_address")]
    pub host: String,
    /// TCP port (default 5555).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional friendly name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_port() -> u16 {
    Endpoint::DEFAULT_PORT
}

impl DeviceConfig {
    /// Creates a configuration for the plug at `host` on the default port.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Endpoint::DEFAULT_PORT,
            name: None,
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets a friendly name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the friendly name, or `Cozy Power <host>` when none is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Cozy Power {}", self.host.trim()),
        }
    }

    /// Validates the address.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or malformed, or the port is zero.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::new(self.host.as_str(), self.port)
    }

    /// Creates a TCP device link for this plug.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid.
    pub fn link(&self) -> Result<DeviceLink, ConfigError> {
        Ok(DeviceLink::new(self.endpoint()?))
    }
}

/// Schedule for periodic polling.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cozy_power::PollConfig;
///
/// let config = PollConfig::default();
/// assert_eq!(config.interval(), Duration::from_secs(10));
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    timeout: Duration,
}

impl PollConfig {
    /// Default time between polls.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
    /// Default bound on a single poll.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Sets the time between polls.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the bound on a single poll.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the time between polls.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the bound on a single poll.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks that both durations are positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDuration`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll interval"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("poll timeout"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_entry() {
        let config: DeviceConfig = serde_json::from_str(r#"{"ip_address":"10.0.0.5"}"#).unwrap();
        assert_eq!(config, DeviceConfig::new("10.0.0.5"));
    }

    #[test]
    fn deserialize_full_entry() {
        let config: DeviceConfig =
            serde_json::from_str(r#"{"ip_address":"plug.local","port":6000,"name":"Heater"}"#)
                .unwrap();
        assert_eq!(config.host, "plug.local");
        assert_eq!(config.port, 6000);
        assert_eq!(config.name.as_deref(), Some("Heater"));
    }

    #[test]
    fn deserialize_requires_address() {
        assert!(serde_json::from_str::<DeviceConfig>(r#"{"name":"x"}"#).is_err());
    }

    #[test]
    fn serialize_omits_missing_name() {
        let json = serde_json::to_value(DeviceConfig::new("10.0.0.5")).unwrap();
        assert_eq!(json, serde_json::json!({"ip_address": "10.0.0.5", "port": 5555}));
    }

    #[test]
    fn display_name_falls_back_to_host() {
        assert_eq!(
            DeviceConfig::new("10.0.0.5").display_name(),
            "Cozy Power 10.0.0.5"
        );
        assert_eq!(
            DeviceConfig::new("10.0.0.5").with_name("  ").display_name(),
            "Cozy Power 10.0.0.5"
        );
        assert_eq!(
            DeviceConfig::new("10.0.0.5").with_name("Desk").display_name(),
            "Desk"
        );
    }

    #[test]
    fn invalid_address_fails_at_construction() {
        assert_eq!(
            DeviceConfig::new("").link().unwrap_err(),
            ConfigError::EmptyHost
        );
        assert!(matches!(
            DeviceConfig::new("10.0.0.5").with_port(0).endpoint(),
            Err(ConfigError::InvalidPort(_))
        ));
    }

    #[test]
    fn link_uses_configured_endpoint() {
        let link = DeviceConfig::new("10.0.0.5").with_port(6000).link().unwrap();
        assert_eq!(link.endpoint().to_string(), "10.0.0.5:6000");
        assert!(!link.is_connected());
    }

    #[test]
    fn poll_config_validation() {
        assert!(PollConfig::default().validate().is_ok());
        assert_eq!(
            PollConfig::default()
                .with_interval(Duration::ZERO)
                .validate(),
            Err(ConfigError::ZeroDuration("poll interval"))
        );
        assert_eq!(
            PollConfig::default().with_timeout(Duration::ZERO).validate(),
            Err(ConfigError::ZeroDuration("poll timeout"))
        );
    }
}
