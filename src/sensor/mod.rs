// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power sensor built on top of state queries.
//!
//! The sensor interprets the attribute mapping returned by
//! [`DeviceLink::query_state`](crate::protocol::DeviceLink::query_state):
//! a readable power attribute is a success, anything else is one failure
//! unit. Consecutive failures are counted by [`Availability`].

mod availability;

pub use availability::Availability;

use serde::Serialize;

use crate::config::DeviceConfig;
use crate::response::StateData;

/// Integration domain, used in unique ids and device identifiers.
pub const DOMAIN: &str = "cozy_power";

/// Unit of the reported value.
pub const UNIT_OF_MEASUREMENT: &str = "W";

/// Device class of the reported value.
pub const DEVICE_CLASS: &str = "power";

/// State class of the reported value.
pub const STATE_CLASS: &str = "measurement";

/// Static description of the physical device behind a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, host)` identifier pair.
    pub identifiers: (String, String),
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model.
    pub model: String,
    /// Software version.
    pub sw_version: String,
}

/// Snapshot of a sensor, as published to watchers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorState {
    /// Last power reading in Watts, kept across failed polls.
    pub power_watts: Option<f64>,
    /// Whether the device is considered reachable.
    pub available: bool,
    /// Consecutive failed polls.
    pub error_count: u32,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            power_watts: None,
            available: true,
            error_count: 0,
        }
    }
}

/// Instantaneous power sensor for one plug.
///
/// # Examples
///
/// ```
/// use cozy_power::DeviceConfig;
/// use cozy_power::response::StateData;
/// use cozy_power::sensor::PowerSensor;
///
/// let mut sensor = PowerSensor::new(&DeviceConfig::new("10.0.0.5"));
/// assert_eq!(sensor.unique_id(), "cozy_power_10.0.0.5");
///
/// let data: StateData = serde_json::from_str(r#"{"28": 12.5}"#).unwrap();
/// assert!(sensor.update(Some(&data)));
/// assert_eq!(sensor.native_value(), Some(12.5));
///
/// sensor.update(None);
/// assert!(sensor.is_available());
/// assert_eq!(sensor.state().error_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct PowerSensor {
    name: String,
    unique_id: String,
    device_info: DeviceInfo,
    native_value: Option<f64>,
    availability: Availability,
}

impl PowerSensor {
    /// Creates a sensor for the configured plug.
    #[must_use]
    pub fn new(config: &DeviceConfig) -> Self {
        let host = config.host.trim().to_string();
        let name = config.display_name();
        Self {
            unique_id: format!("{DOMAIN}_{host}"),
            device_info: DeviceInfo {
                identifiers: (DOMAIN.to_string(), host),
                name: name.clone(),
                manufacturer: "CozyLife".to_string(),
                model: "Smart Plug".to_string(),
                sw_version: "1.0".to_string(),
            },
            name,
            native_value: None,
            availability: Availability::new(),
        }
    }

    /// Replaces the failure tracker, e.g. to change the threshold.
    #[must_use]
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique id (`cozy_power_<host>`).
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the device description.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Returns the last power reading in Watts.
    #[must_use]
    pub fn native_value(&self) -> Option<f64> {
        self.native_value
    }

    /// Returns whether the device is considered reachable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.availability.is_available()
    }

    /// Returns a snapshot of the sensor.
    #[must_use]
    pub fn state(&self) -> SensorState {
        SensorState {
            power_watts: self.native_value,
            available: self.availability.is_available(),
            error_count: self.availability.error_count(),
        }
    }

    /// Applies the result of one state query.
    ///
    /// Returns true if a power reading was stored.
    pub fn update(&mut self, data: Option<&StateData>) -> bool {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            self.record_failure("No power data received");
            return false;
        };

        match data.power_watts() {
            Ok(watts) => {
                self.native_value = Some(watts);
                self.availability.record_success();
                tracing::trace!(sensor = %self.name, watts, "Power reading updated");
                true
            }
            Err(crate::error::ParseError::MissingField(_)) => {
                self.record_failure("No power data received");
                false
            }
            Err(e) => {
                self.record_failure(&format!("Failed to update sensor: {e}"));
                false
            }
        }
    }

    /// Counts one failed poll with the given reason.
    pub fn record_failure(&mut self, reason: &str) {
        let max = self.availability.max_errors();
        if self.availability.record_failure() {
            tracing::error!(sensor = %self.name, "{reason}. Marking device unavailable.");
        } else {
            tracing::warn!(
                sensor = %self.name,
                "{reason}. Retry count: {}/{max}",
                self.availability.error_count()
            );
        }
    }
}
