// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic polling of one plug.
//!
//! A [`Poller`] owns a [`DeviceLink`] and a [`PowerSensor`]. Each refresh
//! runs one state query under an outer timeout and feeds the result to the
//! sensor. Once spawned, the poller runs in its own task and publishes a
//! [`SensorState`] snapshot after every refresh.
//!
//! # Examples
//!
//! ```no_run
//! use cozy_power::{DeviceConfig, PollConfig, Poller};
//!
//! #[tokio::main]
//! async fn main() -> cozy_power::Result<()> {
//!     let config = DeviceConfig::new("192.168.1.60").with_name("Desk lamp");
//!     let handle = Poller::from_config(&config)?.spawn(PollConfig::default())?;
//!
//!     let mut states = handle.subscribe();
//!     while states.changed().await.is_ok() {
//!         let state = *states.borrow();
//!         println!("{:?} W (available: {})", state.power_watts, state.available);
//!     }
//!     Ok(())
//! }
//! ```

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};

use crate::config::{DeviceConfig, PollConfig};
use crate::error::ConfigError;
use crate::protocol::{Connector, DeviceLink, TcpConnector};
use crate::sensor::{PowerSensor, SensorState};

/// Drives a device link and keeps a power sensor up to date.
#[derive(Debug)]
pub struct Poller<C: Connector = TcpConnector> {
    link: DeviceLink<C>,
    sensor: PowerSensor,
    timeout: std::time::Duration,
}

impl Poller<TcpConnector> {
    /// Creates a poller for the configured plug.
    ///
    /// # Errors
    ///
    /// Returns error if the configured address is invalid.
    pub fn from_config(config: &DeviceConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.link()?, PowerSensor::new(config)))
    }
}

impl<C: Connector> Poller<C> {
    /// Creates a poller from its parts.
    #[must_use]
    pub fn new(link: DeviceLink<C>, sensor: PowerSensor) -> Self {
        Self {
            link,
            sensor,
            timeout: PollConfig::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the outer timeout used by [`refresh`](Self::refresh).
    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the device link.
    #[must_use]
    pub fn link(&self) -> &DeviceLink<C> {
        &self.link
    }

    /// Returns the sensor.
    #[must_use]
    pub fn sensor(&self) -> &PowerSensor {
        &self.sensor
    }

    /// Runs one poll and returns the resulting snapshot.
    ///
    /// If the query outlives the outer timeout it is abandoned, the link is
    /// closed so the next poll starts from a clean connection, and the poll
    /// counts as a failure.
    pub async fn refresh(&mut self) -> SensorState {
        match timeout(self.timeout, self.link.query_state()).await {
            Ok(data) => {
                self.sensor.update(data.as_ref());
            }
            Err(_) => {
                tracing::warn!(
                    sensor = %self.sensor.name(),
                    host = %self.link.endpoint().host(),
                    "Timeout while updating power sensor"
                );
                self.link.close();
                self.sensor.record_failure("Timeout while polling device");
            }
        }
        self.sensor.state()
    }
}

impl<C> Poller<C>
where
    C: Connector + Send + 'static,
{
    /// Starts polling in a background task.
    ///
    /// The first refresh runs immediately, then one every
    /// `config.interval()`. A poll that overruns the interval delays the
    /// next one instead of causing a burst. `config.timeout()` replaces the
    /// outer timeout.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if either duration in `config` is zero.
    pub fn spawn(mut self, config: PollConfig) -> Result<PollerHandle, ConfigError> {
        config.validate()?;
        self.timeout = config.timeout();

        let (state_tx, state_rx) = watch::channel(self.sensor.state());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let state = self.refresh().await;
                state_tx.send_replace(state);
            }
        });

        Ok(PollerHandle { state_rx, task })
    }
}

/// Handle to a running poller.
///
/// Dropping the handle stops the poller.
#[derive(Debug)]
pub struct PollerHandle {
    state_rx: watch::Receiver<SensorState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Returns a receiver notified after every refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SensorState> {
        self.state_rx.clone()
    }

    /// Returns the latest snapshot.
    #[must_use]
    pub fn state(&self) -> SensorState {
        *self.state_rx.borrow()
    }

    /// Returns true if the polling task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops polling and waits for the task to wind down.
    ///
    /// The device link is dropped with the task, closing its connection.
    pub async fn stop(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
