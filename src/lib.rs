// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `cozy_power` - A Rust library to read CozyLife smart plugs.
//!
//! CozyLife plugs speak a small line-oriented JSON protocol over TCP
//! (port 5555). This library keeps one persistent connection per plug,
//! reconnects under a cooldown when the plug goes away, and turns state
//! replies into power readings with a threshold-based availability flag.
//!
//! # Layers
//!
//! - [`protocol::DeviceLink`]: connection lifecycle and `query_state`
//! - [`sensor::PowerSensor`]: power reading and availability
//! - [`Poller`]: periodic refresh with an outer timeout
//!
//! # Quick Start
//!
//! ## One-off query
//!
//! ```no_run
//! use cozy_power::DeviceConfig;
//!
//! #[tokio::main]
//! async fn main() -> cozy_power::Result<()> {
//!     let mut link = DeviceConfig::new("192.168.1.60").link()?;
//!
//!     // `None` means the plug is unreachable or did not answer in time.
//!     if let Some(data) = link.query_state().await {
//!         println!("power: {} W", data.power_watts()?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Continuous polling
//!
//! ```no_run
//! use cozy_power::{DeviceConfig, PollConfig, Poller};
//!
//! #[tokio::main]
//! async fn main() -> cozy_power::Result<()> {
//!     let config = DeviceConfig::new("192.168.1.60").with_name("Fridge");
//!     let handle = Poller::from_config(&config)?.spawn(PollConfig::default())?;
//!
//!     let mut states = handle.subscribe();
//!     while states.changed().await.is_ok() {
//!         println!("{:?}", *states.borrow());
//!     }
//!     Ok(())
//! }
//! ```

pub mod command;
mod config;
pub mod error;
mod poller;
pub mod protocol;
pub mod response;
pub mod sensor;

pub use command::{Command, CommandKind};
pub use config::{DeviceConfig, PollConfig};
pub use error::{ConfigError, Error, ParseError, ProtocolError, Result};
pub use poller::{Poller, PollerHandle};
pub use protocol::{Connector, DeviceLink, Endpoint, LinkConfig, LinkState, TcpConnector};
pub use response::{Response, StateData};
pub use sensor::{Availability, PowerSensor, SensorState};
