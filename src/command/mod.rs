// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CozyLife command definitions.
//!
//! Every request sent to a plug is a single JSON object:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `cmd` | Command kind tag ([`CommandKind`]) |
//! | `pv`  | Protocol version, always `0` |
//! | `sn`  | Serial number: wall-clock milliseconds as a string |
//! | `msg` | Command body |
//!
//! On the wire the object is followed by `"\r\n"`.
//!
//! # Examples
//!
//! ```
//! use cozy_power::command::{Command, CommandKind};
//!
//! let cmd = Command::query().with_serial("1700000000000");
//! assert_eq!(cmd.kind(), CommandKind::Query);
//! assert_eq!(
//!     cmd.to_frame().unwrap(),
//!     "{\"cmd\":2,\"pv\":0,\"sn\":\"1700000000000\",\"msg\":{\"attr\":[0]}}\r\n"
//! );
//! ```

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Line terminator appended to every request.
pub const REQUEST_TERMINATOR: &str = "\r\n";

/// Kind of request understood by the plug firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum CommandKind {
    /// Device information (`cmd` 0).
    Info,
    /// Attribute state query (`cmd` 2).
    Query,
    /// Attribute write (`cmd` 3).
    Set,
}

impl CommandKind {
    /// Returns the protocol tag for this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Query => 2,
            Self::Set => 3,
        }
    }
}

impl From<CommandKind> for u8 {
    fn from(kind: CommandKind) -> Self {
        kind.code()
    }
}

/// A request ready to be written to a plug.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    cmd: CommandKind,
    pv: u8,
    sn: String,
    msg: Value,
}

impl Command {
    /// Protocol version carried in every request.
    pub const PROTOCOL_VERSION: u8 = 0;

    fn new(kind: CommandKind, msg: Value) -> Self {
        Self {
            cmd: kind,
            pv: Self::PROTOCOL_VERSION,
            sn: serial_number(),
            msg,
        }
    }

    /// Creates a state query asking for all attributes (`attr: [0]`).
    #[must_use]
    pub fn query() -> Self {
        Self::new(CommandKind::Query, json!({ "attr": [0] }))
    }

    /// Creates a device information request.
    #[must_use]
    pub fn info() -> Self {
        Self::new(CommandKind::Info, json!({}))
    }

    /// Creates an attribute write.
    ///
    /// Attribute ids are sent both in the `attr` list and, stringified, as
    /// keys of the `data` object.
    ///
    /// ```
    /// use cozy_power::command::Command;
    /// use serde_json::json;
    ///
    /// let cmd = Command::set([(1, json!(255))]).with_serial("1");
    /// assert_eq!(
    ///     cmd.body(),
    ///     &json!({ "attr": [1], "data": { "1": 255 } })
    /// );
    /// ```
    #[must_use]
    pub fn set(attributes: impl IntoIterator<Item = (u16, Value)>) -> Self {
        let mut ids = Vec::new();
        let mut data = Map::new();
        for (id, value) in attributes {
            ids.push(id);
            data.insert(id.to_string(), value);
        }
        Self::new(CommandKind::Set, json!({ "attr": ids, "data": data }))
    }

    /// Replaces the serial number.
    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.sn = serial.into();
        self
    }

    /// Returns the command kind.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.cmd
    }

    /// Returns the serial number.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.sn
    }

    /// Returns the command body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.msg
    }

    /// Encodes the command as one request line, terminator included.
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be serialized.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        let mut frame = serde_json::to_string(self)?;
        frame.push_str(REQUEST_TERMINATOR);
        Ok(frame)
    }
}

/// Returns the current wall-clock time in milliseconds, as a string.
///
/// The firmware only uses it as an opaque correlation token.
#[must_use]
pub fn serial_number() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
