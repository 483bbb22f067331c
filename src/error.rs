// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `cozy_power` library.
//!
//! Configuration errors are the only ones that cross the public API as
//! `Err` values: they mean the link was set up wrong. Transport failures are
//! classified with [`ProtocolError`] inside the device link, logged, and then
//! collapsed to "no data" because an unreachable plug is an expected,
//! transient condition.

use std::io;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The device configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors raised while validating device configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The host (IP address or hostname) is empty.
    #[error("host must not be empty")]
    EmptyHost,

    /// The port is zero or not a number.
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// The address text could not be understood.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A duration setting that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Errors related to talking to a device over its TCP connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Opening the TCP connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] io::Error),

    /// Opening the TCP connection took longer than the connect timeout.
    #[error("connect timed out after {0} ms")]
    ConnectTimeout(u64),

    /// A reconnect was suppressed because the last attempt is too recent.
    #[error("reconnect suppressed during cooldown")]
    CooldownActive,

    /// There is no open connection to use.
    #[error("device is not connected")]
    NotConnected,

    /// Writing the request failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Reading the response failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// No complete response line arrived within the read timeout.
    #[error("read timed out after {0} ms")]
    ReadTimeout(u64),

    /// The device closed the stream before a parseable line arrived.
    #[error("stream closed before a response was received")]
    StreamClosed,

    /// The request could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Returns true if this error means the connection must be dropped.
    ///
    /// Connect-side errors leave no connection behind, so only failures on an
    /// established stream qualify.
    #[must_use]
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(
            self,
            Self::SendFailed(_) | Self::ReceiveFailed(_) | Self::ReadTimeout(_) | Self::StreamClosed
        )
    }
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to interpret a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Converts a duration to whole milliseconds for error reporting.
pub(crate) fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
