// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection lifecycle and request/response exchange for one plug.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout};

use crate::command::Command;
use crate::error::{ProtocolError, millis};
use crate::protocol::{Connector, Endpoint, TcpConnector, framing};
use crate::response::{Response, StateData};

/// Timeouts and reconnect throttling for a [`DeviceLink`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cozy_power::protocol::LinkConfig;
///
/// let config = LinkConfig::default().with_cooldown(Duration::from_secs(60));
/// assert_eq!(config.connect_timeout(), Duration::from_secs(3));
/// assert_eq!(config.cooldown(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    connect_timeout: Duration,
    read_timeout: Duration,
    cooldown: Duration,
}

impl LinkConfig {
    /// Default bound on opening a connection.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
    /// Default bound on waiting for a reply line.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);
    /// Default minimum time between connection attempts.
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the reconnect cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the reconnect cooldown.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            cooldown: Self::DEFAULT_COOLDOWN,
        }
    }
}

/// Observable connection state of a [`DeviceLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No open connection.
    Disconnected,
    /// A connection is open and assumed healthy.
    Connected,
}

/// Internal state machine; the stream lives only in `Connected`.
enum Connection<S> {
    Disconnected,
    Connected(S),
}

/// Persistent connection to one CozyLife plug.
///
/// The link connects lazily on the first request and keeps the connection
/// open across calls. Transport failures never escape: they close the
/// connection and the call returns `None`. After a connection attempt, no
/// new attempt is made until the cooldown has elapsed, so a plug that is
/// offline costs one connect per cooldown period rather than one per call.
///
/// Methods take `&mut self`: one exchange is in flight at a time.
///
/// # Examples
///
/// ```no_run
/// use cozy_power::protocol::{DeviceLink, Endpoint};
///
/// # async fn example() -> cozy_power::Result<()> {
/// let mut link = DeviceLink::new(Endpoint::with_default_port("192.168.1.60")?);
///
/// if let Some(data) = link.query_state().await {
///     println!("power: {:?}", data.power_watts());
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeviceLink<C: Connector = TcpConnector> {
    endpoint: Endpoint,
    config: LinkConfig,
    connector: C,
    connection: Connection<C::Stream>,
    last_attempt: Option<Instant>,
    in_flight: bool,
}

impl DeviceLink<TcpConnector> {
    /// Creates a TCP link with default timeouts.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_connector(endpoint, TcpConnector)
    }
}

impl<C: Connector> DeviceLink<C> {
    /// Creates a link that opens its streams through `connector`.
    #[must_use]
    pub fn with_connector(endpoint: Endpoint, connector: C) -> Self {
        Self {
            endpoint,
            config: LinkConfig::default(),
            connector,
            connection: Connection::Disconnected,
            last_attempt: None,
            in_flight: false,
        }
    }

    /// Replaces the timeouts and cooldown.
    #[must_use]
    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the timeouts and cooldown.
    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Returns the connection state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        match self.connection {
            Connection::Disconnected => LinkState::Disconnected,
            Connection::Connected(_) => LinkState::Connected,
        }
    }

    /// Returns true if a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Queries the plug's attributes.
    ///
    /// Returns `None` when the plug is unreachable, the reconnect cooldown is
    /// active, the exchange fails, or the reply has no usable `msg`. A reply
    /// without `msg.data` yields an empty mapping.
    pub async fn query_state(&mut self) -> Option<StateData> {
        self.request(&Command::query())
            .await
            .and_then(Response::into_data)
    }

    /// Sends `command` and returns the first parseable reply line.
    ///
    /// Failures are logged at debug level and collapse to `None`.
    pub async fn request(&mut self, command: &Command) -> Option<Response> {
        match self.try_request(command).await {
            Ok(response) => Some(response),
            Err(ProtocolError::CooldownActive) => None,
            Err(e) => {
                if e.is_fatal_to_connection() {
                    self.close();
                }
                tracing::debug!(
                    host = %self.endpoint.host(),
                    port = self.endpoint.port(),
                    error = %e,
                    "Failed to communicate with device"
                );
                None
            }
        }
    }

    /// Drops the connection, if any.
    ///
    /// Safe to call at any time; closing an absent connection does nothing.
    pub fn close(&mut self) {
        if let Connection::Connected(stream) =
            std::mem::replace(&mut self.connection, Connection::Disconnected)
        {
            drop(stream);
            tracing::trace!(host = %self.endpoint.host(), "Connection closed");
        }
        self.in_flight = false;
    }

    async fn try_request(&mut self, command: &Command) -> Result<Response, ProtocolError> {
        if self.in_flight {
            // The previous exchange was dropped mid-way; the stream may still
            // hold its reply.
            tracing::debug!(host = %self.endpoint.host(), "Dropping abandoned connection");
            self.close();
        }

        self.ensure_connected().await?;
        let frame = command.to_frame().map_err(ProtocolError::Encode)?;

        let Connection::Connected(stream) = &mut self.connection else {
            return Err(ProtocolError::NotConnected);
        };

        self.in_flight = true;
        let result = exchange(stream, &frame, self.config.read_timeout).await;
        self.in_flight = false;
        result
    }

    async fn ensure_connected(&mut self) -> Result<(), ProtocolError> {
        if matches!(self.connection, Connection::Connected(_)) {
            return Ok(());
        }

        let now = Instant::now();
        if let Some(last) = self.last_attempt
            && now.duration_since(last) < self.config.cooldown
        {
            return Err(ProtocolError::CooldownActive);
        }
        self.last_attempt = Some(now);

        let connect_timeout = self.config.connect_timeout;
        let stream = timeout(connect_timeout, self.connector.connect(&self.endpoint))
            .await
            .map_err(|_| ProtocolError::ConnectTimeout(millis(connect_timeout)))?
            .map_err(ProtocolError::ConnectionFailed)?;

        tracing::debug!(
            host = %self.endpoint.host(),
            port = self.endpoint.port(),
            "Connected to device"
        );
        self.connection = Connection::Connected(stream);
        Ok(())
    }
}

/// Writes one request line and waits for one reply line.
async fn exchange<S>(
    stream: &mut S,
    frame: &str,
    read_timeout: Duration,
) -> Result<Response, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(frame.as_bytes())
        .await
        .map_err(ProtocolError::SendFailed)?;
    stream.flush().await.map_err(ProtocolError::SendFailed)?;

    timeout(read_timeout, framing::read_frame(stream))
        .await
        .map_err(|_| ProtocolError::ReadTimeout(millis(read_timeout)))?
}

impl<C: Connector> std::fmt::Debug for DeviceLink<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .field("state", &self.state())
            .field("last_attempt", &self.last_attempt)
            .finish_non_exhaustive()
    }
}
