// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for talking to CozyLife plugs.
//!
//! - [`Endpoint`]: host and port of one plug
//! - [`DeviceLink`]: owns one connection and performs request/response
//!   exchanges with cooldown-throttled reconnection
//! - [`Connector`]: opens the underlying stream, [`TcpConnector`] in
//!   production
//! - [`framing`]: newline framing of the reply stream

mod endpoint;
pub mod framing;
mod link;
#[cfg(test)]
pub(crate) mod testing;

pub use endpoint::Endpoint;
pub use link::{DeviceLink, LinkConfig, LinkState};

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens streams to a plug.
///
/// The device link owns a connector and calls it whenever it needs a fresh
/// connection; the connect timeout is applied by the link.
pub trait Connector {
    /// Stream type produced by this connector.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Opens a new stream to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the socket error if the connection cannot be established.
    fn connect(
        &mut self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Connector that opens plain TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&mut self, endpoint: &Endpoint) -> io::Result<TcpStream> {
        TcpStream::connect((endpoint.host(), endpoint.port())).await
    }
}
