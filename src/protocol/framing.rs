// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Newline framing of the reply stream.
//!
//! Replies are JSON documents terminated by `\n`. Plugs occasionally emit
//! stray or truncated lines, so a line that does not parse is dropped and
//! reading continues. Only the first parseable line is returned; whatever
//! was read past it is discarded with the buffer.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ProtocolError;
use crate::response::Response;

/// Size of a single socket read.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Reads from `reader` until one line parses as JSON.
///
/// The caller bounds the wait with a timeout; this function only returns on
/// success, on an I/O error, or at end of stream.
///
/// # Errors
///
/// Returns [`ProtocolError::ReceiveFailed`] on a read error and
/// [`ProtocolError::StreamClosed`] if the stream ends first.
pub async fn read_frame<R>(reader: &mut R) -> Result<Response, ProtocolError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(ProtocolError::ReceiveFailed)?;
        if read == 0 {
            return Err(ProtocolError::StreamClosed);
        }
        pending.extend_from_slice(&chunk[..read]);

        while let Some(newline) = pending.iter().position(|&b| b == b'\n') {
            if let Some(response) = parse_line(&pending[..newline]) {
                return Ok(response);
            }
            pending.drain(..=newline);
        }
    }
}

fn parse_line(line: &[u8]) -> Option<Response> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            tracing::trace!(error = %e, "Discarding non UTF-8 line");
            return None;
        }
    };

    match Response::parse(text) {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::trace!(line = %text, error = %e, "Discarding malformed line");
            None
        }
    }
}
