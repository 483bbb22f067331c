// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory plug doubles shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;

use crate::protocol::{Connector, Endpoint};

/// What the next connection attempt does.
pub(crate) enum Outcome {
    Refuse,
    Hang,
    Accept(DuplexStream),
}

/// Connector that counts attempts and follows a script.
///
/// Attempts past the end of the script are refused.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    attempts: Arc<AtomicUsize>,
    plan: Arc<Mutex<VecDeque<Outcome>>>,
}

impl FakeConnector {
    pub(crate) fn new(plan: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            attempts: Arc::default(),
            plan: Arc::new(Mutex::new(plan.into_iter().collect())),
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    type Stream = DuplexStream;

    async fn connect(&mut self, _endpoint: &Endpoint) -> io::Result<DuplexStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.plan.lock().pop_front();
        match next {
            Some(Outcome::Accept(stream)) => Ok(stream),
            Some(Outcome::Hang) => std::future::pending().await,
            Some(Outcome::Refuse) | None => Err(io::ErrorKind::ConnectionRefused.into()),
        }
    }
}

/// Plays a plug: for each request line, writes the scripted chunks.
///
/// Requests are forwarded on the returned channel. Once the script runs out
/// the connection stays open without answering. Must be called inside a
/// tokio runtime.
pub(crate) fn fake_plug(
    script: Vec<Vec<&'static str>>,
) -> (DuplexStream, mpsc::UnboundedReceiver<String>) {
    let (client, server) = tokio::io::duplex(4096);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (read_half, mut write_half) = tokio::io::split(server);
        let mut reader = BufReader::new(read_half);
        for chunks in script {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let _ = tx.send(line);
            for chunk in chunks {
                if write_half.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
                let _ = write_half.flush().await;
                tokio::task::yield_now().await;
            }
        }
        let mut line = String::new();
        while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
            let _ = tx.send(std::mem::take(&mut line));
        }
    });

    (client, rx)
}
