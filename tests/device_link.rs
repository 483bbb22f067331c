// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the device link against a local TCP plug.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cozy_power::{DeviceConfig, DeviceLink, Endpoint, LinkConfig, Poller};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const POWER_REPLY: &str = "{\"cmd\":2,\"msg\":{\"attr\":[1,28],\"data\":{\"1\":true,\"28\":33.3}}}\n";

/// A plug listening on 127.0.0.1.
struct MockPlug {
    port: u16,
    accepts: Arc<AtomicUsize>,
    requests: mpsc::UnboundedReceiver<String>,
}

impl MockPlug {
    /// Starts a plug; `reply` picks the answer for the n-th accepted
    /// connection, `None` keeping that connection silent.
    async fn start(reply: fn(usize) -> Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepts = Arc::new(AtomicUsize::new(0));
        let (tx, requests) = mpsc::unbounded_channel();

        let counter = Arc::clone(&accepts);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let (read_half, mut write_half) = socket.into_split();
                    let mut lines = BufReader::new(read_half).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let _ = tx.send(line);
                        if let Some(answer) = reply(index)
                            && write_half.write_all(answer.as_bytes()).await.is_err()
                        {
                            return;
                        }
                    }
                });
            }
        });

        Self {
            port,
            accepts,
            requests,
        }
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port).unwrap()
    }

    fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }
}

fn short_timeouts() -> LinkConfig {
    LinkConfig::default()
        .with_connect_timeout(Duration::from_millis(500))
        .with_read_timeout(Duration::from_millis(200))
}

// ============================================================================
// DeviceLink
// ============================================================================

mod device_link {
    use super::*;

    #[tokio::test]
    async fn query_state_round_trip() {
        let mut plug = MockPlug::start(|_| Some(POWER_REPLY)).await;
        let mut link = DeviceLink::new(plug.endpoint()).with_config(short_timeouts());

        let data = link.query_state().await.unwrap();
        assert_eq!(data.power_watts().unwrap(), 33.3);
        assert!(link.is_connected());

        let request: Value = serde_json::from_str(&plug.requests.recv().await.unwrap()).unwrap();
        assert_eq!(request["cmd"], json!(2));
        assert_eq!(request["pv"], json!(0));
        assert_eq!(request["msg"], json!({"attr": [0]}));
    }

    #[tokio::test]
    async fn leading_garbage_is_skipped() {
        let plug =
            MockPlug::start(|_| Some("not json\n{\"msg\":{\"data\":{\"28\":4}}}\n")).await;
        let mut link = DeviceLink::new(plug.endpoint()).with_config(short_timeouts());

        let data = link.query_state().await.unwrap();
        assert_eq!(data.get("28"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn connection_is_reused_between_queries() {
        let plug = MockPlug::start(|_| Some(POWER_REPLY)).await;
        let mut link = DeviceLink::new(plug.endpoint()).with_config(short_timeouts());

        for _ in 0..3 {
            assert!(link.query_state().await.is_some());
        }
        assert_eq!(plug.accepts(), 1);
    }

    #[tokio::test]
    async fn silent_plug_times_out_and_reconnects() {
        let plug = MockPlug::start(|index| (index > 0).then_some(POWER_REPLY)).await;
        let mut link = DeviceLink::new(plug.endpoint())
            .with_config(short_timeouts().with_cooldown(Duration::ZERO));

        assert!(link.query_state().await.is_none());
        assert!(!link.is_connected());

        let data = link.query_state().await.unwrap();
        assert_eq!(data.power_watts().unwrap(), 33.3);
        assert_eq!(plug.accepts(), 2);
    }

    #[tokio::test]
    async fn refused_connection_yields_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut link = DeviceLink::new(Endpoint::new("127.0.0.1", port).unwrap())
            .with_config(short_timeouts());

        assert!(link.query_state().await.is_none());
        assert!(!link.is_connected());
        // Still within the cooldown: no second attempt, still no panic.
        assert!(link.query_state().await.is_none());
    }
}

// ============================================================================
// Poller
// ============================================================================

mod poller {
    use super::*;

    #[tokio::test]
    async fn refresh_reads_power_from_plug() {
        let plug = MockPlug::start(|_| Some(POWER_REPLY)).await;
        let config = DeviceConfig::new("127.0.0.1")
            .with_port(plug.port)
            .with_name("Bench plug");

        let mut poller = Poller::from_config(&config).unwrap();
        let state = poller.refresh().await;

        assert_eq!(state.power_watts, Some(33.3));
        assert!(state.available);
        assert_eq!(poller.sensor().name(), "Bench plug");
    }
}
