// SPDX-License-Identifier: MPL-2.0

//! Power polling example.
//!
//! Polls one CozyLife plug every ten seconds and prints each reading along
//! with the availability flag. Set `RUST_LOG=cozy_power=debug` to see
//! connection handling.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example poll_power -- <host> [port] [name]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example poll_power -- 192.168.1.60
//! RUST_LOG=cozy_power=debug cargo run --example poll_power -- 192.168.1.60 5555 Fridge
//! ```

use std::env;

use cozy_power::{DeviceConfig, PollConfig, Poller};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cozy_power=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <host> [port] [name]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --example poll_power -- 192.168.1.60");
        eprintln!("  cargo run --example poll_power -- 192.168.1.60 5555 Fridge");
        std::process::exit(1);
    }

    let mut config = DeviceConfig::new(&args[1]);
    if let Some(port) = args.get(2) {
        config = config.with_port(port.parse()?);
    }
    if let Some(name) = args.get(3) {
        config = config.with_name(name);
    }

    let poller = Poller::from_config(&config)?;
    let sensor = poller.sensor();

    println!("=== CozyLife Power Monitor ===");
    println!("Device: {}", sensor.name());
    println!("Unique ID: {}", sensor.unique_id());
    println!("Address: {}", config.endpoint()?);
    println!();
    println!("Press Ctrl+C to stop.");
    println!();

    let handle = poller.spawn(PollConfig::default())?;
    let mut states = handle.subscribe();

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                let time = chrono::Local::now().format("%H:%M:%S");
                match (state.available, state.power_watts) {
                    (true, Some(watts)) => println!("[{time}] {watts:.1} W"),
                    (true, None) => println!("[{time}] waiting for data ({} failed)", state.error_count),
                    (false, _) => println!("[{time}] unavailable ({} failed polls)", state.error_count),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("Stopping...");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}
