use std::io::{self, BufRead};

use anyhow::Result;
use log::{error, info, warn};

use ftms_rs::client::{ClientConfig, FtmsClient};
use ftms_rs::protocol::MachineProfile;
use ftms_rs::types::{MetricFrame, SessionEvent};

fn usage() -> ! {
    eprintln!("usage: ftms-monitor [bike|erg|hr]");
    std::process::exit(2);
}

fn format_metrics(m: &MetricFrame) -> String {
    let mut parts = Vec::new();
    if let Some(w) = m.power_watts {
        parts.push(format!("{w:4} W"));
    }
    if let Some(c) = m.cadence {
        parts.push(format!("{c:5.1} rpm"));
    }
    if let Some(d) = m.distance_m {
        parts.push(format!("{d:6} m"));
    }
    if let Some(e) = m.energy_kcal {
        parts.push(format!("{e:4} kcal"));
    }
    if let Some(t) = m.elapsed_secs {
        parts.push(format!("{:3}:{:02}", t / 60, t % 60));
    }
    if let Some(b) = m.heart_rate_bpm {
        parts.push(format!("{b:3} bpm"));
    }
    if parts.is_empty() {
        "(empty frame)".into()
    } else {
        parts.join("  ")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for verbose output, e.g.:
    //   RUST_LOG=ftms_rs=debug cargo run -- bike
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Profile selection ─────────────────────────────────────────────────────
    let profile = match std::env::args().nth(1).as_deref() {
        None | Some("bike") => MachineProfile::IndoorBike,
        Some("erg") | Some("row") => MachineProfile::RowingErg,
        Some("hr") => MachineProfile::HeartRateMonitor,
        Some(other) => {
            eprintln!("unknown profile: {other}");
            usage();
        }
    };

    let client = FtmsClient::new(ClientConfig::default());

    // ── Connect ───────────────────────────────────────────────────────────────
    // Known devices first — no scan needed when the machine is already
    // paired with this host. Fall back to a scan otherwise.
    info!("Connecting to {} …", profile.label());
    let (mut rx, handle) = match client.reconnect_known(profile).await {
        Ok(session) => session,
        Err(e) => {
            info!("no quick reconnect ({e}); scanning instead");
            client.connect_fresh(profile).await?
        }
    };
    info!("Connected to: {}", handle.device_name());
    info!("Type 'q' + Enter (or Ctrl-C) to quit.\n");

    let mut handle = Some(handle);

    // ── Stdin command loop ────────────────────────────────────────────────────
    // Lines are read on a dedicated OS thread (to avoid holding a non-Send
    // StdinLock across await points) and relayed over a channel.
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l.trim().to_owned()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    // ── Main event loop ───────────────────────────────────────────────────────
    loop {
        tokio::select! {
            line = line_rx.recv() => {
                if matches!(line.as_deref(), Some("q") | None) {
                    info!("Quit requested.");
                    if let Some(h) = handle.take() {
                        h.disconnect().await;
                    }
                    break;
                }
            }
            event = rx.recv() => match event {
                Some(SessionEvent::Connected(name)) => {
                    info!("session active on {name}");
                }
                Some(SessionEvent::Metrics(frame)) => {
                    println!("[{}] {}", profile.label(), format_metrics(&frame));
                }
                Some(SessionEvent::Reconnecting) => {
                    warn!("link lost — reconnecting …");
                }
                Some(SessionEvent::ConnectionLost) => {
                    error!("connection lost for good; start the monitor again to resume");
                    break;
                }
                None => break,
            }
        }
    }

    if let Some(h) = handle.take() {
        h.disconnect().await;
    }
    info!("Event loop finished – exiting.");
    Ok(())
}
