//! Host-side demo and debug CLI for the wavelink hotspot manager.
//!
//! Drives [`HotspotManager`] against the simulated device backend, so the
//! join orchestration can be exercised off-device: seed the simulation with
//! `--network` / `--current`, then connect, disconnect, or dump status.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use wavelink_hotspot::{sim::SimBackend, HotspotManager, ManagerConfig};

#[derive(Parser)]
#[command(name = "wavelink", about = "Drive the hotspot join orchestrator against a simulated device")]
struct Cli {
    /// Emit the result envelope as JSON.
    #[arg(long)]
    json: bool,

    /// Known network, `SSID` or `SSID:PASSPHRASE`. Repeatable.
    #[arg(long = "network", value_name = "SSID[:PSK]")]
    networks: Vec<String>,

    /// SSID the simulated device starts out associated with.
    #[arg(long, value_name = "SSID")]
    current: Option<String>,

    /// Network the simulated device drifts back to after a removal.
    #[arg(long, value_name = "SSID")]
    rejoin: Option<String>,

    /// Readout polls before a simulated join lands.
    #[arg(long, default_value_t = 2)]
    join_latency: u32,

    /// Suppress operational-failure logging in the manager.
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the best-effort connectivity snapshot.
    Status,
    /// Join a network and confirm the association.
    Connect {
        ssid: String,
        #[arg(long)]
        passphrase: Option<String>,
        #[arg(long, default_value_t = 20_000)]
        timeout_ms: u64,
    },
    /// Undo the most recent join and confirm the device left.
    Disconnect {
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
    /// Full cycle: join, hold the association, then disconnect.
    Cycle {
        ssid: String,
        #[arg(long)]
        passphrase: Option<String>,
        #[arg(long, default_value_t = 20_000)]
        timeout_ms: u64,
        /// How long to stay on the network between join and disconnect.
        #[arg(long, default_value_t = 1_000)]
        hold_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = run(cli).await {
        emit_error(json, &err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = build_manager(&cli)?;

    let (message, data) = match cli.command {
        Command::Status => {
            let status = manager.status();
            (
                "connectivity status".to_string(),
                serde_json::to_value(status).context("serialize status")?,
            )
        }
        Command::Connect {
            ref ssid,
            ref passphrase,
            timeout_ms,
        } => {
            let joined = manager
                .connect(ssid, passphrase.as_deref(), Duration::from_millis(timeout_ms))
                .await;
            if !joined {
                bail!("failed to join '{}' within {}ms", ssid, timeout_ms);
            }
            (
                format!("joined '{}'", ssid),
                json!({ "ssid": ssid, "joined": true }),
            )
        }
        Command::Disconnect { timeout_ms } => {
            let left = manager.disconnect(Duration::from_millis(timeout_ms)).await;
            if !left {
                bail!("failed to leave the joined network within {}ms", timeout_ms);
            }
            ("disconnected".to_string(), json!({ "disconnected": true }))
        }
        Command::Cycle {
            ref ssid,
            ref passphrase,
            timeout_ms,
            hold_ms,
        } => {
            let budget = Duration::from_millis(timeout_ms);
            if !manager.connect(ssid, passphrase.as_deref(), budget).await {
                bail!("failed to join '{}' within {}ms", ssid, timeout_ms);
            }
            tracing::info!("holding '{}' for {}ms", ssid, hold_ms);
            tokio::time::sleep(Duration::from_millis(hold_ms)).await;
            if !manager.disconnect(budget).await {
                bail!("joined '{}' but failed to leave it again", ssid);
            }
            (
                format!("cycled through '{}'", ssid),
                json!({ "ssid": ssid, "joined": true, "disconnected": true }),
            )
        }
    };

    emit_success(cli.json, message, data)
}

fn build_manager(cli: &Cli) -> Result<HotspotManager<SimBackend>> {
    let mut sim = SimBackend::new().with_join_latency(cli.join_latency);

    for entry in &cli.networks {
        let (ssid, passphrase) = match entry.split_once(':') {
            Some((ssid, psk)) => (ssid, Some(psk)),
            None => (entry.as_str(), None),
        };
        if ssid.is_empty() {
            bail!("--network needs a non-empty SSID: '{}'", entry);
        }
        sim = sim.with_network(ssid, passphrase);
    }
    if let Some(current) = &cli.current {
        sim = sim.with_current(current);
    }
    if let Some(rejoin) = &cli.rejoin {
        sim = sim.with_rejoin(rejoin);
    }

    let config = ManagerConfig {
        diagnostics: !cli.quiet,
        ..ManagerConfig::default()
    };
    Ok(HotspotManager::with_config(sim, config))
}

fn emit_success(json: bool, message: String, data: Value) -> Result<()> {
    let payload = json!({
        "status": "ok",
        "message": message,
        "data": data,
    });

    if json {
        println!("{}", payload);
    } else {
        println!("{}", payload["message"].as_str().unwrap_or_default());
        if !payload["data"].is_null() {
            let pretty = serde_json::to_string_pretty(&payload["data"])?;
            println!("{pretty}");
        }
    }
    Ok(())
}

fn emit_error(json: bool, err: &anyhow::Error) {
    let details: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();

    if json {
        let payload = json!({
            "status": "error",
            "message": err.to_string(),
            "details": details,
            "data": Value::Null,
        });
        println!("{}", payload);
    } else {
        eprintln!("Error: {}", err);
        for detail in details.iter().skip(1) {
            eprintln!("  -> {}", detail);
        }
    }
}
