//! Command-line interface for the hapwire HTTP accessory bridge.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hapwire_bridge::{build_accessories, Accessory, BridgeConfig, BuiltinCatalog, ReqwestTransport};
use hapwire_core::{BridgeEvent, EventBus};
use tracing::info;

/// hapwire - drive HTTP-backed accessories from declarative configuration.
#[derive(Parser, Debug)]
#[command(name = "hapwire")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Configuration file path.
    #[arg(short, long, global = true, default_value = "hapwire.json")]
    config: PathBuf,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bridge until interrupted.
    Run,
    /// Validate the configuration and list the assembled services.
    Check,
    /// Resolve accessory identify actions.
    Identify {
        /// Accessory name; all accessories when omitted.
        name: Option<String>,
    },
    /// Read one characteristic and print its value.
    Get {
        /// Service name.
        service: String,
        /// Characteristic name.
        characteristic: String,
    },
    /// Write one characteristic.
    Set {
        /// Service name.
        service: String,
        /// Characteristic name.
        characteristic: String,
        /// Value to write.
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let json_logging = std::env::var("HAPWIRE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    // Build the env filter for log level control
    let default_level = if args.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("hapwire={}", default_level)));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }

    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read {}", args.config.display()))?;
    let config = BridgeConfig::from_json(&text)?;

    let bus = EventBus::new();
    let transport = Arc::new(ReqwestTransport::new());
    let catalog = BuiltinCatalog::new();
    let accessories = build_accessories(&config, &catalog, transport, &bus);

    match args.command {
        Command::Run => run_bridge(&accessories, &bus).await,
        Command::Check => check(&config, &accessories),
        Command::Identify { name } => identify(&accessories, name.as_deref()).await,
        Command::Get {
            service,
            characteristic,
        } => get(&accessories, &service, &characteristic).await,
        Command::Set {
            service,
            characteristic,
            value,
        } => set(&accessories, &service, &characteristic, &value).await,
    }
}

/// Run all accessories until ctrl-c.
async fn run_bridge(accessories: &[Accessory], bus: &EventBus) -> Result<()> {
    for accessory in accessories {
        accessory.start().await;
    }

    // Mirror value-changed events into the log.
    let mut events = bus.subscribe();
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let BridgeEvent::CharacteristicChanged {
                accessory,
                service,
                characteristic,
                value,
                ..
            } = event
            {
                info!("{}/{}/{} = {}", accessory, service, characteristic, value);
            }
        }
    });

    info!("Bridge running with {} accessories, ctrl-c to stop", accessories.len());
    tokio::signal::ctrl_c().await?;

    for accessory in accessories {
        accessory.stop().await;
    }
    event_log.abort();
    Ok(())
}

/// Validate configuration and print the assembled layout.
fn check(config: &BridgeConfig, accessories: &[Accessory]) -> Result<()> {
    for (accessory, accessory_config) in accessories.iter().zip(&config.accessories) {
        println!("{}", accessory.name);
        if accessory.services.len() < accessory_config.services.len() {
            println!(
                "  ({} configured service(s) had an unknown type)",
                accessory_config.services.len() - accessory.services.len()
            );
        }
        for service in &accessory.services {
            println!("  {} [{}]", service.name, service.service_type);
            for binding in &service.characteristics {
                let mode = if binding.is_polling() { "polling" } else { "on-demand" };
                println!("    {} ({})", binding.name(), mode);
            }
        }
    }
    Ok(())
}

/// Resolve identify actions.
async fn identify(accessories: &[Accessory], name: Option<&str>) -> Result<()> {
    let mut found = false;
    for accessory in accessories {
        if name.is_some_and(|n| n != accessory.name) {
            continue;
        }
        found = true;
        match accessory.identify().await {
            Ok(result) => println!(
                "{}: {}",
                accessory.name,
                result.as_deref().unwrap_or("<no identify action>")
            ),
            Err(e) => println!("{}: identify failed: {}", accessory.name, e),
        }
    }
    if !found {
        bail!("No accessory named '{}'", name.unwrap_or_default());
    }
    Ok(())
}

fn find_binding<'a>(
    accessories: &'a [Accessory],
    service: &str,
    characteristic: &str,
) -> Result<&'a hapwire_bridge::CharacteristicBinding> {
    accessories
        .iter()
        .filter_map(|a| a.service(service))
        .find_map(|s| s.characteristic(characteristic))
        .with_context(|| format!("No characteristic {}/{}", service, characteristic))
}

/// One-shot read.
async fn get(accessories: &[Accessory], service: &str, characteristic: &str) -> Result<()> {
    let binding = find_binding(accessories, service, characteristic)?;
    // Polling-mode reads wait for a poll tick, and no poller is armed in
    // one-shot mode.
    if binding.is_polling() {
        bail!(
            "{}/{} is a polling characteristic; use `run` to observe it",
            service,
            characteristic
        );
    }
    match binding.read().await? {
        Some(value) => println!("{}", value),
        None => println!("<no get action>"),
    }
    Ok(())
}

/// One-shot write.
async fn set(
    accessories: &[Accessory],
    service: &str,
    characteristic: &str,
    value: &str,
) -> Result<()> {
    let binding = find_binding(accessories, service, characteristic)?;
    binding.write(value).await?;
    println!("ok");
    Ok(())
}
