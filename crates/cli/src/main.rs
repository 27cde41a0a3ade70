//! Bridge host - runs the command bridge over stdin/stdout.
//!
//! Inbound envelopes are read one JSON object per line from stdin; outbound
//! envelopes are written the same way to stdout. Logs go to stderr and
//! ~/.bridge/logs.

mod config;
mod fonts;
mod logger;
mod render;
mod transport;

use anyhow::{Context, Result};
use bridge::{Bridge, Command, CommandTag, ConnectionStatus, Host, InboundMessage};
use clap::{Parser, Subcommand};
use config::{CliConfig, LOG_ENV};
use fonts::FontRegistry;
use logger::BridgeLogger;
use render::SnapshotRenderer;
use scene_graph::SceneGraph;
use serde_json::Value;
use smol::io::{AsyncBufReadExt, BufReader};
use smol::stream::StreamExt;
use smol::Unblock;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use strum::IntoEnumIterator;
use transport::StdoutTransport;

/// Bridge - execute design-document commands from a remote client
#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "Command bridge between a remote client and a design document")]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). Overrides BRIDGE_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve envelopes from stdin until it closes
    Serve,

    /// Execute a single command against an empty document
    Exec {
        /// JSON command, e.g. {"command": "create_rectangle", "params": {"x": 10, "y": 10}}
        json: String,
    },

    /// Print the plugin info envelope
    Info,

    /// List the supported command names
    Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let env_level = std::env::var(LOG_ENV).ok();
    let level = config.log_level(cli.log_level.as_deref(), env_level.as_deref())?;
    if let Err(err) = BridgeLogger::init(level) {
        eprintln!("File logging disabled: {err:#}");
    }

    match cli.command {
        Commands::Serve => serve(&config),
        Commands::Exec { json } => exec(&config, &json),
        Commands::Info => info(&config),
        Commands::Commands => list_commands(),
    }
}

fn build_bridge(config: &CliConfig, transport: StdoutTransport) -> Bridge {
    let mut graph = SceneGraph::new(config.name.clone().unwrap_or_default());
    if let Some(key) = &config.file_key {
        graph.set_file_key(key.clone());
    }

    let host = Host {
        transport: Rc::new(transport),
        fonts: Rc::new(FontRegistry::new(config.fonts.iter().cloned())),
        renderer: Rc::new(SnapshotRenderer),
    };
    Bridge::new(Rc::new(RefCell::new(graph)), host, config.bridge.clone())
}

/// Reads envelopes from stdin, one per line, while running command tasks
/// alongside.
fn serve(config: &CliConfig) -> Result<()> {
    let bridge = build_bridge(config, StdoutTransport::default());
    bridge.start();
    log::info!("Serving envelopes from stdin");

    smol::block_on(bridge.run(async {
        let mut lines = BufReader::new(Unblock::new(std::io::stdin())).lines();
        while let Some(line) = lines.next().await {
            let line = line.context("Failed to read from stdin")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Err(err) = bridge.handle_json(line) {
                log::warn!("Ignoring malformed envelope: {err}");
            }
        }
        anyhow::Ok(())
    }))?;

    // Let in-flight commands answer before exiting
    bridge.run_until_stalled();
    if bridge.pending_count() > 0 {
        log::warn!(
            "Exiting with {} command(s) still pending",
            bridge.pending_count()
        );
    }
    log::info!("stdin closed, shutting down");
    Ok(())
}

/// Executes one command on a connected bridge and prints every envelope it
/// produces.
fn exec(config: &CliConfig, json: &str) -> Result<()> {
    let mut request: Value = serde_json::from_str(json).context("Failed to parse command JSON")?;
    if let Some(fields) = request.as_object_mut() {
        fields
            .entry("id")
            .or_insert_with(|| Value::String("cli-1".to_string()));
    }
    let command: Command =
        serde_json::from_value(request).context("Command must have a \"command\" field")?;

    let bridge = build_bridge(config, StdoutTransport::pretty());
    bridge.handle_message(InboundMessage::ConnectionStatus {
        status: ConnectionStatus::Connected,
        message: "cli".to_string(),
    });
    bridge.dispatch(command);
    bridge.run_until_stalled();
    Ok(())
}

fn info(config: &CliConfig) -> Result<()> {
    build_bridge(config, StdoutTransport::pretty()).send_plugin_info();
    Ok(())
}

fn list_commands() -> Result<()> {
    for tag in CommandTag::iter() {
        println!("{tag}");
    }
    Ok(())
}
