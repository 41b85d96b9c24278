//! Console Bot Demo
//!
//! Feeds lines from standard input to the Herald dispatcher as chat messages
//! and prints replies to standard output. Commands live as TOML manifests in
//! `commands/`; their handlers are registered below.
//!
//! # Usage
//!
//! ```bash
//! cd demos/console_bot
//! cargo run -- --user owner
//! > mai ping
//! > !echo hello there
//! > !reload ping
//! ```

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use herald::core::{CommandService, TransportResult};
use herald::framework::CommandTexts;
use herald::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Herald console bot", long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = "herald.toml")]
    config: String,

    /// User id the typed messages are sent as.
    #[arg(short, long, default_value = "guest")]
    user: String,

    /// Pretend the messages are posted in this guild.
    #[arg(short, long)]
    guild: Option<String>,
}

/// Transport printing every reply to stdout.
struct Console;

#[async_trait]
impl Transport for Console {
    async fn can_send(&self, _message: &InboundMessage) -> bool {
        true
    }

    async fn send(&self, _message: &InboundMessage, content: &str) -> TransportResult<()> {
        println!("{content}");
        Ok(())
    }
}

fn reply(service: &CommandService, key: &str, fallback: &str) -> String {
    service
        .downcast_ref::<CommandTexts>()
        .and_then(|texts| texts.get(key))
        .unwrap_or(fallback)
        .to_string()
}

fn handlers(runtime: Arc<OnceLock<HeraldRuntime>>) -> HandlerCatalog {
    let help_runtime = Arc::clone(&runtime);

    HandlerCatalog::new()
        .with(
            "ping",
            handler_fn(|_message, service, _args| async move {
                println!("{}", reply(&service, "reply", "Pong!"));
                Ok(())
            }),
        )
        .with(
            "echo",
            handler_fn(|_message, _service, args| async move {
                println!("{}", args.join(" "));
                Ok(())
            }),
        )
        .with(
            "help",
            handler_fn(move |_message, _service, _args| {
                let runtime = Arc::clone(&help_runtime);
                async move {
                    let Some(runtime) = runtime.get() else {
                        return Ok(());
                    };
                    for group in runtime.registry().groups() {
                        println!("[{group}]");
                        for command in runtime.registry().get_commands_by_group(&[group.as_str()]) {
                            println!(
                                "  {:<8} {}",
                                command.name(),
                                command.description().unwrap_or_default()
                            );
                        }
                    }
                    Ok(())
                }
            }),
        )
        .with(
            "reload",
            handler_fn(move |_message, _service, args| {
                let runtime = Arc::clone(&runtime);
                async move {
                    let (Some(runtime), Some(name)) = (runtime.get(), args.first()) else {
                        return Ok(());
                    };
                    match runtime.reload(name) {
                        ReloadStatus::Ok { descriptor } => {
                            println!("Reloaded '{}'", descriptor.name());
                        }
                        ReloadStatus::Failed { error } => println!("Reload failed: {error}"),
                    }
                    Ok(())
                }
            }),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let slot = Arc::new(OnceLock::new());
    let localization = TextCatalog::with_system_defaults("en-us")
        .with_text("en-us", "commands.ping.reply", "Pong!")
        .with_text("fr", "commands.ping.reply", "Pong ! (fr)");

    let runtime = HeraldRuntime::builder()
        .config_file(&args.config)
        .transport(Arc::new(Console))
        .localization(Arc::new(localization))
        .catalog(Arc::new(handlers(Arc::clone(&slot))))
        .build()?;

    let report = runtime.load_commands()?;
    info!(
        loaded = report.loaded.len(),
        skipped = report.failures.len(),
        "Console bot ready"
    );

    let runtime = slot.get_or_init(|| runtime);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut message = InboundMessage::new(Author::new(args.user.as_str()), line);
        if let Some(guild) = &args.guild {
            message = message.in_guild(guild.as_str(), "console");
        }

        let outcome = runtime.handle(message).await;
        debug!(?outcome, "Line dispatched");
    }

    Ok(())
}
