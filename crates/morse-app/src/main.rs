//! Morse application binary.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing with the resolved log filter
//! 3. Build the decoder engine and attach an event printer
//! 4. Play the key script in real time, then let the idle timer drain

mod cli;
mod script;

use std::time::Duration;

use clap::Parser;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use morse_core::config::DecoderConfig;
use morse_core::{DecoderEvent, KeyEventKind};
use morse_decoder::DecoderEngine;

use cli::CliArgs;

/// Extra wait after the last idle tick is due.
const DRAIN_MARGIN: Duration = Duration::from_millis(100);

fn describe(event: &DecoderEvent) -> String {
    match event {
        DecoderEvent::Key(key) => match key.kind {
            KeyEventKind::Press => format!("key   down @{}", key.at.0),
            KeyEventKind::Release => format!("key   up   @{}", key.at.0),
        },
        DecoderEvent::Mark { mark, source } => format!("mark  {} ({:?})", mark, source),
        DecoderEvent::Symbol { symbol } => format!("sym   {}", symbol),
        DecoderEvent::Letter { letter } => format!("char  {}", letter),
    }
}

/// Print events until the engine is dropped. Returns the decoded text.
async fn print_events(mut events: BroadcastStream<DecoderEvent>, json: bool) -> String {
    let mut decoded = String::new();
    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
                continue;
            }
        };
        if let DecoderEvent::Letter { letter } = &event {
            decoded.push_str(&letter.to_string());
        }
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
            }
        } else {
            println!("{}", describe(&event));
        }
    }
    decoded
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        DecoderConfig::load(&config_file)?
    } else {
        DecoderConfig::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            args.resolve_log_filter(&config.general.log_level),
        ))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let source = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let steps = script::parse(&source)?;
    tracing::info!(steps = steps.len(), "Key script parsed");

    let engine = DecoderEngine::new(&config)?;
    let printer = tokio::spawn(print_events(
        BroadcastStream::new(engine.subscribe_events()),
        args.json,
    ));

    script::play(&engine, &steps).await;

    let idle = config.timing.idle_period() * config.timing.idle_tick_limit;
    tokio::time::sleep(idle + DRAIN_MARGIN).await;
    drop(engine);

    let decoded = printer.await?;
    if !args.json {
        println!("decoded: {}", decoded);
    }
    tracing::info!(letters = decoded.chars().count(), "Playback finished");

    Ok(())
}
