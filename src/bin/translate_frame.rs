//! Translate a frame of a document file through the translation proxy.
//!
//! Usage:
//!   cargo run --bin translate-frame -- design.json
//!   cargo run --bin translate-frame -- design.json --frame "Card" --out translated.json
//!   cargo run --bin translate-frame -- design.json --events 2> events.jsonl
//!
//! Without `--frame` the document's saved selection is used. Without
//! `--out` the updated document is printed to stdout. With `--events` the
//! progress notices are written to stderr as JSON lines
//! (`{"message": ..., "isError": ...}`) instead of being logged.
//!
//! Environment (see `Config::from_env`):
//! - TRANSLATOR_ENDPOINT (defaults to http://127.0.0.1:3000/api/translate)
//! - TRANSLATOR_API_KEY (optional; the proxy may hold its own key)
//! - TARGET_LANGUAGES (defaults to AR,ES,NL,PT,FR)
//! - FRAME_SPACING (defaults to 50)

use anyhow::{bail, Context, Result};
use frame_translator::config::Config;
use frame_translator::document::{FontCatalog, MemoryDocument};
use frame_translator::gateway::TranslationGateway;
use frame_translator::i18n::TranslationMetrics;
use frame_translator::orchestrator::{Orchestrator, RunOptions};
use frame_translator::providers::ProxyProvider;
use frame_translator::status::{ChannelStatus, StatusEvent, StatusSink, TracingStatus};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

#[derive(Debug, PartialEq)]
struct Args {
    document: PathBuf,
    frame: Option<String>,
    out: Option<PathBuf>,
    events: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut document = None;
    let mut frame = None;
    let mut out = None;
    let mut events = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--frame" => frame = Some(args.next().context("--frame needs a frame id or name")?),
            "--out" => out = Some(PathBuf::from(args.next().context("--out needs a file path")?)),
            "--events" => events = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            _ if document.is_none() => document = Some(PathBuf::from(&arg)),
            _ => bail!("Unexpected argument: {}", arg),
        }
    }

    Ok(Args {
        document: document
            .context("Usage: translate-frame <document.json> [--frame <id|name>] [--out <file>] [--events]")?,
        frame,
        out,
        events,
    })
}

/// Write each status event as one JSON line until every sender is gone.
async fn forward_events(
    mut events: UnboundedReceiver<StatusEvent>,
    mut out: impl Write,
) -> Result<usize> {
    let mut written = 0;
    while let Some(event) = events.recv().await {
        serde_json::to_writer(&mut out, &event)?;
        writeln!(out)?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout may carry the document
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frame_translator=info".parse()?),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = Config::from_env()?;

    let mut document = MemoryDocument::load(&args.document)?;
    if let Some(frame) = &args.frame {
        let id = document
            .find_top_level(frame)
            .map(|f| f.id.clone())
            .with_context(|| format!("No top-level frame with id or name '{}'", frame))?;
        document.select(vec![id]);
    }

    let provider = ProxyProvider::new(
        config.http_client()?,
        config.translator_endpoint.clone(),
        config.translator_api_key.clone(),
    );
    let gateway = TranslationGateway::new(provider).with_detail_limit(config.error_detail_limit);
    let targets: Vec<String> = config
        .target_languages
        .iter()
        .map(|lang| format!("{} ({})", lang.name(), lang))
        .collect();
    info!("Target languages: {}", targets.join(", "));
    let orchestrator = Orchestrator::new(gateway, RunOptions::from_config(&config));

    let (status, forwarder): (Box<dyn StatusSink>, _) = if args.events {
        let (sink, receiver) = ChannelStatus::new();
        let forwarder = tokio::spawn(forward_events(receiver, std::io::stderr()));
        (Box::new(sink), Some(forwarder))
    } else {
        (Box::new(TracingStatus), None)
    };

    let outcome = orchestrator
        .run(&mut document, &FontCatalog::permissive(), status.as_ref())
        .await;

    // Closing the channel lets the forwarder drain and finish
    drop(status);
    if let Some(forwarder) = forwarder {
        forwarder.await.context("Event forwarder panicked")??;
    }
    let summary = outcome?;

    info!(
        "Created {} frames in {}ms",
        summary.frames_created,
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
    info!("Metrics: {:?}", TranslationMetrics::global().report());

    let json = document.to_json_pretty()?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
