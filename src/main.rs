//! Referat bot entry point.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use referat::audit::RequestLog;
use referat::bot::{Dispatcher, Handler, TelegramClient};
use referat::config::Settings;
use referat::engine::{AnswerEngine, OpenAiBackend};
use referat::transcript::{TranscriptRetriever, YoutubeCaptionSource};

/// Referat - Video Summaries and Q&A over Telegram
#[derive(Parser, Debug)]
#[command(name = "referat")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a .env file to load before reading configuration
    #[arg(short, long)]
    env_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment configuration (.env is optional)
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("referat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Missing credentials abort here, before any conversation is served.
    let settings = Settings::from_env()?;
    tracing::info!(
        "Configured: model={}, target language={}, fallback={}",
        settings.backend.model,
        settings.language.target,
        settings.language.fallback
    );

    let retriever = TranscriptRetriever::new(
        YoutubeCaptionSource::new(),
        settings.language.target.clone(),
        settings.language.fallback.clone(),
    );
    let engine = AnswerEngine::new(
        Arc::new(OpenAiBackend::new(&settings.backend)),
        settings.language.target.clone(),
    );
    let audit = RequestLog::new(&settings.request_log_path);

    let client = TelegramClient::new(&settings.bot_token, settings.proxy_url.as_deref())?;
    let handler = Handler::new(retriever, engine, audit);

    let mut dispatcher = Dispatcher::new(client, handler);
    tokio::select! {
        result = dispatcher.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}
