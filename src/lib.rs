//! Referat - Video Summaries and Q&A over Telegram
//!
//! A Telegram bot that turns a YouTube link into a summary and then answers
//! follow-up questions grounded in the video's transcript.
//!
//! # Overview
//!
//! Referat allows you to:
//! - Send a YouTube link and get a short summary of the video
//! - Ask questions answered strictly from the video's subtitles
//! - Keep an independent grounding context per chat
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Environment configuration and prompt templates
//! - `video` - Video reference parsing and message classification
//! - `transcript` - Caption retrieval with language fallback and translation
//! - `context` - Per-conversation grounding state
//! - `engine` - Summary and answer generation
//! - `markup` - HTML repair for Telegram delivery
//! - `audit` - Append-only request audit log
//! - `bot` - Telegram boundary and message dispatch
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use referat::audit::RequestLog;
//! use referat::bot::Handler;
//! use referat::config::Settings;
//! use referat::engine::{AnswerEngine, OpenAiBackend};
//! use referat::transcript::{TranscriptRetriever, YoutubeCaptionSource};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let settings = Settings::from_env()?;
//! let retriever = TranscriptRetriever::new(
//!     YoutubeCaptionSource::new(),
//!     settings.language.target.clone(),
//!     settings.language.fallback.clone(),
//! );
//! let engine = AnswerEngine::new(
//!     Arc::new(OpenAiBackend::new(&settings.backend)),
//!     settings.language.target.clone(),
//! );
//! let handler = Handler::new(retriever, engine, RequestLog::new(&settings.request_log_path));
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod bot;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod markup;
pub mod transcript;
pub mod video;

pub use error::{ReferatError, Result, UnavailableReason};
