//! Configuration module for Referat.
//!
//! Handles startup environment configuration and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, SummaryPrompts};
pub use settings::{BackendSettings, LanguageSettings, Settings};
