//! Configuration settings for Referat.
//!
//! Everything is read once at startup from the environment. A missing
//! required credential is a fatal startup error, never a runtime one.

use crate::error::{ReferatError, Result};

/// Generative backend configuration (OpenAI-compatible endpoint).
///
/// DeepSeek-flavored variables take precedence over the OpenAI ones, so the
/// same binary runs against either provider.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// API key for the chat-completion endpoint.
    pub api_key: String,
    /// Custom API base URL, if not the OpenAI default.
    pub api_base: Option<String>,
    /// Model name for summaries and answers.
    pub model: String,
}

/// Transcript language policy.
#[derive(Debug, Clone)]
pub struct LanguageSettings {
    /// The assistant's working language; preferred caption language.
    pub target: String,
    /// Fallback caption language, translated into the target when needed.
    pub fallback: String,
}

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot token.
    pub bot_token: String,
    /// Generative backend settings.
    pub backend: BackendSettings,
    /// Caption language policy.
    pub language: LanguageSettings,
    /// Path of the append-only request audit log.
    pub request_log_path: String,
    /// Optional HTTPS proxy for outbound calls.
    pub proxy_url: Option<String>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn required(name: &str) -> Result<String> {
    env_var(name).ok_or_else(|| {
        ReferatError::Config(format!("{} is not set in the environment", name))
    })
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        let bot_token = required("TELEGRAM_BOT_TOKEN")?;

        let api_key = env_var("DEEPSEEK_API_KEY")
            .or_else(|| env_var("OPENAI_API_KEY"))
            .ok_or_else(|| {
                ReferatError::Config(
                    "Neither DEEPSEEK_API_KEY nor OPENAI_API_KEY is set in the environment"
                        .to_string(),
                )
            })?;
        let api_base = env_var("DEEPSEEK_API_BASE").or_else(|| env_var("OPENAI_API_BASE"));
        let model = env_var("DEEPSEEK_API_MODEL")
            .or_else(|| env_var("OPENAI_API_MODEL"))
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        let language = LanguageSettings {
            target: env_var("REFERAT_TARGET_LANG").unwrap_or_else(|| "ru".to_string()),
            fallback: env_var("REFERAT_FALLBACK_LANG").unwrap_or_else(|| "en".to_string()),
        };

        Ok(Self {
            bot_token,
            backend: BackendSettings {
                api_key,
                api_base,
                model,
            },
            language,
            request_log_path: env_var("REFERAT_REQUEST_LOG")
                .unwrap_or_else(|| "logs/requests.log".to_string()),
            proxy_url: env_var("PROXY_URL"),
        })
    }
}
