//! Answer generation for Referat.
//!
//! Wraps a chat-completion backend to produce summaries and transcript-
//! grounded answers. Raw backend output always passes through the markup
//! sanitizer before it leaves this module; backend failures surface as
//! [`ReferatError::GenerationFailed`] and are never retried here.

use crate::config::{BackendSettings, Prompts};
use crate::error::{ReferatError, Result};
use crate::markup;
use crate::transcript::Transcript;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default timeout for backend requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Generative backend boundary: one instruction, one grounding payload, one
/// text completion back.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completion backend.
pub struct OpenAiBackend {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl OpenAiBackend {
    /// Build a client from backend settings. Endpoint, credential and model
    /// are fixed for the process lifetime.
    pub fn new(settings: &BackendSettings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(settings.api_key.clone());
        if let Some(base) = &settings.api_base {
            config = config.with_api_base(base.clone());
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client: async_openai::Client::with_config(config).with_http_client(http_client),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| ReferatError::GenerationFailed(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| ReferatError::GenerationFailed(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| ReferatError::GenerationFailed(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ReferatError::GenerationFailed(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ReferatError::GenerationFailed("empty response from backend".to_string()))
    }
}

/// Produces sanitized summaries and answers grounded in a transcript.
pub struct AnswerEngine {
    backend: Arc<dyn ChatBackend>,
    prompts: Prompts,
    language: String,
}

impl AnswerEngine {
    pub fn new(backend: Arc<dyn ChatBackend>, language: impl Into<String>) -> Self {
        Self {
            backend,
            prompts: Prompts::default(),
            language: language.into(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    fn vars(&self, transcript: &Transcript) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), self.language.clone());
        vars.insert("transcript".to_string(), transcript.text().to_string());
        vars
    }

    /// Summarize a transcript into a sanitized HTML fragment.
    #[instrument(skip(self, transcript), fields(transcript_chars = transcript.len()))]
    pub async fn summarize(&self, transcript: &Transcript) -> Result<String> {
        info!("Generating summary");
        let vars = self.vars(transcript);
        let system = Prompts::render(&self.prompts.summary.system, &vars);
        let user = Prompts::render(&self.prompts.summary.user, &vars);

        let raw = self.backend.complete(&system, &user).await?;
        debug!("Summary generated ({} chars)", raw.len());
        Ok(markup::sanitize(&raw))
    }

    /// Answer a question using only the transcript as context, returning a
    /// sanitized HTML fragment.
    #[instrument(skip(self, transcript), fields(question = %question))]
    pub async fn answer(&self, question: &str, transcript: &Transcript) -> Result<String> {
        info!("Generating answer");
        let mut vars = self.vars(transcript);
        vars.insert("question".to_string(), question.to_string());
        let system = Prompts::render(&self.prompts.answer.system, &vars);
        let user = Prompts::render(&self.prompts.answer.user, &vars);

        let raw = self.backend.complete(&system, &user).await?;
        debug!("Answer generated ({} chars)", raw.len());
        Ok(markup::sanitize(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::CaptionEntry;

    /// Backend returning a canned fragment (or a scripted failure).
    struct FakeBackend {
        reply: std::result::Result<String, String>,
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            assert!(!user.is_empty());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(ReferatError::GenerationFailed(msg.clone())),
            }
        }
    }

    fn transcript() -> Transcript {
        Transcript::from_entries(&[CaptionEntry {
            text: "the talk covers ownership and borrowing".to_string(),
            start: 0.0,
            dur: 5.0,
        }])
    }

    #[tokio::test]
    async fn test_summary_is_sanitized() {
        let backend = Arc::new(FakeBackend {
            reply: Ok("<div><b>Ownership".to_string()),
        });
        let engine = AnswerEngine::new(backend, "en");

        let summary = engine.summarize(&transcript()).await.unwrap();
        assert_eq!(summary, "<b>Ownership</b>");
    }

    #[tokio::test]
    async fn test_answer_is_sanitized() {
        let backend = Arc::new(FakeBackend {
            reply: Ok("It is about <em>borrowing".to_string()),
        });
        let engine = AnswerEngine::new(backend, "en");

        let answer = engine.answer("what is it about?", &transcript()).await.unwrap();
        assert_eq!(answer, "It is about <em>borrowing</em>");
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = Arc::new(FakeBackend {
            reply: Err("quota exceeded".to_string()),
        });
        let engine = AnswerEngine::new(backend, "en");

        let err = engine.summarize(&transcript()).await.unwrap_err();
        assert!(matches!(err, ReferatError::GenerationFailed(_)));
    }
}
