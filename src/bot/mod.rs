//! Message handling for Referat.
//!
//! [`Handler`] implements the per-message pipeline (classify, retrieve,
//! ground, generate) and converts every library error into a fixed
//! user-facing reply; nothing that happens inside one message crashes the
//! conversation or the process. [`Dispatcher`] feeds it from Telegram long
//! polling with one worker task per chat, so messages within a conversation
//! are handled strictly in arrival order while conversations stay concurrent.

mod telegram;

pub use telegram::{Chat, TelegramClient, TelegramMessage, Update, User, POLL_TIMEOUT_SECS};

use crate::audit::RequestLog;
use crate::context::{ConversationContextStore, ConversationId};
use crate::engine::AnswerEngine;
use crate::error::{ReferatError, Result, UnavailableReason};
use crate::transcript::{CaptionSource, TranscriptRetriever};
use crate::video::{classify, MessageKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

/// Reply to the `/start` command.
const START_MESSAGE: &str = "Hi! Send me a YouTube video link and I will:\n\
    1. Fetch the subtitles\n\
    2. Write a short summary\n\
    3. Answer your questions about the video";

/// Fixed user-facing replies for the closed error taxonomy.
fn user_message(err: &ReferatError) -> String {
    match err {
        ReferatError::InvalidReference => {
            "❌ Could not recognize a YouTube video link. \
             Please make sure the link is correct."
                .to_string()
        }
        ReferatError::TranscriptUnavailable { reason, .. } => {
            let hint = match reason {
                UnavailableReason::Disabled => "• Subtitles are disabled for this video",
                UnavailableReason::NotFound => "• The video or its subtitles could not be found",
                UnavailableReason::Service => "• The subtitle service is unreachable",
            };
            format!(
                "❌ <b>Could not fetch subtitles for this video.</b>\n{}",
                hint
            )
        }
        ReferatError::NoActiveTranscript => {
            "❌ <b>Send me a YouTube video link first!</b>".to_string()
        }
        ReferatError::GenerationFailed(_) => {
            "❌ <b>An error occurred while generating the response.</b> \
             Please try again later."
                .to_string()
        }
        _ => "❌ <b>An error occurred while processing your message.</b>".to_string(),
    }
}

/// An inbound message routed to a conversation worker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: ConversationId,
    pub user_id: i64,
    pub username: String,
    pub text: String,
}

/// The per-message pipeline.
pub struct Handler<S> {
    retriever: TranscriptRetriever<S>,
    engine: AnswerEngine,
    store: ConversationContextStore,
    audit: RequestLog,
}

impl<S: CaptionSource> Handler<S> {
    pub fn new(retriever: TranscriptRetriever<S>, engine: AnswerEngine, audit: RequestLog) -> Self {
        Self {
            retriever,
            engine,
            store: ConversationContextStore::new(),
            audit,
        }
    }

    /// Handle one message and produce the reply text. Errors never escape:
    /// they are converted to fixed user-facing messages here.
    #[instrument(skip(self, message), fields(chat_id = message.chat_id, user_id = message.user_id))]
    pub async fn handle(&self, message: &InboundMessage) -> String {
        if message.text.trim() == "/start" {
            return START_MESSAGE.to_string();
        }

        match self.dispatch(message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Message handling failed: {}", e);
                user_message(&e)
            }
        }
    }

    async fn dispatch(&self, message: &InboundMessage) -> Result<String> {
        match classify(&message.text)? {
            MessageKind::VideoReference(video_id) => {
                info!("Processing video reference {}", video_id);
                self.audit
                    .record(message.user_id, &message.username, &video_id)
                    .await;

                let transcript = self.retriever.fetch(&video_id).await?;
                self.store
                    .set(message.chat_id, transcript.clone(), video_id);

                let summary = self.engine.summarize(&transcript).await?;
                Ok(format!(
                    "📝 <b>Video summary:</b>\n\n{}\n\n\
                     🤔 Now you can ask me questions about the video!",
                    summary
                ))
            }
            MessageKind::Question => {
                let state = self
                    .store
                    .get(message.chat_id)
                    .ok_or(ReferatError::NoActiveTranscript)?;

                info!("Answering question against video {}", state.video_id);
                let answer = self.engine.answer(&message.text, &state.transcript).await?;
                Ok(format!("🤖 <b>Answer:</b>\n\n{}", answer))
            }
        }
    }

    /// The conversation context store (exposed for inspection in tests).
    pub fn store(&self) -> &ConversationContextStore {
        &self.store
    }
}

/// Long-polling update loop with one worker task per conversation.
///
/// A worker drains its channel one message at a time, so a conversation's
/// messages never overlap or reorder; distinct conversations run on
/// independent tasks.
pub struct Dispatcher<S> {
    client: Arc<TelegramClient>,
    handler: Arc<Handler<S>>,
    workers: HashMap<ConversationId, mpsc::Sender<InboundMessage>>,
}

impl<S: CaptionSource + 'static> Dispatcher<S> {
    pub fn new(client: TelegramClient, handler: Handler<S>) -> Self {
        Self {
            client: Arc::new(client),
            handler: Arc::new(handler),
            workers: HashMap::new(),
        }
    }

    /// Poll for updates and route them until the process is stopped.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting update loop");
        let mut offset = 0;

        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed, backing off: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Some(message) = Self::inbound(update) {
                    self.route(message).await;
                }
            }
        }
    }

    fn inbound(update: Update) -> Option<InboundMessage> {
        let message = update.message?;
        let text = message.text?;
        let (user_id, username) = message
            .from
            .map(|u| (u.id, u.username.unwrap_or_else(|| "Unknown".to_string())))
            .unwrap_or((0, "Unknown".to_string()));

        Some(InboundMessage {
            chat_id: message.chat.id,
            user_id,
            username,
            text,
        })
    }

    async fn route(&mut self, message: InboundMessage) {
        let chat_id = message.chat_id;
        if let Some(sender) = self.workers.get(&chat_id) {
            if sender.send(message.clone()).await.is_ok() {
                return;
            }
            // Worker task is gone; respawn and redeliver once.
            warn!("Worker for chat {} is gone, respawning", chat_id);
        }

        let sender = Self::spawn_worker(chat_id, self.client.clone(), self.handler.clone());
        let _ = sender.send(message).await;
        self.workers.insert(chat_id, sender);
    }

    fn spawn_worker(
        chat_id: ConversationId,
        client: Arc<TelegramClient>,
        handler: Arc<Handler<S>>,
    ) -> mpsc::Sender<InboundMessage> {
        let (tx, mut rx) = mpsc::channel::<InboundMessage>(32);

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let reply = handler.handle(&message).await;
                if let Err(e) = client.send_message(chat_id, &reply).await {
                    error!("Failed to deliver reply to chat {}: {}", chat_id, e);
                }
            }
        });

        tx
    }
}
