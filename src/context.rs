//! Per-conversation grounding state.
//!
//! Each conversation (Telegram chat) owns one slot holding the most recently
//! retrieved transcript and its source video. Slots are created lazily,
//! overwritten wholesale by each new video reference, and live for the
//! process lifetime. Conversations are independent: the map only needs safe
//! concurrent keyed access, no cross-key coordination.

use crate::transcript::Transcript;
use crate::video::VideoId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Conversation identifier (the Telegram chat id).
pub type ConversationId = i64;

/// The grounding state of one conversation.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub transcript: Transcript,
    pub video_id: VideoId,
}

/// Keyed store of per-conversation grounding state.
#[derive(Default)]
pub struct ConversationContextStore {
    states: RwLock<HashMap<ConversationId, ConversationState>>,
}

impl ConversationContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state for `conversation` unconditionally. No merge, no
    /// history.
    pub fn set(&self, conversation: ConversationId, transcript: Transcript, video_id: VideoId) {
        let mut states = self.states.write().unwrap();
        states.insert(
            conversation,
            ConversationState {
                transcript,
                video_id,
            },
        );
    }

    /// Current state for `conversation`, or `None` if no video has been
    /// processed there yet.
    pub fn get(&self, conversation: ConversationId) -> Option<ConversationState> {
        let states = self.states.read().unwrap();
        states.get(&conversation).cloned()
    }

    /// Number of conversations with grounding state.
    pub fn len(&self) -> usize {
        self.states.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::CaptionEntry;

    fn transcript(text: &str) -> Transcript {
        Transcript::from_entries(&[CaptionEntry {
            text: text.to_string(),
            start: 0.0,
            dur: 1.0,
        }])
    }

    fn video(id: &str) -> VideoId {
        crate::video::extract_video_id(&format!("https://youtu.be/{}", id)).unwrap()
    }

    #[test]
    fn test_get_before_set_is_absent() {
        let store = ConversationContextStore::new();
        assert!(store.get(42).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let store = ConversationContextStore::new();
        store.set(7, transcript("first video"), video("aaaaaaaaaaa"));
        store.set(7, transcript("second video"), video("bbbbbbbbbbb"));

        let state = store.get(7).unwrap();
        assert_eq!(state.transcript.text(), "second video");
        assert_eq!(state.video_id.as_str(), "bbbbbbbbbbb");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conversations_are_independent() {
        let store = ConversationContextStore::new();
        store.set(1, transcript("one"), video("aaaaaaaaaaa"));
        store.set(2, transcript("two"), video("bbbbbbbbbbb"));

        assert_eq!(store.get(1).unwrap().transcript.text(), "one");
        assert_eq!(store.get(2).unwrap().transcript.text(), "two");
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_concurrent_mutation() {
        use std::sync::Arc;

        let store = Arc::new(ConversationContextStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.set(i, transcript("t"), video("aaaaaaaaaaa"));
                        assert!(store.get(i).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }
}
