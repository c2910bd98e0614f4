//! UI-agnostic chat state
//!
//! The conversation log, the draft being typed and the in-flight flag. Nothing
//! in here knows about the terminal; the TUI and the headless `--ask` path
//! both drive the same [`ChatView`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::ChatBackend;
use crate::error::ChatError;

/// Shown as the bot's answer whenever a request fails, whatever the cause.
pub const FALLBACK_REPLY: &str = "Server error. Please try again later.";

/// Starter prompts offered while the conversation is empty.
pub const SUGGESTIONS: [&str; 4] = [
    "Best EV battery in 2025?",
    "How long does EV charging take?",
    "Compare lithium vs solid-state batteries",
    "EV maintenance cost breakdown",
];

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// One entry in the conversation log. Fields are private so an appended
/// message can't be edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { role: Role::Bot, text: text.into() }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default)]
pub struct ChatView {
    messages: Vec<Message>,
    draft: String,
    pending: bool,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Direct access for the line editor. Editing stays allowed while a
    /// request is pending; only submission is gated.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Suggestions are only offered before the first message.
    pub fn shows_suggestions(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn can_submit(&self) -> bool {
        !self.pending && !self.draft.trim().is_empty()
    }

    /// Commit the draft. Returns the text that must be sent to the backend,
    /// or `None` when nothing was submitted (blank draft or a request already
    /// in flight). The draft is kept untouched when refused.
    pub fn submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }

        let text = std::mem::take(&mut self.draft);
        self.messages.push(Message::user(text.clone()));
        self.pending = true;
        info!(messages = self.messages.len(), "message submitted");
        Some(text)
    }

    /// Record the outcome of the outstanding request: one bot message either
    /// way, then back to idle. Returns `false` if nothing was outstanding.
    pub fn settle(&mut self, outcome: Result<String, ChatError>) -> bool {
        if !self.pending {
            warn!("reply arrived with no request outstanding; dropped");
            return false;
        }

        let text = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat request failed");
                FALLBACK_REPLY.to_string()
            }
        };

        self.messages.push(Message::bot(text));
        self.pending = false;
        true
    }

    /// Copy a starter prompt into the draft without submitting it.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        match SUGGESTIONS.get(index) {
            Some(prompt) => {
                self.draft = (*prompt).to_string();
                true
            }
            None => false,
        }
    }

    /// Submit and wait for the reply in place. Used where there is no event
    /// loop to deliver the result asynchronously.
    pub async fn send_with(&mut self, backend: &dyn ChatBackend) -> bool {
        let Some(text) = self.submit() else {
            return false;
        };
        let outcome = backend.send(&text).await;
        self.settle(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays queued outcomes and records what it was asked.
    #[derive(Default)]
    pub(crate) struct MockBackend {
        outcomes: Mutex<VecDeque<Result<String, ChatError>>>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl MockBackend {
        pub(crate) fn replying(reply: &str) -> Self {
            let mock = Self::default();
            mock.queue(Ok(reply.to_string()));
            mock
        }

        pub(crate) fn failing(err: ChatError) -> Self {
            let mock = Self::default();
            mock.queue(Err(err));
            mock
        }

        pub(crate) fn queue(&self, outcome: Result<String, ChatError>) {
            self.outcomes.lock().unwrap().push_back(outcome);
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            self.calls.lock().unwrap().push(message.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatError::transport("no mock outcome queued")))
        }
    }

    fn bot_texts(view: &ChatView) -> Vec<&str> {
        view.messages()
            .iter()
            .filter(|m| m.role() == Role::Bot)
            .map(Message::text)
            .collect()
    }

    #[test]
    fn test_blank_draft_is_ignored() {
        for draft in ["", "   ", "\t\n"] {
            let mut view = ChatView::new();
            view.set_draft(draft);
            assert_eq!(view.submit(), None);
            assert!(view.messages().is_empty());
            assert!(!view.is_pending());
        }
    }

    #[tokio::test]
    async fn test_blank_draft_never_reaches_backend() {
        let backend = MockBackend::replying("unused");
        let mut view = ChatView::new();
        view.set_draft("  ");

        assert!(!view.send_with(&backend).await);
        assert_eq!(backend.call_count(), 0);
        assert!(view.messages().is_empty());
    }

    #[test]
    fn test_submit_appends_user_message_before_reply() {
        let mut view = ChatView::new();
        view.set_draft("How long does charging take?");

        let sent = view.submit();
        assert_eq!(sent.as_deref(), Some("How long does charging take?"));
        assert_eq!(view.messages(), &[Message::user("How long does charging take?")]);
        assert_eq!(view.draft(), "");
        assert!(view.is_pending());
    }

    #[test]
    fn test_submit_keeps_untrimmed_text() {
        let mut view = ChatView::new();
        view.set_draft("  hi there ");
        assert_eq!(view.submit().as_deref(), Some("  hi there "));
        assert_eq!(view.messages()[0].text(), "  hi there ");
    }

    #[test]
    fn test_submit_refused_while_pending() {
        let mut view = ChatView::new();
        view.set_draft("first");
        view.submit();

        view.set_draft("second");
        assert_eq!(view.submit(), None);
        assert_eq!(view.draft(), "second");
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn test_settle_success_appends_reply() {
        let mut view = ChatView::new();
        view.set_draft("How long does charging take?");
        view.submit();

        assert!(view.settle(Ok("About 30 minutes.".to_string())));
        assert_eq!(bot_texts(&view), vec!["About 30 minutes."]);
        assert!(!view.is_pending());
    }

    #[test]
    fn test_settle_error_appends_fallback() {
        for err in [
            ChatError::Status(500),
            ChatError::transport("connection refused"),
            ChatError::decode("expected value"),
        ] {
            let mut view = ChatView::new();
            view.set_draft("hello");
            view.submit();

            assert!(view.settle(Err(err)));
            assert_eq!(bot_texts(&view), vec![FALLBACK_REPLY]);
            assert!(!view.is_pending());
        }
    }

    #[test]
    fn test_settle_without_request_is_dropped() {
        let mut view = ChatView::new();
        assert!(!view.settle(Ok("stray".to_string())));
        assert!(view.messages().is_empty());
    }

    #[test]
    fn test_double_settle_appends_once() {
        let mut view = ChatView::new();
        view.set_draft("hello");
        view.submit();

        assert!(view.settle(Ok("one".to_string())));
        assert!(!view.settle(Ok("two".to_string())));
        assert_eq!(bot_texts(&view), vec!["one"]);
    }

    #[tokio::test]
    async fn test_send_with_mocked_reply() {
        let backend = MockBackend::replying("About 30 minutes.");
        let mut view = ChatView::new();
        view.set_draft("How long does charging take?");

        assert!(view.send_with(&backend).await);
        assert_eq!(
            view.messages(),
            &[
                Message::user("How long does charging take?"),
                Message::bot("About 30 minutes."),
            ]
        );
        assert_eq!(*backend.calls.lock().unwrap(), vec!["How long does charging take?"]);
    }

    #[tokio::test]
    async fn test_send_with_server_error() {
        let backend = MockBackend::failing(ChatError::Status(500));
        let mut view = ChatView::new();
        view.set_draft("hello");

        view.send_with(&backend).await;
        assert_eq!(bot_texts(&view), vec![FALLBACK_REPLY]);
    }

    #[tokio::test]
    async fn test_resubmit_after_settle() {
        let backend = MockBackend::default();
        backend.queue(Err(ChatError::transport("reset")));
        backend.queue(Ok("second answer".to_string()));
        let mut view = ChatView::new();

        view.set_draft("first");
        view.send_with(&backend).await;
        assert_eq!(view.draft(), "");
        assert!(!view.is_pending());

        view.set_draft("second");
        assert!(view.send_with(&backend).await);
        assert_eq!(bot_texts(&view), vec![FALLBACK_REPLY, "second answer"]);
        assert_eq!(view.messages().len(), 4);
    }

    #[test]
    fn test_select_suggestion_sets_draft_only() {
        let mut view = ChatView::new();
        assert!(view.select_suggestion(1));
        assert_eq!(view.draft(), "How long does EV charging take?");
        assert!(view.messages().is_empty());
        assert!(!view.is_pending());

        assert!(!view.select_suggestion(SUGGESTIONS.len()));
        assert_eq!(view.draft(), "How long does EV charging take?");
    }

    #[test]
    fn test_suggestions_hidden_after_first_message() {
        let mut view = ChatView::new();
        assert!(view.shows_suggestions());
        view.set_draft("hi");
        view.submit();
        assert!(!view.shows_suggestions());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::bot("ok")).unwrap();
        assert_eq!(json, r#"{"role":"bot","text":"ok"}"#);
    }
}
