#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::sync::Arc;

use tracing::warn;

use super::BusyGuard;
use crate::net::Backend;
use crate::net::types::ChatTurn;

/// Assistant text appended in place of a reply when the call fails.
pub const CHAT_ERROR_MESSAGE: &str = "Error connecting to the assistant.";

/// What [`ChatSession::submit`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank text or a request already in flight; nothing happened.
    Ignored,
    /// The assistant reply was appended.
    Replied,
    /// The call failed and [`CHAT_ERROR_MESSAGE`] was appended instead.
    Failed,
}

/// State for the chat widget.
///
/// History only grows. It is discarded with the session; there is no reset.
pub struct ChatSession {
    backend: Arc<dyn Backend>,
    history: Vec<ChatTurn>,
    input: String,
    context: String,
    busy: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend, history: Vec::new(), input: String::new(), context: String::new(), busy: false }
    }

    /// Set the context string sent alongside every message.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    #[must_use]
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.context = context.into();
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Submit the pending input buffer, clearing it.
    ///
    /// A blank buffer is left untouched.
    pub async fn send_input(&mut self) -> SubmitOutcome {
        if self.input.trim().is_empty() || self.busy {
            return SubmitOutcome::Ignored;
        }
        let text = std::mem::take(&mut self.input);
        self.submit(&text).await
    }

    /// Append `text` as a user turn, then append the assistant's reply.
    ///
    /// The user turn is appended before the call is made. A failed call is
    /// absorbed into the history as an assistant turn carrying
    /// [`CHAT_ERROR_MESSAGE`].
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() || self.busy {
            return SubmitOutcome::Ignored;
        }

        self.history.push(ChatTurn::user(text));
        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.backend.send_chat_message(text, &self.context).await
        };

        match result {
            Ok(reply) => {
                self.history.push(ChatTurn::assistant(reply.response));
                SubmitOutcome::Replied
            }
            Err(error) => {
                warn!(%error, "chat message failed");
                self.history.push(ChatTurn::assistant(CHAT_ERROR_MESSAGE));
                SubmitOutcome::Failed
            }
        }
    }
}
