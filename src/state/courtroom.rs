//! Courtroom session: a debate grown one server-chosen turn at a time.
//!
//! Each round trip sends the case context plus the whole history so far; the
//! backend decides who speaks next and returns exactly one turn. The client
//! never loops on its own and enforces no turn limit.

#[cfg(test)]
#[path = "courtroom_test.rs"]
mod courtroom_test;

use std::sync::Arc;

use tracing::{debug, warn};

use super::{BusyGuard, Notifier};
use crate::net::types::{DebateTurn, MalformedTurn};
use crate::net::{ApiError, Backend};

/// Alert shown when the backend call itself fails.
pub const SIMULATION_ERROR_ALERT: &str = "Courtroom simulation error. Check logs.";

#[derive(Debug, thiserror::Error)]
pub enum CourtroomError {
    #[error("courtroom call failed: {0}")]
    Transport(#[from] ApiError),
    #[error("backend returned a malformed turn: {0}")]
    MalformedTurn(#[from] MalformedTurn),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// No context, or a request already in flight.
    Ignored,
    Appended(DebateTurn),
}

/// State for the courtroom viewer.
pub struct Courtroom {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    context: String,
    history: Vec<DebateTurn>,
    busy: bool,
}

impl Courtroom {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { backend, notifier, context: String::new(), history: Vec::new(), busy: false }
    }

    #[must_use]
    pub fn history(&self) -> &[DebateTurn] {
        &self.history
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Open a new session for `context` and fetch its first turn.
    ///
    /// Any previous history is discarded first, even if the first turn
    /// then fails.
    ///
    /// # Errors
    ///
    /// Same as [`Courtroom::advance`].
    pub async fn start(&mut self, context: &str) -> Result<AdvanceOutcome, CourtroomError> {
        if context.trim().is_empty() || self.busy {
            return Ok(AdvanceOutcome::Ignored);
        }
        context.clone_into(&mut self.context);
        self.history.clear();
        self.advance().await
    }

    /// Ask the backend for the next turn and append it.
    ///
    /// At most one turn is appended per call. On failure the history is left
    /// unchanged: a transport failure also raises an operator alert, and a
    /// malformed turn is logged and returned so the caller can offer to try
    /// again.
    ///
    /// # Errors
    ///
    /// [`CourtroomError::Transport`] when the call fails,
    /// [`CourtroomError::MalformedTurn`] when the response lacks a known
    /// speaker or argument text.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, CourtroomError> {
        if self.context.trim().is_empty() || self.busy {
            return Ok(AdvanceOutcome::Ignored);
        }

        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.backend.advance_courtroom_turn(&self.context, &self.history).await
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(ApiError::Decode { message, .. }) => {
                warn!(%message, "unexpected courtroom response format");
                return Err(MalformedTurn::Undecodable(message).into());
            }
            Err(error) => {
                warn!(%error, "courtroom simulation failed");
                self.notifier.alert(SIMULATION_ERROR_ALERT);
                return Err(error.into());
            }
        };

        match payload.into_turn() {
            Ok(turn) => {
                debug!(speaker = %turn.speaker, round = self.history.len() + 1, "courtroom turn");
                self.history.push(turn.clone());
                Ok(AdvanceOutcome::Appended(turn))
            }
            Err(reason) => {
                warn!(%reason, "unexpected courtroom response format");
                Err(reason.into())
            }
        }
    }
}
