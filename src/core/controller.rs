//! Submission state machine.
//!
//! [`ChatController::submit`] appends the user turn, posts the request,
//! appends an empty assistant placeholder and then rewrites that placeholder
//! with the accumulated reply after every chunk. The conversation and the
//! loading flag are published through `watch` channels; display code only
//! reads them.

use std::sync::{Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ChatRequest;
use crate::core::accumulator::Accumulator;
use crate::core::chat_stream::{ChunkStream, Transport};
use crate::core::constants::TRANSPORT_ERROR_MESSAGE;
use crate::core::conversation::{Conversation, ConversationStore};
use crate::core::decoder::Utf8ChunkDecoder;
use crate::core::error::ChatError;
use crate::core::message::Turn;

/// Counters for one streamed reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub chunks: usize,
    pub bytes: usize,
    pub decode_failures: usize,
}

/// Result of a submission that reached the conversation.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The backend closed the stream normally.
    Completed(StreamSummary),
    /// [`ChatController::cancel`] ended the stream early. Text received so
    /// far stays in the assistant turn.
    Cancelled(StreamSummary),
    /// The failure was recorded as a single assistant turn.
    Failed(ChatError),
}

impl SubmitOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SubmitOutcome::Completed(_))
    }

    pub fn summary(&self) -> Option<StreamSummary> {
        match self {
            SubmitOutcome::Completed(summary) | SubmitOutcome::Cancelled(summary) => {
                Some(*summary)
            }
            SubmitOutcome::Failed(_) => None,
        }
    }
}

pub struct ChatController<T> {
    transport: T,
    store: ConversationStore,
    loading: watch::Sender<bool>,
    active: Mutex<Option<CancellationToken>>,
}

/// Resets session state on every exit from `submit`, including early
/// returns, cancellation by drop and panics.
///
/// Only a session that opened the assistant placeholder finishes it; a store
/// shared with another controller may hold that controller's turn.
struct SessionGuard<'a, T> {
    controller: &'a ChatController<T>,
    opened_turn: bool,
}

impl<T> Drop for SessionGuard<'_, T> {
    fn drop(&mut self) {
        let controller = self.controller;
        if self.opened_turn {
            controller.store.finish();
        }
        controller.loading.send_replace(false);
        *controller
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<T: Transport> ChatController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_store(transport, ConversationStore::new())
    }

    pub fn with_store(transport: T, store: ConversationStore) -> Self {
        let (loading, _rx) = watch::channel(false);
        Self {
            transport,
            store,
            loading,
            active: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn conversation(&self) -> Conversation {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.store.subscribe()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Cancels the open stream, if any. Returns whether one was open.
    pub fn cancel(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Sends `user_text` and streams the reply into the conversation.
    ///
    /// Returns `Err` only when the submission was rejected before anything
    /// was appended: an empty credential, or another submission still
    /// streaming.
    pub async fn submit(
        &self,
        user_text: &str,
        credential: &str,
    ) -> Result<SubmitOutcome, ChatError> {
        if credential.is_empty() {
            info!("Submission rejected: no API key");
            return Err(ChatError::MissingCredential);
        }

        let token = self.claim_session()?;
        let mut guard = SessionGuard {
            controller: self,
            opened_turn: false,
        };

        self.store.push(Turn::user(user_text))?;
        self.loading.send_replace(true);
        info!(message_len = user_text.len(), "Submitting chat message");

        let request = ChatRequest::new(user_text, credential);
        let posted = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Submission cancelled before the backend answered");
                return Ok(SubmitOutcome::Cancelled(StreamSummary::default()));
            }
            posted = self.transport.post(&request) => posted,
        };

        let stream = match posted {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "Chat request failed");
                self.store.push(Turn::assistant(TRANSPORT_ERROR_MESSAGE))?;
                return Ok(SubmitOutcome::Failed(err.into()));
            }
        };

        self.store.begin_assistant()?;
        guard.opened_turn = true;
        Ok(self.read_stream(stream, &token).await)
    }

    fn claim_session(&self) -> Result<CancellationToken, ChatError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            debug!("Submission rejected: a reply is still streaming");
            return Err(ChatError::Busy);
        }
        let token = CancellationToken::new();
        *active = Some(token.clone());
        Ok(token)
    }

    async fn read_stream(&self, mut stream: ChunkStream, token: &CancellationToken) -> SubmitOutcome {
        let mut decoder = Utf8ChunkDecoder::new();
        let mut accumulator = Accumulator::new();
        let mut summary = StreamSummary::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(
                        chunks = summary.chunks,
                        bytes = summary.bytes,
                        "Stream cancelled"
                    );
                    return SubmitOutcome::Cancelled(summary);
                }
                next = stream.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    warn!(
                        error = %err,
                        chunks = summary.chunks,
                        bytes = summary.bytes,
                        "Stream interrupted"
                    );
                    self.store.update_last(TRANSPORT_ERROR_MESSAGE);
                    return SubmitOutcome::Failed(err.into());
                }
                None => break,
            };

            summary.chunks += 1;
            summary.bytes += chunk.len();

            let decoded = decoder.decode(&chunk);
            if let Some(err) = decoder.take_interrupted() {
                summary.decode_failures += 1;
                warn!(error = %err, "Dropping incomplete character");
            }
            match decoded {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => {
                    let text = accumulator.push(&fragment);
                    self.store.update_last(text);
                }
                Err(err) => {
                    summary.decode_failures += 1;
                    warn!(error = %err, chunk_len = chunk.len(), "Skipping undecodable chunk");
                }
            }
        }

        if let Err(err) = decoder.finish() {
            summary.decode_failures += 1;
            warn!(error = %err, "Dropping incomplete character at end of stream");
        }

        debug!(
            chunks = summary.chunks,
            bytes = summary.bytes,
            chars = accumulator.as_str().chars().count(),
            decode_failures = summary.decode_failures,
            "Stream completed"
        );
        SubmitOutcome::Completed(summary)
    }
}

#[cfg(test)]
mod tests;
