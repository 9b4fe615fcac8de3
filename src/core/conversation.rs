//! Ordered conversation log shared between the controller and display code.
//!
//! Every mutation publishes a fresh [`Conversation`] snapshot through a
//! `watch` channel. Snapshots reuse the `Arc<Turn>` of every turn the
//! mutation did not touch, so observers can hold on to an old snapshot for as
//! long as they like without blocking the writer.

use std::sync::Arc;

use tokio::sync::watch;

use crate::core::error::ChatError;
use crate::core::message::Turn;

/// Immutable view of the conversation at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Arc<[Arc<Turn>]>,
    in_progress: Option<usize>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            turns: Arc::from(Vec::new()),
            in_progress: None,
        }
    }
}

impl Conversation {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index).map(Arc::as_ref)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last().map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().map(Arc::as_ref)
    }

    /// Index of the assistant turn that is still receiving streamed text.
    pub fn in_progress(&self) -> Option<usize> {
        self.in_progress
    }

    pub fn is_streaming(&self) -> bool {
        self.in_progress.is_some()
    }

    pub fn to_vec(&self) -> Vec<Turn> {
        self.iter().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn turn_handle(&self, index: usize) -> Option<&Arc<Turn>> {
        self.turns.get(index)
    }

    fn with_appended(&self, turn: Turn, in_progress: bool) -> Self {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend(self.turns.iter().cloned());
        turns.push(Arc::new(turn));
        let index = turns.len() - 1;
        Self {
            turns: Arc::from(turns),
            in_progress: in_progress.then_some(index),
        }
    }

    fn with_last_content(&self, content: &str) -> Self {
        let mut turns: Vec<Arc<Turn>> = self.turns.iter().cloned().collect();
        if let Some(last) = turns.last_mut() {
            *last = Arc::new(Turn::new(last.role, content));
        }
        Self {
            turns: Arc::from(turns),
            in_progress: self.in_progress,
        }
    }
}

/// Single writer for the conversation. Clones share the same log.
#[derive(Clone)]
pub struct ConversationStore {
    tx: Arc<watch::Sender<Conversation>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Conversation::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that is notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Conversation {
        self.tx.borrow().clone()
    }

    /// Appends a finished turn and returns its index.
    ///
    /// Fails with [`ChatError::Busy`] while an assistant turn is streaming,
    /// since the streaming turn must stay last.
    pub fn push(&self, turn: Turn) -> Result<usize, ChatError> {
        self.append(turn, false)
    }

    /// Appends an empty assistant turn and marks it as in progress.
    pub fn begin_assistant(&self) -> Result<usize, ChatError> {
        self.append(Turn::assistant(""), true)
    }

    /// Overwrites the content of the in-progress turn, which is always the
    /// final slot. Returns `false` when nothing is streaming.
    pub fn update_last(&self, content: &str) -> bool {
        self.tx.send_if_modified(|conversation| {
            if conversation.in_progress.is_none() {
                return false;
            }
            *conversation = conversation.with_last_content(content);
            true
        })
    }

    /// Freezes the in-progress turn. Returns `false` when nothing was
    /// streaming.
    pub fn finish(&self) -> bool {
        self.tx
            .send_if_modified(|conversation| conversation.in_progress.take().is_some())
    }

    fn append(&self, turn: Turn, in_progress: bool) -> Result<usize, ChatError> {
        let mut result = Err(ChatError::Busy);
        self.tx.send_if_modified(|conversation| {
            if conversation.in_progress.is_some() {
                return false;
            }
            *conversation = conversation.with_appended(turn, in_progress);
            result = Ok(conversation.len() - 1);
            true
        });
        result
    }
}
