//! Terminal presentation for chat sessions.
//!
//! This layer only reads state published by [`crate::core`]:
//! - [`transcript`]: turns conversation snapshots into incremental text.
//! - [`chat_loop`]: the interactive loop that reads lines, forwards them to
//!   [`crate::core::controller::ChatController`] and prints the transcript.

pub mod chat_loop;
pub mod transcript;
