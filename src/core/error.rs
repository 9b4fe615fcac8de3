use std::error::Error as StdError;
use std::fmt;

use crate::core::chat_stream::TransportError;

/// Failures of a chat submission.
#[derive(Debug)]
pub enum ChatError {
    /// No credential was supplied; nothing was sent or appended.
    MissingCredential,

    /// Another submission is still streaming; nothing was sent or appended.
    Busy,

    /// The backend could not be reached, answered with a non-2xx status, or
    /// dropped the connection mid-stream.
    TransportFailure(TransportError),

    /// The backend answered successfully but without a readable body.
    StreamUnavailable,
}

impl ChatError {
    /// Whether the failure was recorded in the conversation as an
    /// assistant turn.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            ChatError::TransportFailure(_) | ChatError::StreamUnavailable
        )
    }
}

impl From<TransportError> for ChatError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::BodyUnavailable { .. } => ChatError::StreamUnavailable,
            other => ChatError::TransportFailure(other),
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingCredential => write!(f, "No API key has been entered"),
            ChatError::Busy => write!(f, "A reply is still streaming"),
            ChatError::TransportFailure(source) => write!(f, "Transport failure: {source}"),
            ChatError::StreamUnavailable => write!(f, "Response body is not readable"),
        }
    }
}

impl StdError for ChatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ChatError::TransportFailure(source) => Some(source),
            _ => None,
        }
    }
}
