//! Byte-chunk to text decoding for streamed replies.

use std::error::Error as StdError;
use std::fmt;

/// A chunk (or the end of the stream) could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes contain a sequence that is not UTF-8. The whole chunk is
    /// discarded.
    InvalidUtf8 { valid_up_to: usize, len: usize },

    /// The stream ended in the middle of a multi-byte character.
    Truncated { pending: usize },

    /// A character started at the end of one chunk was not continued by the
    /// next. Only the carried bytes are dropped.
    Interrupted { dropped: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidUtf8 { valid_up_to, len } => write!(
                f,
                "invalid UTF-8 after {valid_up_to} of {len} bytes"
            ),
            DecodeError::Truncated { pending } => write!(
                f,
                "stream ended inside a multi-byte character ({pending} bytes dropped)"
            ),
            DecodeError::Interrupted { dropped } => write!(
                f,
                "multi-byte character not continued by the next chunk ({dropped} bytes dropped)"
            ),
        }
    }
}

impl StdError for DecodeError {}

/// Streaming UTF-8 decoder.
///
/// A character split across two chunks is held back until the rest of it
/// arrives, so chunk boundaries never corrupt text.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
    interrupted: Option<DecodeError>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one chunk. On error nothing from this chunk is kept and the
    /// decoder is ready for the next one.
    ///
    /// Carried bytes that `chunk` does not continue are dropped on their own
    /// and the chunk is decoded by itself; [`Self::take_interrupted`] reports
    /// the loss.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        let carried = self.pending.len();
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        if carried > 0 {
            if let Err(err) = std::str::from_utf8(&bytes) {
                if err.error_len().is_some() && err.valid_up_to() < carried {
                    self.interrupted = Some(DecodeError::Interrupted { dropped: carried });
                    return self.decode(chunk);
                }
            }
        }

        let err = match String::from_utf8(bytes) {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        let utf8 = err.utf8_error();
        let valid_up_to = utf8.valid_up_to();
        let mut bytes = err.into_bytes();
        let len = bytes.len();

        if utf8.error_len().is_some() {
            return Err(DecodeError::InvalidUtf8 { valid_up_to, len });
        }

        self.pending = bytes.split_off(valid_up_to);
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { valid_up_to, len })
    }

    /// Takes the report of carried bytes dropped by the last `decode`, if any.
    pub fn take_interrupted(&mut self) -> Option<DecodeError> {
        self.interrupted.take()
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Flushes the decoder at end of stream.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        let pending = std::mem::take(&mut self.pending).len();
        if pending == 0 {
            Ok(())
        } else {
            Err(DecodeError::Truncated { pending })
        }
    }
}
