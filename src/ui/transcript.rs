//! Incremental plain-text rendering of conversation snapshots.

use crate::core::conversation::Conversation;
use crate::core::message::Role;

const USER_PREFIX: &str = "You: ";

/// Turns successive [`Conversation`] snapshots into the text that still has
/// to be written to the terminal.
///
/// The renderer never reads anything but the snapshots it is handed, so it
/// can lag behind the store without missing text.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    echo_user: bool,
    cursor: usize,
    open: bool,
    shown: String,
}

impl TranscriptRenderer {
    /// `echo_user` controls whether user turns are printed. Interactive
    /// sessions leave it off because the terminal already shows the typed
    /// line.
    pub fn new(echo_user: bool) -> Self {
        Self {
            echo_user,
            ..Self::default()
        }
    }

    /// Whether a turn has been started but not yet terminated.
    pub fn is_mid_turn(&self) -> bool {
        self.open
    }

    pub fn render(&mut self, conversation: &Conversation) -> String {
        let mut out = String::new();

        while let Some(turn) = conversation.get(self.cursor) {
            let visible = turn.role == Role::Assistant || self.echo_user;
            let streaming = conversation.in_progress() == Some(self.cursor);

            if visible {
                if !self.open {
                    if turn.role == Role::User {
                        out.push_str(USER_PREFIX);
                    }
                    self.open = true;
                    self.shown.clear();
                }

                match turn.content.strip_prefix(self.shown.as_str()) {
                    Some(rest) => out.push_str(rest),
                    None => {
                        // content was replaced rather than extended
                        out.push('\n');
                        out.push_str(&turn.content);
                    }
                }
                self.shown.clone_from(&turn.content);
            }

            if streaming {
                break;
            }

            if visible {
                out.push_str("\n\n");
            }
            self.cursor += 1;
            self.open = false;
            self.shown.clear();
        }

        out
    }
}
