//! Line-oriented interactive session.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::core::chat_stream::Transport;
use crate::core::controller::{ChatController, SubmitOutcome};
use crate::core::error::ChatError;
use crate::ui::transcript::TranscriptRenderer;

type Submission = JoinHandle<Result<SubmitOutcome, ChatError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Empty,
    Quit,
    Cancel,
    Help,
    Key(Option<&'a str>),
    Message(&'a str),
    UnknownCommand(&'a str),
}

pub fn parse_input(line: &str) -> ChatInput<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Message(line);
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => ChatInput::Quit,
        "cancel" => ChatInput::Cancel,
        "help" => ChatInput::Help,
        "key" => ChatInput::Key(Some(rest).filter(|key| !key.is_empty())),
        _ => ChatInput::UnknownCommand(name),
    }
}

fn print_help() {
    println!("Type a question and press Enter to send it.");
    println!("  /key <KEY>   set the API key for this session");
    println!("  /cancel      stop the reply that is streaming");
    println!("  /quit        leave (Ctrl+D works too)");
    println!("Ctrl+C cancels a streaming reply, or quits when idle.");
}

fn write_out(text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

async fn join_submission(pending: &mut Option<Submission>) -> Result<Result<SubmitOutcome, ChatError>, JoinError> {
    match pending.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn report_submission(result: Result<SubmitOutcome, ChatError>) {
    match result {
        Ok(SubmitOutcome::Completed(summary)) => {
            debug!(chunks = summary.chunks, bytes = summary.bytes, "Reply finished");
        }
        // already visible as an assistant turn
        Ok(SubmitOutcome::Failed(_)) => {}
        Ok(SubmitOutcome::Cancelled(_)) => println!("(reply cancelled)\n"),
        Err(ChatError::MissingCredential) => {
            println!("🔑 Please enter your API key first: /key <KEY>");
        }
        Err(err) => println!("⚠️  {err}"),
    }
}

/// Waits for a submission still running at shutdown. A panicked or aborted
/// task is logged rather than propagated.
async fn drain_submission(
    pending: Option<Submission>,
) -> Option<Result<SubmitOutcome, ChatError>> {
    match pending?.await {
        Ok(result) => {
            debug!(?result, "Submission finished during shutdown");
            Some(result)
        }
        Err(err) => {
            warn!(error = %err, "Submission task failed during shutdown");
            None
        }
    }
}

/// Runs the interactive session until `/quit`, end of input or Ctrl+C while
/// idle.
pub async fn run_chat<T>(transport: T, api_key: Option<String>) -> Result<(), Box<dyn Error>>
where
    T: Transport + 'static,
{
    let controller = Arc::new(ChatController::new(transport));
    let mut conversation = controller.subscribe();
    let mut renderer = TranscriptRenderer::new(false);
    let mut credential = api_key.unwrap_or_default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<Submission> = None;

    println!("ragchat: ask questions about your indexed documents. /help for commands.");
    if credential.is_empty() {
        println!("🔑 No API key yet. Enter one with /key <KEY>.");
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    ChatInput::Empty => {}
                    ChatInput::Quit => break,
                    ChatInput::Help => print_help(),
                    ChatInput::Cancel => {
                        if !controller.cancel() {
                            println!("Nothing to cancel.");
                        }
                    }
                    ChatInput::Key(Some(key)) => {
                        credential = key.to_string();
                        println!("🔑 API key set.");
                    }
                    ChatInput::Key(None) => println!("Usage: /key <KEY>"),
                    ChatInput::UnknownCommand(name) => println!("Unknown command: /{name}"),
                    ChatInput::Message(text) => {
                        if pending.is_some() || controller.is_loading() {
                            println!("⏳ Still answering. Use /cancel to stop the current reply.");
                            continue;
                        }
                        let controller = Arc::clone(&controller);
                        let text = text.to_string();
                        let key = credential.clone();
                        pending = Some(tokio::spawn(async move {
                            controller.submit(&text, &key).await
                        }));
                    }
                }
            }
            changed = conversation.changed() => {
                if changed.is_err() {
                    break;
                }
                let update = renderer.render(&conversation.borrow_and_update());
                write_out(&update)?;
            }
            joined = join_submission(&mut pending) => {
                pending = None;
                let update = renderer.render(&conversation.borrow_and_update());
                write_out(&update)?;
                report_submission(joined?);
            }
            _ = tokio::signal::ctrl_c() => {
                if !controller.cancel() {
                    break;
                }
            }
        }
    }

    controller.cancel();
    drain_submission(pending.take()).await;
    if renderer.is_mid_turn() {
        println!();
    }
    Ok(())
}
