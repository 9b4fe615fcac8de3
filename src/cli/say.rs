//! One-shot "say" command

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use crate::core::chat_stream::Transport;
use crate::core::constants::API_KEY_ENV;
use crate::core::controller::{ChatController, SubmitOutcome};
use crate::core::error::ChatError;
use crate::ui::transcript::TranscriptRenderer;

/// Submits `prompt` and writes the reply to `out` as it streams in.
/// Ctrl+C cancels the reply.
pub async fn stream_reply<T, W>(
    transport: T,
    prompt: String,
    api_key: String,
    out: &mut W,
) -> Result<Result<SubmitOutcome, ChatError>, Box<dyn Error>>
where
    T: Transport + 'static,
    W: Write,
{
    let controller = Arc::new(ChatController::new(transport));
    let mut conversation = controller.subscribe();
    let mut renderer = TranscriptRenderer::new(false);

    let mut task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit(&prompt, &api_key).await })
    };

    let mut held_newlines = 0;
    let result = loop {
        tokio::select! {
            joined = &mut task => break joined?,
            changed = conversation.changed() => {
                if changed.is_err() {
                    break task.await?;
                }
                let update = renderer.render(&conversation.borrow_and_update());
                write_held(out, &update, &mut held_newlines)?;
            }
            _ = tokio::signal::ctrl_c() => {
                controller.cancel();
            }
        }
    };

    let update = renderer.render(&controller.conversation());
    write_held(out, &update, &mut held_newlines)?;
    writeln!(out)?;
    out.flush()?;
    Ok(result)
}

/// Writes `text` but holds back its trailing newlines until more text
/// follows, so the reply ends with exactly one newline.
fn write_held<W: Write>(out: &mut W, text: &str, held: &mut usize) -> io::Result<()> {
    let body = text.trim_end_matches('\n');
    let trailing = text.len() - body.len();
    if body.is_empty() {
        *held += trailing;
        return Ok(());
    }
    out.write_all("\n".repeat(*held).as_bytes())?;
    out.write_all(body.as_bytes())?;
    out.flush()?;
    *held = trailing;
    Ok(())
}

pub async fn run_say<T>(
    transport: T,
    prompt: Vec<String>,
    api_key: Option<String>,
) -> Result<(), Box<dyn Error>>
where
    T: Transport + 'static,
{
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: ragchat say <prompt>");
        std::process::exit(1);
    }

    let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
        eprintln!("❌ No API key. Pass --api-key or set {API_KEY_ENV}.");
        std::process::exit(1);
    };

    let mut stdout = io::stdout();
    match stream_reply(transport, prompt, api_key, &mut stdout).await? {
        Ok(SubmitOutcome::Completed(_)) => Ok(()),
        Ok(SubmitOutcome::Cancelled(_)) => {
            eprintln!("⚠️  Reply cancelled");
            std::process::exit(130);
        }
        Ok(SubmitOutcome::Failed(err)) | Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    }
}
