//! Interactive loop: reads lines, drives the session controller, prints
//! the transcript.

use std::io::Write;

use nyaya_chat::{ChatError, SessionController};
use nyaya_core::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::render;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    /// Regenerate the message at this 1-based position.
    Regenerate(usize),
    /// Print the raw content of the message at this position.
    Copy(usize),
    History,
    Examples,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };
        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("quit" | "exit"), None, None) => Command::Quit,
            (Some("history"), None, None) => Command::History,
            (Some("examples"), None, None) => Command::Examples,
            (Some(cmd @ ("regen" | "copy")), Some(n), None) => match n.parse::<usize>() {
                Ok(n) if n > 0 && cmd == "regen" => Command::Regenerate(n),
                Ok(n) if n > 0 => Command::Copy(n),
                _ => Command::Invalid(format!("not a message number: {}", n)),
            },
            (Some(cmd @ ("regen" | "copy")), _, _) => {
                Command::Invalid(format!("usage: /{} <n>", cmd))
            }
            _ => Command::Invalid(format!("unknown command: {}", line)),
        }
    }
}

/// Run the loop until `/quit` or end of input.
pub async fn run<R, W>(controller: &SessionController, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::History => {
                let transcript = controller.with_store(|s| render::render_transcript(s.messages()));
                writeln!(out, "{}\n", transcript)?;
            }
            Command::Examples => writeln!(out, "{}\n", render::render_examples())?,
            Command::Invalid(reason) => writeln!(out, "{}\n", reason)?,
            Command::Ask(text) => ask(controller, &text, out).await?,
            Command::Regenerate(position) => regenerate(controller, position, out).await?,
            Command::Copy(position) => {
                let content = controller
                    .with_store(|s| s.messages().get(position - 1).map(|m| m.content.clone()));
                match content {
                    Some(text) => writeln!(out, "{}\n", text)?,
                    None => writeln!(out, "no message #{}\n", position)?,
                }
            }
        }
        out.flush()?;
    }
    Ok(())
}

/// Submit one question and print the reply.
pub async fn ask<W: Write>(controller: &SessionController, text: &str, out: &mut W) -> Result<()> {
    controller.set_input(text);

    let submit = controller.submit_input();
    let typing = async {
        tokio::task::yield_now().await;
        if controller.indicators().typing {
            writeln!(out, "Nyaya is typing...")?;
            out.flush()?;
        }
        Ok::<(), std::io::Error>(())
    };
    let (result, shown) = tokio::join!(submit, typing);
    shown?;

    match result {
        Ok(reply_id) => print_message(controller, reply_id, out),
        Err(ChatError::EmptyInput) => Ok(()),
        Err(e) => {
            writeln!(out, "{}\n", e)?;
            Ok(())
        }
    }
}

async fn regenerate<W: Write>(
    controller: &SessionController,
    position: usize,
    out: &mut W,
) -> Result<()> {
    let Some(target) = controller.with_store(|s| s.messages().get(position - 1).map(|m| m.id))
    else {
        writeln!(out, "no message #{}\n", position)?;
        return Ok(());
    };

    match controller.regenerate(target).await {
        Ok(()) => print_message(controller, target, out),
        Err(e) => {
            writeln!(out, "{}\n", e)?;
            Ok(())
        }
    }
}

fn print_message<W: Write>(
    controller: &SessionController,
    id: nyaya_chat::MessageId,
    out: &mut W,
) -> Result<()> {
    let rendered = controller.with_store(|s| {
        let position = s.position(id)?;
        let message = s.get(id)?;
        Some(render::render_message(position + 1, message))
    });
    if let Some(text) = rendered {
        writeln!(out, "{}\n", text)?;
    }
    Ok(())
}
