//! Line-oriented interactive chat.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::cli::RuntimeSettings;
use crate::core::app::{ChatApp, IgnoreReason, SessionEvent, SubmitOutcome};
use crate::core::attachments::SelectedFile;
use crate::core::message::{Attachment, Message, Reaction};
use crate::utils::text::format_file_size;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Send(String),
    New,
    List,
    Show,
    Switch(usize),
    Attach(PathBuf),
    Detach(usize),
    ClearAttachments,
    React(usize, Reaction),
    Copy(usize),
    Models,
    Model(String),
    Help,
    Quit,
    /// Nothing to do (blank line).
    Noop,
    Invalid(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /new               Start a new conversation
  /list              List conversations (* marks the active one)
  /show              Print the active transcript
  /switch <n>        Switch to conversation n
  /attach <path>     Stage an image for the next message
  /detach <n>        Remove staged attachment n
  /clear-attachments Remove every staged attachment
  /up <n>, /down <n> Toggle a reaction on message n
  /copy <n>          Copy message n to the clipboard
  /models            Refresh and list models
  /model <id>        Use model <id>
  /help              Show this help
  /quit              Leave the chat";

fn parse_index(name: &str, argument: &str) -> Result<usize, ReplCommand> {
    match argument.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(ReplCommand::Invalid(format!("Usage: /{name} <n> (n starts at 1)"))),
    }
}

/// Interpret one input line. Numbers in commands are 1-based.
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Noop;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Send(line.to_string());
    };

    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    let indexed = |build: fn(usize) -> ReplCommand| match parse_index(name, argument) {
        Ok(index) => build(index),
        Err(invalid) => invalid,
    };

    match name {
        "new" => ReplCommand::New,
        "list" => ReplCommand::List,
        "show" => ReplCommand::Show,
        "switch" => indexed(ReplCommand::Switch),
        "attach" if !argument.is_empty() => ReplCommand::Attach(PathBuf::from(argument)),
        "attach" => ReplCommand::Invalid("Usage: /attach <path>".to_string()),
        "detach" => indexed(ReplCommand::Detach),
        "clear-attachments" => ReplCommand::ClearAttachments,
        "up" => indexed(|index| ReplCommand::React(index, Reaction::Upvote)),
        "down" => indexed(|index| ReplCommand::React(index, Reaction::Downvote)),
        "copy" => indexed(ReplCommand::Copy),
        "models" => ReplCommand::Models,
        "model" if !argument.is_empty() => ReplCommand::Model(argument.to_string()),
        "model" => ReplCommand::Invalid("Usage: /model <id>".to_string()),
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("Unknown command /{other}. Try /help.")),
    }
}

/// One transcript entry as printed by `/show` and `/switch`.
pub fn render_message(index: usize, message: &Message, copied: bool) -> String {
    let mut out = format!("[{}] {}: {}", index + 1, message.name, message.content);
    match message.reaction {
        Some(Reaction::Upvote) => out.push_str("  👍"),
        Some(Reaction::Downvote) => out.push_str("  👎"),
        None => {}
    }
    if copied {
        out.push_str("  (copied)");
    }
    for attachment in message.attachments.iter().flatten() {
        out.push_str(&format!("\n    📎 {}", describe_attachment(attachment)));
    }
    out
}

pub fn describe_attachment(attachment: &Attachment) -> String {
    format!(
        "{} ({}, {})",
        attachment.name,
        attachment.mime_type,
        format_file_size(attachment.size)
    )
}

/// Turns successive content snapshots of one message into the text that
/// still has to be printed.
#[derive(Debug, Default)]
pub struct DeltaPrinter {
    message_id: Option<String>,
    shown: String,
}

impl DeltaPrinter {
    pub fn delta(&mut self, message_id: &str, content: &str) -> String {
        if self.message_id.as_deref() != Some(message_id) {
            self.message_id = Some(message_id.to_string());
            self.shown.clear();
        }
        let delta = match content.strip_prefix(self.shown.as_str()) {
            Some(rest) => rest.to_string(),
            // Content was replaced (failed request); start a fresh line.
            None => format!("\n{content}"),
        };
        self.shown.clear();
        self.shown.push_str(content);
        delta
    }
}

async fn print_transcript(app: &ChatApp) {
    let state = app.snapshot().await;
    println!("── {} ──", state.active_title());
    for (index, message) in state.active_messages().iter().enumerate() {
        let copied = state.copied_message_id.as_deref() == Some(message.id.as_str());
        println!("{}", render_message(index, message, copied));
    }
}

fn spawn_event_printer(app: ChatApp, mut events: UnboundedReceiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut printer = DeltaPrinter::default();
        while let Some(event) = events.recv().await {
            let active = app
                .session()
                .read(|state| state.active_conversation_id.clone())
                .await;
            match event {
                SessionEvent::MessageAppended {
                    conversation_id,
                    message_id,
                } if conversation_id == active => {
                    let message = app
                        .session()
                        .read(|state| state.find_message(&conversation_id, &message_id).cloned())
                        .await;
                    if let Some(message) = message.filter(Message::is_assistant) {
                        print!("{}: {}", message.name, message.content);
                        printer.delta(&message.id, &message.content);
                        let _ = io::stdout().flush();
                    }
                }
                SessionEvent::MessageUpdated {
                    conversation_id,
                    message_id,
                    content,
                } if conversation_id == active => {
                    print!("{}", printer.delta(&message_id, &content));
                    let _ = io::stdout().flush();
                }
                SessionEvent::GenerationFinished { conversation_id, .. } if conversation_id == active => {
                    println!();
                }
                SessionEvent::CopiedChanged(Some(_)) => println!("📋 Copied."),
                _ => {}
            }
        }
    })
}

fn report_outcome(handle: JoinHandle<SubmitOutcome>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match handle.await {
            Ok(SubmitOutcome::Ignored(IgnoreReason::Busy)) => {
                eprintln!("⏳ Still answering in this conversation; try again when it finishes.")
            }
            Ok(SubmitOutcome::Failed { error, .. }) => tracing::debug!(%error, "turn failed"),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "submit task panicked"),
        }
    })
}

pub async fn run_chat(settings: &RuntimeSettings) -> Result<(), Box<dyn Error>> {
    let store = settings.build_store(&reqwest::Client::new());
    let (app, events) = settings.build_app(store);
    app.refresh_models().await;
    app.load_initial().await;

    let printer = spawn_event_printer(app.clone(), events);
    let mut turns: Vec<JoinHandle<()>> = Vec::new();

    println!(
        "💬 ollachat, model {}. Type /help for commands.",
        app.snapshot().await.selected_model
    );
    print_transcript(&app).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            ReplCommand::Noop => {}
            ReplCommand::Send(text) => {
                let attachments = app.snapshot().await.attachments;
                turns.retain(|turn| !turn.is_finished());
                turns.push(report_outcome(app.spawn_submit(text, attachments)));
            }
            ReplCommand::New => {
                let conversation = app.new_conversation().await;
                print_transcript_for(&app, &conversation.title).await;
            }
            ReplCommand::List => {
                let state = app.snapshot().await;
                for (index, conversation) in state.conversations.iter().enumerate() {
                    let marker = if conversation.id == state.active_conversation_id {
                        "*"
                    } else {
                        " "
                    };
                    let busy = if state.is_generating_for(&conversation.id) {
                        " (answering)"
                    } else {
                        ""
                    };
                    println!(
                        "{marker}{}{busy}",
                        crate::cli::conversation_list::format_conversation_row(index, conversation)
                    );
                }
            }
            ReplCommand::Show => print_transcript(&app).await,
            ReplCommand::Switch(index) => {
                let target = app
                    .snapshot()
                    .await
                    .conversations
                    .get(index)
                    .map(|c| c.id.clone());
                match target {
                    Some(id) => {
                        app.select_conversation(&id).await;
                        print_transcript(&app).await;
                    }
                    None => eprintln!("No conversation {}.", index + 1),
                }
            }
            ReplCommand::Attach(path) => match SelectedFile::from_path(&path).await {
                Ok(file) => {
                    let staged = app.stage_files(vec![file]).await;
                    match staged.first() {
                        Some(attachment) => {
                            println!("📎 Staged {}", describe_attachment(attachment))
                        }
                        None => eprintln!("Only images can be attached."),
                    }
                }
                Err(err) => eprintln!("❌ Could not read {}: {err}", path.display()),
            },
            ReplCommand::Detach(index) => {
                let target = app
                    .snapshot()
                    .await
                    .attachments
                    .get(index)
                    .map(|a| a.id.clone());
                match target {
                    Some(id) => {
                        app.remove_attachment(&id).await;
                    }
                    None => eprintln!("No attachment {}.", index + 1),
                }
            }
            ReplCommand::ClearAttachments => app.clear_attachments().await,
            ReplCommand::React(index, kind) => {
                let target = app
                    .active_messages()
                    .await
                    .get(index)
                    .map(|m| m.id.clone());
                match target {
                    Some(id) => {
                        app.toggle_reaction(&id, kind).await;
                    }
                    None => eprintln!("No message {}.", index + 1),
                }
            }
            ReplCommand::Copy(index) => {
                let target = app
                    .active_messages()
                    .await
                    .get(index)
                    .map(|m| m.id.clone());
                match target {
                    Some(id) => {
                        if !app.copy_message(&id).await {
                            eprintln!("❌ Copy failed.");
                        }
                    }
                    None => eprintln!("No message {}.", index + 1),
                }
            }
            ReplCommand::Models => {
                let models = app.refresh_models().await;
                let selected = app.snapshot().await.selected_model;
                for model in models {
                    let marker = if model == selected { "*" } else { " " };
                    println!("{marker} {model}");
                }
            }
            ReplCommand::Model(model) => {
                println!("Using model {model}.");
                app.select_model(model).await;
            }
            ReplCommand::Help => println!("{HELP_TEXT}"),
            ReplCommand::Quit => break,
            ReplCommand::Invalid(message) => eprintln!("{message}"),
        }
    }

    if turns.iter().any(|turn| !turn.is_finished()) {
        eprintln!("Waiting for replies in progress…");
    }
    for turn in turns {
        let _ = turn.await;
    }
    app.persister().flush().await;
    printer.abort();
    Ok(())
}

async fn print_transcript_for(app: &ChatApp, title: &str) {
    println!("✨ Started {title}.");
    print_transcript(app).await;
}
