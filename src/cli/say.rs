//! One-shot "say" command

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use crate::cli::chat::DeltaPrinter;
use crate::cli::RuntimeSettings;
use crate::core::app::{SessionEvent, SubmitOutcome};
use crate::core::store::memory::MemoryStore;

pub async fn run_say(settings: &RuntimeSettings, prompt: Vec<String>) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: ollachat say <prompt>".into());
    }

    // One-shot answers are not kept.
    let (app, mut events) = settings.build_app(Arc::new(MemoryStore::new()));
    let turn = app.spawn_submit(prompt, Vec::new());

    let mut printer = DeltaPrinter::default();
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::MessageUpdated {
                message_id,
                content,
                ..
            } => {
                print!("{}", printer.delta(&message_id, &content));
                io::stdout().flush()?;
            }
            SessionEvent::GenerationFinished { .. } => break,
            _ => {}
        }
    }
    println!();

    match turn.await? {
        SubmitOutcome::Failed { error, .. } => Err(format!("❌ Error: {error}").into()),
        _ => Ok(()),
    }
}
