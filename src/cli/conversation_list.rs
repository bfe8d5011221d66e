//! Conversation listing

use std::error::Error;

use crate::cli::RuntimeSettings;
use crate::core::message::Conversation;

pub fn format_conversation_row(index: usize, conversation: &Conversation) -> String {
    let mut row = format!("{:>3}. {}", index + 1, conversation.title);
    if !conversation.preview.is_empty() {
        row.push_str(&format!(": {}", conversation.preview));
    }
    if !conversation.timestamp.is_empty() {
        row.push_str(&format!(" ({})", conversation.timestamp));
    }
    row
}

pub async fn list_conversations(settings: &RuntimeSettings) -> Result<(), Box<dyn Error>> {
    let store = settings.build_store(&reqwest::Client::new());
    let conversations = store.list_conversations().await?;

    if conversations.is_empty() {
        println!("No conversations stored yet.");
        return Ok(());
    }
    for (index, conversation) in conversations.iter().enumerate() {
        println!("{}", format_conversation_row(index, conversation));
    }
    Ok(())
}
