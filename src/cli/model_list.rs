//! Model listing

use std::error::Error;

use crate::api::models::{fetch_models, DEFAULT_MODEL};
use crate::cli::RuntimeSettings;

pub async fn list_models(settings: &RuntimeSettings) -> Result<(), Box<dyn Error>> {
    println!("🤖 Available models at {}", settings.model_base_url);
    println!();

    let client = reqwest::Client::new();
    match fetch_models(&client, &settings.model_base_url).await {
        Ok(models) if models.is_empty() => {
            println!("No models found; chats will use {DEFAULT_MODEL}.");
        }
        Ok(models) => {
            for model in models {
                let marker = if model == settings.model { "*" } else { " " };
                println!("{marker} {model}");
            }
        }
        Err(err) => {
            eprintln!("⚠️  Could not list models: {err}");
            println!("  {DEFAULT_MODEL} (fallback)");
        }
    }
    Ok(())
}
