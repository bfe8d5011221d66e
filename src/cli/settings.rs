//! `ollachat config` subcommands.

use std::error::Error;
use std::path::Path;

use crate::cli::ConfigAction;
use crate::core::config::data::path_display;
use crate::core::config::Config;

pub fn run_config_command(action: ConfigAction) -> Result<(), Box<dyn Error>> {
    let path = Config::config_path()?;
    let message = apply_config_action(&path, action)?;
    println!("{message}");
    Ok(())
}

/// Apply `action` to the file at `path`, returning what to print.
pub fn apply_config_action(path: &Path, action: ConfigAction) -> Result<String, Box<dyn Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_from_path(path)?;
            Ok(config.describe().trim_end().to_string())
        }
        ConfigAction::Path => Ok(path_display(path)),
        ConfigAction::Set { key, value } => {
            let value = value.join(" ");
            let mut config = Config::load_from_path(path)?;
            config.set_value(&key, &value)?;
            config.save_to_path(path)?;
            Ok(format!("✅ Set {key} to: {value}"))
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load_from_path(path)?;
            config.unset_value(&key)?;
            config.save_to_path(path)?;
            Ok(format!("✅ Unset {key}"))
        }
    }
}
