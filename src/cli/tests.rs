use super::chat::{parse_command, render_message, DeltaPrinter, ReplCommand};
use super::conversation_list::format_conversation_row;
use super::settings::apply_config_action;
use super::*;
use crate::core::message::{Attachment, Conversation, Message, Reaction};
use tempfile::TempDir;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn chat_is_the_default_command() {
    let args = parse_args(&["ollachat"]);
    assert!(args.command.is_none());
    let args = parse_args(&["ollachat", "chat", "-m", "qwen2.5:7b"]);
    assert!(matches!(args.command, Some(Commands::Chat)));
    assert_eq!(args.model.as_deref(), Some("qwen2.5:7b"));
}

#[test]
fn say_collects_the_whole_prompt() {
    let args = parse_args(&["ollachat", "say", "why", "is", "the", "sky", "-blue"]);
    match args.command {
        Some(Commands::Say { prompt }) => assert_eq!(prompt.join(" "), "why is the sky -blue"),
        _ => panic!("expected say"),
    }
    assert!(Args::try_parse_from(["ollachat", "say"]).is_err());
}

#[test]
fn store_flag_parses_kinds() {
    let args = parse_args(&["ollachat", "--store", "memory", "conversations"]);
    assert_eq!(args.store, Some(StoreKind::Memory));
    assert!(Args::try_parse_from(["ollachat", "--store", "sqlite"]).is_err());
}

#[test]
fn config_subcommands_parse() {
    let args = parse_args(&["ollachat", "config", "set", "default-model", "llama3.2:3b"]);
    match args.command {
        Some(Commands::Config { action }) => assert_eq!(
            action,
            Some(ConfigAction::Set {
                key: "default-model".into(),
                value: vec!["llama3.2:3b".into()],
            })
        ),
        _ => panic!("expected config set"),
    }
    let args = parse_args(&["ollachat", "config"]);
    assert!(matches!(args.command, Some(Commands::Config { action: None })));
}

#[test]
fn flags_override_config_file() {
    let mut config = Config::default();
    config.set_value("default-model", "from-file").unwrap();
    config.set_value("store", "memory").unwrap();

    let args = parse_args(&["ollachat", "--model-url", "http://gpu:11434/api"]);
    let settings = RuntimeSettings::resolve(&args, &config);
    assert_eq!(settings.model_base_url, "http://gpu:11434/api");
    assert_eq!(settings.store_base_url, "http://localhost:4321/api");
    assert_eq!(settings.model, "from-file");
    assert_eq!(settings.store, StoreKind::Memory);

    let args = parse_args(&["ollachat", "-m", "flag-model", "--store", "http"]);
    let settings = RuntimeSettings::resolve(&args, &config);
    assert_eq!(settings.model, "flag-model");
    assert_eq!(settings.store, StoreKind::Http);
}

#[test]
fn config_actions_edit_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("config.toml");

    let message = apply_config_action(
        &path,
        ConfigAction::Set {
            key: "store".into(),
            value: vec!["memory".into()],
        },
    )
    .unwrap();
    assert!(message.contains("store"));
    assert_eq!(
        Config::load_from_path(&path).unwrap().store_kind(),
        StoreKind::Memory
    );

    let shown = apply_config_action(&path, ConfigAction::Show).unwrap();
    assert!(shown.contains("store: memory"));

    apply_config_action(&path, ConfigAction::Unset { key: "store".into() }).unwrap();
    assert_eq!(Config::load_from_path(&path).unwrap().store, None);

    assert!(apply_config_action(
        &path,
        ConfigAction::Set {
            key: "colour".into(),
            value: vec!["blue".into()],
        },
    )
    .is_err());
}

#[test]
fn repl_commands_parse() {
    assert_eq!(parse_command("  hello there "), ReplCommand::Send("hello there".into()));
    assert_eq!(parse_command("   "), ReplCommand::Noop);
    assert_eq!(parse_command("/new"), ReplCommand::New);
    assert_eq!(parse_command("/switch 2"), ReplCommand::Switch(1));
    assert_eq!(
        parse_command("/up 3"),
        ReplCommand::React(2, Reaction::Upvote)
    );
    assert_eq!(
        parse_command("/down 1"),
        ReplCommand::React(0, Reaction::Downvote)
    );
    assert_eq!(
        parse_command("/attach ~/Pictures/cat one.png"),
        ReplCommand::Attach("~/Pictures/cat one.png".into())
    );
    assert_eq!(parse_command("/model llama3.2:1b"), ReplCommand::Model("llama3.2:1b".into()));
    assert_eq!(parse_command("/exit"), ReplCommand::Quit);
    assert!(matches!(parse_command("/switch 0"), ReplCommand::Invalid(_)));
    assert!(matches!(parse_command("/copy x"), ReplCommand::Invalid(_)));
    assert!(matches!(parse_command("/attach"), ReplCommand::Invalid(_)));
    assert!(matches!(parse_command("/dance"), ReplCommand::Invalid(_)));
}

#[test]
fn delta_printer_prints_only_new_text() {
    let mut printer = DeltaPrinter::default();
    assert_eq!(printer.delta("m1", "Hel"), "Hel");
    assert_eq!(printer.delta("m1", "Hello"), "lo");
    assert_eq!(printer.delta("m1", "Hello!"), "!");
    assert_eq!(printer.delta("m1", "⚠️ Failed"), "\n⚠️ Failed");
    assert_eq!(printer.delta("m2", "Hi"), "Hi");
}

#[test]
fn rendered_messages_show_reactions_and_attachments() {
    let mut message = Message::user("c1", "look").with_attachments(vec![Attachment {
        id: "a1".into(),
        name: "cat.png".into(),
        mime_type: "image/png".into(),
        size: 2048,
        preview: String::new(),
    }]);
    message.reaction = Some(Reaction::Upvote);

    let rendered = render_message(0, &message, true);
    assert!(rendered.starts_with("[1] You: look  👍  (copied)"));
    assert!(rendered.contains("📎 cat.png (image/png, 2.0 KB)"));
}

#[test]
fn conversation_rows_skip_empty_fields() {
    let conversation = Conversation {
        id: "c1".into(),
        title: "Chat 2".into(),
        preview: "New conversation started.".into(),
        timestamp: String::new(),
    };
    assert_eq!(
        format_conversation_row(0, &conversation),
        "  1. Chat 2: New conversation started."
    );
}

#[test]
fn long_version_lists_build_metadata() {
    let err = match Args::try_parse_from(["ollachat", "--version"]) {
        Ok(_) => panic!("--version should short-circuit parsing"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    for label in ["commit: ", "built: ", "target: ", "rustc: "] {
        assert!(LONG_VERSION.contains(label), "missing {label:?}");
    }
    assert!(LONG_VERSION.starts_with(env!("CARGO_PKG_VERSION")));
}
