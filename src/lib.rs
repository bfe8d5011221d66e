//! Ollachat is a streaming chat client for Ollama-style model endpoints.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the wire payloads for the model endpoint and the
//!   conversation store.
//! - [`core`] owns session state, the streaming pipeline (byte chunks to
//!   lines to one growing assistant message), persistence, and config.
//! - [`cli`] parses arguments and runs the interactive chat and one-shot
//!   commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which builds a [`core::app::ChatApp`] and
//! drives it from the terminal.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
