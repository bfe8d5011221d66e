pub mod app;
pub mod attachments;
pub mod chat_stream;
pub mod config;
pub mod message;
pub mod persist;
pub mod reducer;
pub mod store;
pub mod transport;
