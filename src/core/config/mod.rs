pub mod data;
pub mod io;
pub mod printing;

pub use data::{Config, StoreKind, DEFAULT_MODEL_BASE_URL, DEFAULT_STORE_BASE_URL};
pub use io::ConfigError;

#[cfg(test)]
mod tests;
