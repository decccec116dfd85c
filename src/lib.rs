// Keyward — Library root
//
// Re-exports the store, credentials, token, config, CLI and gateway modules.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod store;
pub mod token;

pub use error::{KeywardError, Result};
