// mistly-api: Async Rust client for the organization inventory API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::MistClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
