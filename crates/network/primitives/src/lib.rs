pub mod client;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod messages;
pub mod stream;
pub mod transport;
pub mod types;
