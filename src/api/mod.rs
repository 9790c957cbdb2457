pub mod client;
pub mod error;
pub mod generation;

pub use client::ApiClient;
pub use error::{extract_error_message, ClientError};
pub use generation::{LatestOnly, RequestGeneration, Ticket};
