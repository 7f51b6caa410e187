//! Clients for generative services.
//!
//! This crate provides:
//! - The generation job client (submit/poll/download with mock fallback)
//! - The backend model selector and cost estimation
//! - The text service client with a JSON-extraction parser chain

pub mod client;
pub mod error;
pub mod extract;
pub mod selector;
pub mod text;
pub mod types;

pub use client::{GenerationClient, GenerationClientConfig};
pub use error::{GenAiError, GenAiResult};
pub use extract::{extract_json, Extracted};
pub use selector::{CostEstimate, ModelSelector};
pub use text::{TextServiceClient, TextServiceConfig};
pub use types::{ArtifactKind, ClipOutcome, GenerationJob};
