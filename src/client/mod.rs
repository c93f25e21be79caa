//! Client module - access to the remote stack server
//!
//! Provides the inference seam the conversation loop depends on and the
//! HTTP client covering the rest of the stack API surface.

pub mod stack;
pub mod traits;

pub use stack::{
    AgentConfig, Document, ProviderInfo, ShieldResult, ShieldViolation, StackClient, Toolgroup,
    TurnStream,
};
pub use traits::InferenceClient;
