//! Quill: Generation Orchestration Engine
//!
//! Turns fully formed content requests into complete, well-formed text or structured
//! output from an external generative-text service, despite inconsistent response
//! shapes, per-model parameter support, output-length limits and intermittent
//! unavailability.

pub mod cli;
pub mod config;
pub mod error;
pub mod formats;
pub mod generation;
pub mod logging;
pub mod provider;

pub use error::{CallError, GenerationError};
pub use generation::{GenerationOrchestrator, GenerationRequest, GenerationResult};
