//! Generation Orchestration
//!
//! Turns a fully formed content request into complete text (and optionally a
//! structured value) from an external generative service. Leaves first: failure
//! classification, single-model invocation, candidate fallback, output extraction,
//! segmented continuation, schema validation, and the orchestrator that ties them
//! together.

pub mod classify;
pub mod extract;
pub mod invoker;
pub mod orchestrator;
pub mod package;
pub mod request;
pub mod schema;
pub mod segments;
pub mod selector;

pub use classify::{classify, FailureKind};
pub use invoker::{CompletionInvoker, InvokeError, InvokePolicy};
pub use orchestrator::GenerationOrchestrator;
pub use package::{generate_package, PackageOutcome, PackagePiece, PackageReport};
pub use request::{
    AttemptOutcome, AttemptRecord, Completeness, GenerationRequest, GenerationResult,
    OptionalParams, OutputSchema,
};
pub use schema::{SchemaOutcome, SCHEMA_FALLBACK_NOTE};
pub use selector::{ModelCandidateSelector, Selection};
