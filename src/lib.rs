//! Bulk jewelry variation generation on top of Flux image models.
//!
//! A batch issues repeated generation calls for one prompt and/or reference image,
//! discards exact duplicates by content fingerprint, stops at the requested count or the
//! attempt budget, and packages the survivors into a zip archive.

pub mod archive;
pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod logger;
pub mod models;

#[cfg(feature = "server")]
pub mod server;

pub use batch::{BatchOrchestrator, CancelHandle};
pub use config::{BatchSettings, Config, FalConfig};
pub use dedup::DuplicateFilter;
pub use error::{BenchError, Result};
pub use generation::{FalClient, GenerationClient};
pub use hashing::{fingerprint, Fingerprint};
pub use models::{
    AbortReason, BatchInput, BatchOutcome, BatchProgress, BatchReport, BatchSize, BatchSummary,
    GenerationRequest, GenerationResult, ReferenceImage, ANGLE_HINT,
};
