use crate::models::{BatchSize, GenerationResult, ReferenceImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-attempt error messages kept in a summary.
pub const MAX_REPORTED_ERRORS: usize = 20;

/// Fixed inputs for one batch. Every attempt is built from these unchanged.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub target: BatchSize,
    pub prompt: Option<String>,
    pub reference_image: Option<ReferenceImage>,
}

impl BatchInput {
    pub fn new(target: BatchSize) -> Self {
        Self {
            target,
            prompt: None,
            reference_image: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AbortReason {
    Auth(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BatchOutcome {
    Succeeded,
    /// Attempt budget ran out before the target was reached.
    PartiallySucceeded,
    Aborted(AbortReason),
}

impl BatchOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            BatchOutcome::Succeeded => "succeeded",
            BatchOutcome::PartiallySucceeded => "partially_succeeded",
            BatchOutcome::Aborted(_) => "aborted",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub target_count: usize,
    pub accepted: usize,
    pub attempts_used: usize,
    pub max_attempts: usize,
    pub duplicates: usize,
    pub transient_errors: usize,
    pub generation_errors: usize,
    pub invalid_images: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    /// Wall-clock time between the batch's first call and its report.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub results: Vec<GenerationResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Explanation for anything short of a full success.
    pub fn reason(&self) -> Option<String> {
        match &self.outcome {
            BatchOutcome::Succeeded => None,
            BatchOutcome::PartiallySucceeded => Some(format!(
                "Attempt budget exhausted: {} of {} unique images after {} attempts ({} duplicates, {} failed calls)",
                self.summary.accepted,
                self.summary.target_count,
                self.summary.attempts_used,
                self.summary.duplicates,
                self.summary.transient_errors
                    + self.summary.generation_errors
                    + self.summary.invalid_images,
            )),
            BatchOutcome::Aborted(AbortReason::Auth(message)) => Some(format!(
                "Batch aborted, the generation API rejected the API key: {} ({} images kept)",
                message, self.summary.accepted
            )),
            BatchOutcome::Aborted(AbortReason::Cancelled) => Some(format!(
                "Batch cancelled after {} attempts ({} images kept)",
                self.summary.attempts_used, self.summary.accepted
            )),
        }
    }
}

/// Snapshot handed to progress callbacks after every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub attempts: usize,
    pub max_attempts: usize,
    pub accepted: usize,
    pub target_count: usize,
}

impl BatchProgress {
    pub fn fraction(&self) -> f64 {
        if self.target_count == 0 {
            return 1.0;
        }
        (self.accepted as f64 / self.target_count as f64).min(1.0)
    }
}
