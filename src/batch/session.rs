use crate::{
    dedup::DuplicateFilter,
    error::{BenchError, Result},
    models::{
        BatchOutcome, BatchProgress, BatchReport, BatchSummary, GenerationResult,
        MAX_REPORTED_ERRORS,
    },
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What a single attempt did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Accepted,
    Duplicate,
    Transient,
    Failed,
    /// Credentials rejected; the batch must stop.
    Fatal(String),
}

/// Mutable state of one batch. Owned by the orchestrator for the batch's lifetime.
#[derive(Debug)]
pub(crate) struct BatchSession {
    target_count: usize,
    max_attempts: usize,
    filter: DuplicateFilter,
    accepted: Vec<GenerationResult>,
    attempts: usize,
    duplicates: usize,
    transient_errors: usize,
    generation_errors: usize,
    invalid_images: usize,
    errors: Vec<String>,
}

impl BatchSession {
    pub(crate) fn new(target_count: usize, max_attempts: usize) -> Self {
        Self {
            target_count,
            max_attempts,
            filter: DuplicateFilter::new(),
            accepted: Vec::with_capacity(target_count),
            attempts: 0,
            duplicates: 0,
            transient_errors: 0,
            generation_errors: 0,
            invalid_images: 0,
            errors: Vec::new(),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.accepted.len() >= self.target_count
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts
    }

    /// Calls the next wave may issue without overshooting the target or the budget.
    pub(crate) fn next_wave_size(&self, max_in_flight: usize) -> usize {
        let still_needed = self.target_count.saturating_sub(self.accepted.len());
        let budget_left = self.max_attempts.saturating_sub(self.attempts);
        max_in_flight.max(1).min(still_needed).min(budget_left)
    }

    pub(crate) fn apply(&mut self, result: Result<GenerationResult>) -> AttemptOutcome {
        self.attempts += 1;

        match result {
            Ok(result) => {
                debug_assert!(!self.is_complete(), "attempt issued after the target was met");
                if self.filter.is_duplicate(&result.fingerprint) {
                    self.duplicates += 1;
                    log::debug!(
                        "Attempt {}: duplicate image {} discarded",
                        self.attempts,
                        result.fingerprint
                    );
                    AttemptOutcome::Duplicate
                } else {
                    self.filter.record(result.fingerprint);
                    log::debug!(
                        "Attempt {}: accepted image {} ({}/{})",
                        self.attempts,
                        result.fingerprint,
                        self.accepted.len() + 1,
                        self.target_count
                    );
                    self.accepted.push(result);
                    AttemptOutcome::Accepted
                }
            }
            Err(BenchError::Auth(message)) => {
                log::error!("Attempt {}: authentication rejected: {}", self.attempts, message);
                self.note_error(format!("Authentication error: {}", message));
                AttemptOutcome::Fatal(message)
            }
            Err(err @ BenchError::Transient(_)) => {
                self.transient_errors += 1;
                log::warn!("Attempt {}: {}", self.attempts, err);
                self.note_error(err.to_string());
                AttemptOutcome::Transient
            }
            Err(err @ BenchError::InvalidImage(_)) => {
                self.invalid_images += 1;
                log::warn!("Attempt {}: {}", self.attempts, err);
                self.note_error(err.to_string());
                AttemptOutcome::Failed
            }
            Err(err) => {
                self.generation_errors += 1;
                log::warn!("Attempt {}: {}", self.attempts, err);
                self.note_error(err.to_string());
                AttemptOutcome::Failed
            }
        }
    }

    pub(crate) fn progress(&self) -> BatchProgress {
        BatchProgress {
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            accepted: self.accepted.len(),
            target_count: self.target_count,
        }
    }

    pub(crate) fn finish(
        self,
        batch_id: Uuid,
        started_at: DateTime<Utc>,
        outcome: BatchOutcome,
    ) -> BatchReport {
        let summary = BatchSummary {
            batch_id,
            target_count: self.target_count,
            accepted: self.accepted.len(),
            attempts_used: self.attempts,
            max_attempts: self.max_attempts,
            duplicates: self.duplicates,
            transient_errors: self.transient_errors,
            generation_errors: self.generation_errors,
            invalid_images: self.invalid_images,
            errors: self.errors,
            started_at,
            finished_at: Utc::now(),
        };

        BatchReport {
            outcome,
            results: self.accepted,
            summary,
        }
    }

    fn note_error(&mut self, message: String) {
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationRequest;
    use std::sync::Arc;

    fn image(bytes: &[u8]) -> Result<GenerationResult> {
        let request = Arc::new(GenerationRequest::new(Some("ring".into()), None, None).unwrap());
        GenerationResult::from_bytes(bytes.to_vec(), "image/jpeg", request)
    }

    #[test]
    fn test_duplicates_use_budget_but_not_target() {
        let mut session = BatchSession::new(2, 4);
        assert_eq!(session.apply(image(b"a")), AttemptOutcome::Accepted);
        assert_eq!(session.apply(image(b"a")), AttemptOutcome::Duplicate);
        assert_eq!(session.attempts(), 2);
        assert!(!session.is_complete());
        assert_eq!(session.apply(image(b"b")), AttemptOutcome::Accepted);
        assert!(session.is_complete());
    }

    #[test]
    fn test_wave_size_respects_target_and_budget() {
        let mut session = BatchSession::new(3, 5);
        assert_eq!(session.next_wave_size(10), 3);
        session.apply(image(b"a"));
        session.apply(image(b"a"));
        session.apply(image(b"a"));
        assert_eq!(session.next_wave_size(10), 2);
        assert_eq!(session.next_wave_size(1), 1);
        assert_eq!(session.next_wave_size(0), 1);
    }

    #[test]
    fn test_completed_session_issues_no_more_calls() {
        let mut session = BatchSession::new(2, 10);
        session.apply(image(b"a"));
        session.apply(image(b"b"));
        assert!(session.is_complete());
        assert_eq!(session.next_wave_size(5), 0);

        let report = session.finish(Uuid::new_v4(), Utc::now(), BatchOutcome::Succeeded);
        assert_eq!(report.summary.duplicates, 0);
        assert_eq!(report.results.len(), 2);
    }

    #[test]
    fn test_errors_are_classified_and_capped() {
        let mut session = BatchSession::new(1, 100);
        for _ in 0..30 {
            session.apply(Err(BenchError::Generation("boom".into())));
        }
        session.apply(Err(BenchError::Transient("429".into())));
        session.apply(image(b""));
        assert_eq!(
            session.apply(Err(BenchError::Auth("401".into()))),
            AttemptOutcome::Fatal("401".into())
        );

        let report = session.finish(Uuid::new_v4(), Utc::now(), BatchOutcome::PartiallySucceeded);
        assert_eq!(report.summary.generation_errors, 30);
        assert_eq!(report.summary.transient_errors, 1);
        assert_eq!(report.summary.invalid_images, 1);
        assert_eq!(report.summary.attempts_used, 33);
        assert_eq!(report.summary.errors.len(), MAX_REPORTED_ERRORS);
    }
}
