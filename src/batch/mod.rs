mod cancel;
mod session;

use crate::{
    config::BatchSettings,
    error::Result,
    generation::GenerationClient,
    logger,
    models::{
        AbortReason, BatchInput, BatchOutcome, BatchProgress, BatchReport, BatchSize,
        GenerationRequest, ReferenceImage,
    },
};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

pub use cancel::CancelHandle;
use session::{AttemptOutcome, BatchSession};

/// Drives one batch: repeated generation calls, duplicate filtering and the attempt budget.
pub struct BatchOrchestrator<C> {
    client: C,
    settings: BatchSettings,
}

impl<C: GenerationClient> BatchOrchestrator<C> {
    pub fn new(client: C, settings: BatchSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Generate up to `target` unique images from a prompt, a reference image, or both.
    ///
    /// Fails only when the inputs cannot form a request. Every other failure is reported
    /// through the returned report's outcome, together with whatever was accepted.
    pub async fn run_batch(
        &self,
        target: BatchSize,
        prompt: Option<String>,
        reference_image: Option<ReferenceImage>,
    ) -> Result<BatchReport> {
        let input = BatchInput {
            target,
            prompt,
            reference_image,
        };
        self.run_batch_with(input, &CancelHandle::new(), |_| {}).await
    }

    /// Same as [`run_batch`](Self::run_batch), with a cancellation handle checked before
    /// every wave and a callback invoked after every attempt.
    pub async fn run_batch_with<F>(
        &self,
        input: BatchInput,
        cancel: &CancelHandle,
        mut on_progress: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&BatchProgress),
    {
        let template = GenerationRequest::new(
            input.prompt,
            input.reference_image.map(Arc::new),
            self.settings.style_tag.clone(),
        )?;

        let target = input.target.count();
        let max_attempts = self.settings.max_attempts(target);
        let wave_size = self.settings.wave_size();
        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let _timer = logger::timer(&format!("batch {}", batch_id));

        log::info!(
            "Starting batch {}: target {} images, budget {} attempts, {} in flight",
            batch_id,
            target,
            max_attempts,
            wave_size
        );

        let mut session = BatchSession::new(target, max_attempts);
        let mut abort: Option<AbortReason> = None;

        while !session.is_complete() && !session.budget_exhausted() {
            if cancel.is_cancelled() {
                log::warn!("Batch {} cancelled after {} attempts", batch_id, session.attempts());
                abort = Some(AbortReason::Cancelled);
                break;
            }

            let wave = session.next_wave_size(wave_size);
            let calls = (0..wave).map(|_| self.client.generate(Arc::new(template.clone())));
            let results = join_all(calls).await;

            let mut hit_transient = false;
            for result in results {
                match session.apply(result) {
                    AttemptOutcome::Fatal(message) => {
                        if abort.is_none() {
                            abort = Some(AbortReason::Auth(message));
                        }
                    }
                    AttemptOutcome::Transient => hit_transient = true,
                    AttemptOutcome::Accepted
                    | AttemptOutcome::Duplicate
                    | AttemptOutcome::Failed => {}
                }
                on_progress(&session.progress());
            }

            if abort.is_some() {
                break;
            }

            if hit_transient
                && !self.settings.transient_backoff.is_zero()
                && !session.is_complete()
                && !session.budget_exhausted()
            {
                tokio::time::sleep(self.settings.transient_backoff).await;
            }
        }

        let outcome = match abort {
            Some(reason) => BatchOutcome::Aborted(reason),
            None if session.is_complete() => BatchOutcome::Succeeded,
            None => BatchOutcome::PartiallySucceeded,
        };

        let report = session.finish(batch_id, started_at, outcome);

        log::info!(
            "Batch {} finished ({}): {}/{} unique images in {} attempts, {} duplicates, {}ms",
            batch_id,
            report.outcome.status(),
            report.summary.accepted,
            report.summary.target_count,
            report.summary.attempts_used,
            report.summary.duplicates,
            report.summary.duration_ms()
        );
        if let Some(reason) = report.reason() {
            log::warn!("{}", reason);
        }

        Ok(report)
    }
}
