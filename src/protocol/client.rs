/*!
 * Sequential step driver.
 *
 * Runs one queue item through the remote protocol: `init` first, then the plan
 * derived from its response, one request at a time.
 */

use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::errors::StepError;
use crate::queue::models::QueueItem;

use super::steps::{Step, StepPlan};
use super::{StepRequest, StepTransport};

/// Largest chunk count accepted from an `init` response
pub const MAX_CHUNKS: usize = 10_000;

/// Where the active item currently is in its remote protocol.
///
/// Transient: created fresh per item and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepProgress {
    /// Job token assigned by `init`, unknown before it
    pub job_id: Option<u64>,
    /// Steps known so far; only `init` until the init response arrives
    pub plan: StepPlan,
    /// 0-based cursor into `plan`
    pub step_index: usize,
}

impl StepProgress {
    fn new() -> Self {
        Self {
            job_id: None,
            plan: StepPlan::initial(),
            step_index: 0,
        }
    }

    /// Step the cursor points at, `None` once the plan is exhausted
    pub fn current_step(&self) -> Option<Step> {
        self.plan.get(self.step_index)
    }

    /// Display-oriented view of the current step
    pub fn report(&self) -> Option<StepProgressReport> {
        self.current_step().map(|step| StepProgressReport {
            step,
            step_index: self.step_index,
            total_steps: self.plan.len(),
            message: step.message(),
        })
    }
}

/// "Part N of M" style description of the step about to be requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepProgressReport {
    /// Step about to be requested
    pub step: Step,
    /// Its 0-based index in the plan
    pub step_index: usize,
    /// Total number of steps currently known
    pub total_steps: usize,
    /// Human-readable message for the step
    pub message: String,
}

/// Proof of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReceipt {
    /// Job token assigned by `init`
    pub job_id: u64,
    /// Number of steps that completed, including `init`
    pub steps_completed: usize,
}

/// Drives documents through the remote protocol one step at a time
#[derive(Debug, Clone)]
pub struct StepProtocolClient {
    transport: Arc<dyn StepTransport>,
}

impl StepProtocolClient {
    /// Create a client on top of the given transport
    pub fn new(transport: Arc<dyn StepTransport>) -> Self {
        Self { transport }
    }

    /// Translate one item to completion or failure.
    ///
    /// `is_cancelled` is checked before every request; `on_progress` is called right
    /// before every request with the step about to be sent. Never more than one
    /// request is in flight and nothing is retried.
    pub async fn translate<C, P>(
        &self,
        item: &QueueItem,
        is_cancelled: C,
        mut on_progress: P,
    ) -> Result<JobReceipt, StepError>
    where
        C: Fn() -> bool,
        P: FnMut(&StepProgress),
    {
        let mut progress = StepProgress::new();

        loop {
            if is_cancelled() {
                debug!(
                    "Cancellation observed for document {} ({}) at step {}",
                    item.source_document_id, item.target_language, progress.step_index
                );
                return Err(StepError::Cancelled);
            }

            let Some(step) = progress.current_step() else {
                return Ok(JobReceipt {
                    job_id: progress.job_id.unwrap_or_default(),
                    steps_completed: progress.step_index,
                });
            };

            on_progress(&progress);

            let request = StepRequest {
                source_post_id: item.source_document_id,
                target_language: item.target_language.clone(),
                target_post_id: item.target_document_id,
                step,
                job_id: progress.job_id.unwrap_or(0),
            };

            debug!(
                "Requesting step {} ({}/{}) for document {} -> {}",
                step,
                progress.step_index + 1,
                progress.plan.len(),
                item.source_document_id,
                item.target_language
            );

            let response = match self.transport.send_step(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        "Step {} for document {} failed in transport: {}",
                        step, item.source_document_id, e
                    );
                    return Err(StepError::from(e));
                }
            };

            if !response.success {
                return Err(StepError::rejected(response.message));
            }

            if step == Step::Init {
                let job_id = response.job_id.ok_or_else(|| {
                    StepError::Transport("init response did not carry a job_id".to_string())
                })?;
                let chunk_count = response.chunk_count.unwrap_or(0);
                if chunk_count > MAX_CHUNKS {
                    warn!(
                        "Init for document {} declared {} chunks, limit is {}",
                        item.source_document_id, chunk_count, MAX_CHUNKS
                    );
                    return Err(StepError::Transport(format!(
                        "init response declared {} chunks",
                        chunk_count
                    )));
                }
                debug!(
                    "Job {} created for document {} with {} chunk(s)",
                    job_id, item.source_document_id, chunk_count
                );
                progress = StepProgress {
                    job_id: Some(job_id),
                    plan: StepPlan::from_chunk_count(chunk_count),
                    step_index: 1,
                };
            } else {
                progress.step_index += 1;
            }
        }
    }
}
