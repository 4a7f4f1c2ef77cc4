/*!
 * Remote step protocol.
 *
 * This module contains everything needed to drive one document through the
 * remote translation service:
 * - `steps`: step identifiers and the per-job step plan
 * - `client`: the sequential step driver used by the queue
 * - `http`: reqwest-backed transport for the real endpoint
 * - `mock`: scripted transport for tests and benchmarks
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::TransportError;

pub mod client;
pub mod http;
pub mod mock;
pub mod steps;

pub use client::{JobReceipt, StepProgress, StepProgressReport, StepProtocolClient};
pub use http::HttpStepTransport;
pub use mock::{MockTransport, ScriptedReply};
pub use steps::{Step, StepPlan};

/// Body of a single step request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    /// Document being translated
    pub source_post_id: u64,
    /// Target language code
    pub target_language: String,
    /// Existing translated document, 0 when it still has to be created
    pub target_post_id: u64,
    /// Step being requested
    pub step: Step,
    /// Remote job token, 0 for `init`
    pub job_id: u64,
}

/// Body of a step response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    /// Whether the step succeeded
    pub success: bool,
    /// Human-readable message, required to explain failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Job token, only on the `init` response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<u64>,
    /// Number of content chunks, only on the `init` response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
}

impl StepResponse {
    /// Successful response for a non-init step
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Successful init response
    pub fn init(job_id: u64, chunk_count: usize) -> Self {
        Self {
            success: true,
            message: None,
            job_id: Some(job_id),
            chunk_count: Some(chunk_count),
        }
    }

    /// Application-level failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Common trait for anything that can execute one protocol step.
///
/// Implementations perform exactly one round-trip per call and never retry.
#[async_trait]
pub trait StepTransport: Send + Sync + Debug {
    /// Send one step request and return the decoded response
    ///
    /// # Arguments
    /// * `request` - The step to execute
    ///
    /// # Returns
    /// * `Result<StepResponse, TransportError>` - The response or a transport failure
    async fn send_step(&self, request: &StepRequest) -> Result<StepResponse, TransportError>;
}
