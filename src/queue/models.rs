/*!
 * Queue data model.
 *
 * These structures describe the translation units, the orchestrator's internal
 * state, and the read-only views handed to callers.
 */

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::language_utils;
use crate::protocol::client::{StepProgress, StepProgressReport};

/// One translation unit: a document and the language it should be translated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Document to translate
    pub source_document_id: u64,
    /// Existing translated document, 0 when it still has to be created
    #[serde(default)]
    pub target_document_id: u64,
    /// Target language code
    pub target_language: String,
    /// Title shown in progress displays
    #[serde(default)]
    pub display_title: String,
    /// Why the item failed; only present on failed items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl QueueItem {
    /// Create an item whose translated document will be created by the remote side
    pub fn new(
        source_document_id: u64,
        target_language: impl Into<String>,
        display_title: impl Into<String>,
    ) -> Self {
        Self {
            source_document_id,
            target_document_id: 0,
            target_language: target_language.into(),
            display_title: display_title.into(),
            error_message: None,
        }
    }

    /// Translate into an existing document instead of creating one
    pub fn with_target_document(mut self, target_document_id: u64) -> Self {
        self.target_document_id = target_document_id;
        self
    }

    /// Copy of this item suitable for enqueueing again after a failure
    pub fn retry(&self) -> Self {
        Self {
            error_message: None,
            ..self.clone()
        }
    }

    /// Check the item is something the remote endpoint can accept
    pub fn validate(&self) -> Result<()> {
        if self.source_document_id == 0 {
            return Err(anyhow!("Source document id must be positive"));
        }
        language_utils::validate_language_code(&self.target_language)
            .map_err(|e| anyhow!("Item for document {}: {}", self.source_document_id, e))?;
        Ok(())
    }

    /// Short label for log lines
    pub fn label(&self) -> String {
        if self.display_title.is_empty() {
            format!("#{} -> {}", self.source_document_id, self.target_language)
        } else {
            format!(
                "'{}' (#{}) -> {}",
                self.display_title, self.source_document_id, self.target_language
            )
        }
    }
}

/// Outcome summary handed to the queue-completed callback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    /// Items translated successfully, in completion order
    pub completed: Vec<QueueItem>,
    /// Items that failed, in failure order
    pub failed: Vec<QueueItem>,
    /// Whether the run ended because of `cancel()`
    pub cancelled: bool,
}

/// Counters and current activity, as reported to progress callbacks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// pending + completed + failed + active
    pub total: usize,
    /// Items not yet started
    pub pending: usize,
    /// Items translated successfully
    pub completed: usize,
    /// Items that failed
    pub failed: usize,
    /// Item currently being translated
    pub current: Option<QueueItem>,
    /// Step the current item is on
    pub current_step: Option<StepProgressReport>,
    /// Whether the queue is paused
    pub is_paused: bool,
    /// Whether a run is in progress
    pub is_running: bool,
}

impl QueueStats {
    /// Share of finished successful items, rounded to a whole percentage
    pub fn percent_complete(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Read-only copy of the full queue state for UI polling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    /// Items not yet started, in FIFO order
    pub pending: Vec<QueueItem>,
    /// Item currently being translated
    pub active: Option<QueueItem>,
    /// Step the active item is on
    pub active_step: Option<StepProgressReport>,
    /// Items translated successfully
    pub completed: Vec<QueueItem>,
    /// Items that failed
    pub failed: Vec<QueueItem>,
    /// Whether the queue is paused
    pub paused: bool,
    /// Whether the last run was cancelled
    pub cancelled: bool,
    /// Whether a run is in progress
    pub running: bool,
}

impl QueueSnapshot {
    /// Total number of items this run knows about
    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len() + self.failed.len() + usize::from(self.active.is_some())
    }

    /// Derived counters
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            total: self.total(),
            pending: self.pending.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            current: self.active.clone(),
            current_step: self.active_step.clone(),
            is_paused: self.paused,
            is_running: self.running,
        }
    }
}

/// The orchestrator's mutable state; only the orchestrator touches it
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pub pending: VecDeque<QueueItem>,
    pub active: Option<QueueItem>,
    pub active_step: Option<StepProgress>,
    pub completed: Vec<QueueItem>,
    pub failed: Vec<QueueItem>,
    pub paused: bool,
    pub cancelled: bool,
    pub running: bool,
}

impl QueueState {
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pending: self.pending.iter().cloned().collect(),
            active: self.active.clone(),
            active_step: self.active_step.as_ref().and_then(StepProgress::report),
            completed: self.completed.clone(),
            failed: self.failed.clone(),
            paused: self.paused,
            cancelled: self.cancelled,
            running: self.running,
        }
    }

    pub fn stats(&self) -> QueueStats {
        self.snapshot().stats()
    }

    pub fn summary(&self) -> QueueSummary {
        QueueSummary {
            completed: self.completed.clone(),
            failed: self.failed.clone(),
            cancelled: self.cancelled,
        }
    }
}
