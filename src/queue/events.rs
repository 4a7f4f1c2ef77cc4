/*!
 * Callback slots through which the orchestrator reports to its caller.
 *
 * Every slot is optional; an empty slot is a silent no-op. Callbacks run
 * synchronously on the task driving the queue, never while the queue state is
 * locked, so they may call back into the orchestrator (e.g. `snapshot()`).
 */

use std::fmt;
use std::sync::Arc;

use crate::errors::StepError;

use super::models::{QueueItem, QueueStats, QueueSummary};

type ProgressCallback = Arc<dyn Fn(&QueueStats) + Send + Sync>;
type ItemCallback = Arc<dyn Fn(&QueueItem) + Send + Sync>;
type ItemErrorCallback = Arc<dyn Fn(&QueueItem, &StepError) + Send + Sync>;
type QueueCompleteCallback = Arc<dyn Fn(&QueueSummary) + Send + Sync>;

/// Registrable set of queue callbacks
#[derive(Clone, Default)]
pub struct EventSink {
    on_progress: Option<ProgressCallback>,
    on_item_start: Option<ItemCallback>,
    on_item_complete: Option<ItemCallback>,
    on_item_error: Option<ItemErrorCallback>,
    on_queue_complete: Option<QueueCompleteCallback>,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_item_start", &self.on_item_start.is_some())
            .field("on_item_complete", &self.on_item_complete.is_some())
            .field("on_item_error", &self.on_item_error.is_some())
            .field("on_queue_complete", &self.on_queue_complete.is_some())
            .finish()
    }
}

impl EventSink {
    /// Sink with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Called whenever counters or the current step change
    pub fn on_progress(mut self, callback: impl Fn(&QueueStats) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Called when an item becomes active
    pub fn on_item_start(mut self, callback: impl Fn(&QueueItem) + Send + Sync + 'static) -> Self {
        self.on_item_start = Some(Arc::new(callback));
        self
    }

    /// Called when an item moves to `completed`
    pub fn on_item_complete(
        mut self,
        callback: impl Fn(&QueueItem) + Send + Sync + 'static,
    ) -> Self {
        self.on_item_complete = Some(Arc::new(callback));
        self
    }

    /// Called when an item moves to `failed`
    pub fn on_item_error(
        mut self,
        callback: impl Fn(&QueueItem, &StepError) + Send + Sync + 'static,
    ) -> Self {
        self.on_item_error = Some(Arc::new(callback));
        self
    }

    /// Called exactly once at the end of every run
    pub fn on_queue_complete(
        mut self,
        callback: impl Fn(&QueueSummary) + Send + Sync + 'static,
    ) -> Self {
        self.on_queue_complete = Some(Arc::new(callback));
        self
    }

    pub(crate) fn progress(&self, stats: &QueueStats) {
        if let Some(callback) = &self.on_progress {
            callback(stats);
        }
    }

    pub(crate) fn item_started(&self, item: &QueueItem) {
        if let Some(callback) = &self.on_item_start {
            callback(item);
        }
    }

    pub(crate) fn item_completed(&self, item: &QueueItem) {
        if let Some(callback) = &self.on_item_complete {
            callback(item);
        }
    }

    pub(crate) fn item_errored(&self, item: &QueueItem, error: &StepError) {
        if let Some(callback) = &self.on_item_error {
            callback(item, error);
        }
    }

    pub(crate) fn queue_completed(&self, summary: &QueueSummary) {
        if let Some(callback) = &self.on_queue_complete {
            callback(summary);
        }
    }
}
