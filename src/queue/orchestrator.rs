/*!
 * Translation queue orchestrator.
 *
 * Owns the backlog, runs it one item at a time through the step protocol client,
 * and implements pause/resume/cancel. All state mutation happens here; the
 * protocol client and the persistence store only receive copies.
 */

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::errors::StepError;
use crate::persistence::{PersistedSnapshot, PersistenceStore};
use crate::protocol::client::{JobReceipt, StepProgress, StepProtocolClient};

use super::events::EventSink;
use super::models::{QueueItem, QueueSnapshot, QueueState, QueueStats, QueueSummary};

/// What the run loop should do next
enum NextAction {
    Stop,
    WaitForResume,
    Translate(QueueItem),
}

struct Inner {
    state: Mutex<LoopState>,
    /// Signalled by `resume`, `cancel` and `reset` to wake a paused run loop
    resume_signal: Notify,
    client: StepProtocolClient,
    store: PersistenceStore,
    events: EventSink,
}

/// Queue state plus the bookkeeping the run loop needs
#[derive(Default)]
struct LoopState {
    queue: QueueState,
    /// A run loop currently owns the worker (may outlive `running` after a cancel)
    worker_busy: bool,
    /// Bumped by `reset` so an in-flight run cannot resurrect cleared items
    generation: u64,
}

/// Single-worker scheduler for translation jobs.
///
/// Cloning yields another handle to the same queue, so a caller can keep one
/// handle driving `start()` while another issues `pause()`/`cancel()`.
#[derive(Clone)]
pub struct QueueOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueueOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueOrchestrator")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl QueueOrchestrator {
    /// Create an idle orchestrator with an empty queue
    pub fn new(client: StepProtocolClient, store: PersistenceStore, events: EventSink) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoopState::default()),
                resume_signal: Notify::new(),
                client,
                store,
                events,
            }),
        }
    }

    // =========================================================================
    // Backlog management
    // =========================================================================

    /// Append items to the backlog in call order; does not start processing
    pub fn enqueue(&self, items: impl IntoIterator<Item = QueueItem>) {
        let (snapshot, stats) = {
            let mut state = self.inner.state.lock();
            let before = state.queue.pending.len();
            state.queue.pending.extend(items);
            debug!(
                "Enqueued {} item(s), {} pending",
                state.queue.pending.len() - before,
                state.queue.pending.len()
            );
            (Self::persisted(&state.queue), state.queue.stats())
        };
        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);
    }

    /// Clear every list and flag
    pub fn reset(&self) {
        let (snapshot, stats) = {
            let mut state = self.inner.state.lock();
            if state.worker_busy {
                debug!("Queue reset while a run is in flight; its remaining results are dropped");
            }
            state.queue = QueueState::default();
            state.generation = state.generation.wrapping_add(1);
            (Self::persisted(&state.queue), state.queue.stats())
        };
        self.inner.resume_signal.notify_waiters();
        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);
    }

    /// Load the persisted snapshot into an idle queue.
    ///
    /// An item that was mid-translation when the snapshot was written goes back to
    /// the head of the backlog. Returns `false` when there was nothing fresh to
    /// restore or a run is in progress.
    pub fn restore(&self) -> bool {
        if self.inner.state.lock().worker_busy {
            warn!("Cannot restore queue state while a run is in progress");
            return false;
        }

        let Some(snapshot) = self.inner.store.load() else {
            return false;
        };

        let stats = {
            let mut state = self.inner.state.lock();
            if state.worker_busy {
                return false;
            }
            let mut pending: std::collections::VecDeque<QueueItem> = snapshot.pending.into();
            if let Some(interrupted) = snapshot.interrupted {
                info!("Re-queueing interrupted item {}", interrupted.label());
                pending.push_front(interrupted);
            }
            state.queue = QueueState {
                pending,
                completed: snapshot.completed,
                failed: snapshot.failed,
                paused: snapshot.paused,
                ..QueueState::default()
            };
            state.generation = state.generation.wrapping_add(1);
            state.queue.stats()
        };

        info!(
            "Restored queue state: {} pending, {} completed, {} failed",
            stats.pending, stats.completed, stats.failed
        );
        self.inner.events.progress(&stats);
        true
    }

    /// Remove the persisted snapshot
    pub fn clear_saved_state(&self) {
        self.inner.store.clear();
    }

    // =========================================================================
    // Run control
    // =========================================================================

    /// Run the backlog to exhaustion or cancellation.
    ///
    /// Returns `None` without doing anything if a run is already in progress,
    /// otherwise the summary also handed to the queue-completed callback.
    pub async fn start(&self) -> Option<QueueSummary> {
        let (generation, stats) = {
            let mut state = self.inner.state.lock();
            if state.queue.running {
                debug!("Queue already running, ignoring start");
                return None;
            }
            if state.worker_busy {
                warn!("Previous run is still finishing its current step, ignoring start");
                return None;
            }
            state.worker_busy = true;
            state.queue.cancelled = false;
            state.queue.paused = false;
            state.queue.running = true;
            (state.generation, state.queue.stats())
        };

        info!("Starting translation queue with {} item(s)", stats.pending);
        self.inner.events.progress(&stats);

        loop {
            match self.next_action(generation) {
                NextAction::Stop => break,
                NextAction::WaitForResume => self.wait_for_resume(generation).await,
                NextAction::Translate(item) => self.run_item(item, generation).await,
            }
        }

        let (summary, stats) = {
            let mut state = self.inner.state.lock();
            state.worker_busy = false;
            if state.generation == generation {
                state.queue.running = false;
                state.queue.active = None;
                state.queue.active_step = None;
            }
            (state.queue.summary(), state.queue.stats())
        };

        info!(
            "Translation queue finished: {} completed, {} failed{}",
            summary.completed.len(),
            summary.failed.len(),
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        self.inner.events.progress(&stats);
        self.inner.events.queue_completed(&summary);
        Some(summary)
    }

    /// Stop starting new items until `resume()`; the active item runs to the end
    pub fn pause(&self) {
        let (snapshot, stats) = {
            let mut state = self.inner.state.lock();
            state.queue.paused = true;
            (Self::persisted(&state.queue), state.queue.stats())
        };
        info!("Translation queue paused");
        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);
    }

    /// Clear the pause flag; starts a new run in the background if none is active.
    ///
    /// Must be called from within a Tokio runtime. Returns the handle of the
    /// spawned run when one was started.
    pub fn resume(&self) -> Option<JoinHandle<Option<QueueSummary>>> {
        let (snapshot, stats, should_start) = {
            let mut state = self.inner.state.lock();
            state.queue.paused = false;
            let should_start = !state.queue.running && !state.queue.pending.is_empty();
            (Self::persisted(&state.queue), state.queue.stats(), should_start)
        };
        info!("Translation queue resumed");
        self.inner.resume_signal.notify_waiters();
        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);

        if should_start {
            let this = self.clone();
            Some(tokio::spawn(async move { this.start().await }))
        } else {
            None
        }
    }

    /// Stop the run: no further item starts and the active item fails at its next step boundary
    pub fn cancel(&self) {
        let (snapshot, stats) = {
            let mut state = self.inner.state.lock();
            state.queue.cancelled = true;
            state.queue.paused = false;
            state.queue.running = false;
            (Self::persisted(&state.queue), state.queue.stats())
        };
        info!("Translation queue cancelled");
        self.inner.resume_signal.notify_waiters();
        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// Copy of the full queue state
    pub fn snapshot(&self) -> QueueSnapshot {
        self.inner.state.lock().queue.snapshot()
    }

    /// Derived counters
    pub fn stats(&self) -> QueueStats {
        self.inner.state.lock().queue.stats()
    }

    // =========================================================================
    // Run loop internals
    // =========================================================================

    fn next_action(&self, generation: u64) -> NextAction {
        let (snapshot, stats, item) = {
            let mut state = self.inner.state.lock();
            if state.generation != generation || state.queue.cancelled {
                return NextAction::Stop;
            }
            if state.queue.paused {
                return NextAction::WaitForResume;
            }
            let Some(item) = state.queue.pending.pop_front() else {
                return NextAction::Stop;
            };
            state.queue.active = Some(item.clone());
            state.queue.active_step = None;
            (Self::persisted(&state.queue), state.queue.stats(), item)
        };

        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);
        NextAction::Translate(item)
    }

    async fn wait_for_resume(&self, generation: u64) {
        debug!("Queue paused, waiting for resume");
        loop {
            let notified = self.inner.resume_signal.notified();
            tokio::pin!(notified);
            // Register before checking so a resume between the check and the await is not lost
            notified.as_mut().enable();
            {
                let state = self.inner.state.lock();
                if !state.queue.paused || state.queue.cancelled || state.generation != generation {
                    return;
                }
            }
            notified.await;
        }
    }

    async fn run_item(&self, item: QueueItem, generation: u64) {
        info!("Translating {}", item.label());
        self.inner.events.item_started(&item);

        let inner = &self.inner;
        let outcome = inner
            .client
            .translate(
                &item,
                || {
                    let state = inner.state.lock();
                    state.queue.cancelled || state.generation != generation
                },
                |progress: &StepProgress| {
                    let stats = {
                        let mut state = inner.state.lock();
                        if state.generation != generation {
                            return;
                        }
                        state.queue.active_step = Some(progress.clone());
                        state.queue.stats()
                    };
                    inner.events.progress(&stats);
                },
            )
            .await;

        self.record_outcome(item, outcome, generation);
    }

    fn record_outcome(
        &self,
        mut item: QueueItem,
        outcome: Result<JobReceipt, StepError>,
        generation: u64,
    ) {
        if let Err(error) = &outcome {
            item.error_message = Some(error.to_string());
        }

        let (snapshot, stats) = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                debug!("Dropping result for {} after queue reset", item.label());
                return;
            }
            state.queue.active = None;
            state.queue.active_step = None;
            match outcome {
                Ok(_) => state.queue.completed.push(item.clone()),
                Err(_) => state.queue.failed.push(item.clone()),
            }
            (Self::persisted(&state.queue), state.queue.stats())
        };

        self.inner.store.save(&snapshot);
        self.inner.events.progress(&stats);

        match &outcome {
            Ok(receipt) => {
                info!(
                    "Translated {} (job {}, {} steps)",
                    item.label(),
                    receipt.job_id,
                    receipt.steps_completed
                );
                self.inner.events.item_completed(&item);
            }
            Err(error) => {
                warn!("Translation failed for {}: {}", item.label(), error);
                self.inner.events.item_errored(&item, error);
            }
        }
    }

    fn persisted(state: &QueueState) -> PersistedSnapshot {
        PersistedSnapshot::capture(
            state.pending.iter().cloned().collect(),
            state.completed.clone(),
            state.failed.clone(),
            state.paused,
            state.active.clone(),
        )
    }
}
