/*!
 * Common test utilities for the bulk-translate test suite
 */

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

use bulk_translate::persistence::{
    MemoryStorage, PersistenceStore, DEFAULT_SNAPSHOT_KEY, DEFAULT_SNAPSHOT_TTL,
};
use bulk_translate::protocol::MockTransport;
use bulk_translate::{EventSink, QueueItem, QueueOrchestrator, QueueStats, QueueSummary, StepProtocolClient};

/// Route library logs through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Item with a title derived from its id
pub fn item(source_document_id: u64, target_language: &str) -> QueueItem {
    QueueItem::new(
        source_document_id,
        target_language,
        format!("Document {}", source_document_id),
    )
}

/// Source ids of a list of items, for order assertions
pub fn ids(items: &[QueueItem]) -> Vec<u64> {
    items.iter().map(|i| i.source_document_id).collect()
}

/// Something the orchestrator reported through its callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Progress(QueueStats),
    ItemStarted(u64),
    ItemCompleted(u64),
    ItemFailed(u64, String),
    QueueCompleted(QueueSummary),
}

/// Collects every callback invocation in order
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event sink feeding this recorder
    pub fn sink(&self) -> EventSink {
        let progress = self.events.clone();
        let started = self.events.clone();
        let completed = self.events.clone();
        let failed = self.events.clone();
        let finished = self.events.clone();
        EventSink::new()
            .on_progress(move |stats| progress.lock().push(RecordedEvent::Progress(stats.clone())))
            .on_item_start(move |item| {
                started.lock().push(RecordedEvent::ItemStarted(item.source_document_id))
            })
            .on_item_complete(move |item| {
                completed.lock().push(RecordedEvent::ItemCompleted(item.source_document_id))
            })
            .on_item_error(move |item, error| {
                failed
                    .lock()
                    .push(RecordedEvent::ItemFailed(item.source_document_id, error.to_string()))
            })
            .on_queue_complete(move |summary| {
                finished.lock().push(RecordedEvent::QueueCompleted(summary.clone()))
            })
    }

    /// Every event recorded so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Events other than progress updates
    pub fn lifecycle(&self) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, RecordedEvent::Progress(_)))
            .collect()
    }

    /// Number of queue-completed notifications
    pub fn queue_completions(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, RecordedEvent::QueueCompleted(_)))
            .count()
    }
}

/// Store over process memory that the test can inspect
pub fn memory_store() -> PersistenceStore {
    PersistenceStore::new(
        Arc::new(MemoryStorage::new()),
        DEFAULT_SNAPSHOT_KEY,
        DEFAULT_SNAPSHOT_TTL,
    )
}

/// Orchestrator over a mock transport with a recorder attached
pub fn orchestrator_with(
    transport: Arc<MockTransport>,
    store: PersistenceStore,
) -> (QueueOrchestrator, EventRecorder) {
    let recorder = EventRecorder::new();
    let orchestrator =
        QueueOrchestrator::new(StepProtocolClient::new(transport), store, recorder.sink());
    (orchestrator, recorder)
}
