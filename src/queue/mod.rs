/*!
 * Translation queue: data model, callbacks and the single-worker orchestrator.
 */

pub mod events;
pub mod models;
pub mod orchestrator;

pub use events::EventSink;
pub use models::{QueueItem, QueueSnapshot, QueueStats, QueueSummary};
pub use orchestrator::QueueOrchestrator;
