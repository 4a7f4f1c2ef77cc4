/*!
 * # bulk-translate - Bulk document translation queue
 *
 * A Rust library that drives many document translations, one at a time,
 * through a remote step-wise translation endpoint.
 *
 * ## Features
 *
 * - FIFO queue of (document, target language) jobs with a single worker
 * - Multi-step remote protocol per job:
 *   - `init` returns a job token and the number of content chunks
 *   - `title`, `content_0..n`, `excerpt`, `finalize` follow in order
 * - Pause, resume and cancel at step granularity
 * - Best-effort snapshot persistence with a one-hour time-to-live
 * - Progress, per-item and end-of-run callbacks
 * - ISO 639-1 and ISO 639-2 language code validation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `queue`: The queue orchestrator, its data model and callbacks
 * - `protocol`: The step protocol client and its transports:
 *   - `protocol::http`: reqwest transport for the remote endpoint
 *   - `protocol::mock`: scripted transport for tests and benchmarks
 * - `persistence`: Snapshot storage backends and the snapshot store
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod persistence;
pub mod protocol;
pub mod queue;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, PersistenceError, StepError, TransportError};
pub use language_utils::{get_language_name, language_codes_match, validate_language_code};
pub use persistence::{PersistedSnapshot, PersistenceStore};
pub use protocol::{HttpStepTransport, Step, StepPlan, StepProtocolClient, StepTransport};
pub use queue::{EventSink, QueueItem, QueueOrchestrator, QueueSnapshot, QueueStats, QueueSummary};
