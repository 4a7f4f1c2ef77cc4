use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::persistence::{FileStorage, PersistedSnapshot, PersistenceStore};
use crate::protocol::{HttpStepTransport, StepProtocolClient, StepTransport};
use crate::queue::{EventSink, QueueItem, QueueOrchestrator, QueueStats, QueueSummary};

// @module: Application controller for bulk translation runs

/// Main application controller: builds the queue from configuration and drives runs
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Render a terminal progress bar while running
    show_progress: bool,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Ok(Self::with_config(Config::default())?.without_progress())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        Ok(Self {
            config,
            show_progress: true,
        })
    }

    /// Disable the terminal progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Configuration the controller was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read a JSON array of queue items and validate every entry
    pub fn load_items<P: AsRef<Path>>(path: P) -> Result<Vec<QueueItem>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::File(format!("Failed to read items file {}: {}", path.display(), e))
        })?;
        Self::parse_items(&content)
            .with_context(|| format!("Invalid items file: {}", path.display()))
    }

    /// Parse and validate a JSON array of queue items
    pub fn parse_items(json: &str) -> Result<Vec<QueueItem>> {
        let items: Vec<QueueItem> = serde_json::from_str(json).context("Expected a JSON array of items")?;
        for item in &items {
            item.validate()?;
        }
        Ok(items)
    }

    /// Build the snapshot store from the persistence section
    pub fn build_store(&self) -> Result<PersistenceStore, AppError> {
        let dir = self
            .config
            .persistence
            .resolve_storage_dir()
            .map_err(|e| AppError::Config(e.to_string()))?;
        let storage = FileStorage::new(&dir)?;
        Ok(PersistenceStore::new(
            Arc::new(storage),
            self.config.persistence.key.clone(),
            self.config.persistence.ttl(),
        ))
    }

    fn build_transport(&self) -> Result<Arc<dyn StepTransport>> {
        Ok(Arc::new(HttpStepTransport::from_config(&self.config.api)?))
    }

    fn build_orchestrator(
        &self,
        transport: Arc<dyn StepTransport>,
        progress_bar: &ProgressBar,
    ) -> Result<QueueOrchestrator> {
        Ok(QueueOrchestrator::new(
            StepProtocolClient::new(transport),
            self.build_store()?,
            Self::progress_events(progress_bar.clone()),
        ))
    }

    /// Translate `items`, cancelling on Ctrl-C
    pub async fn run_items(&self, items: Vec<QueueItem>) -> Result<QueueSummary> {
        let transport = self.build_transport()?;
        self.run_items_with(transport, items, Self::ctrl_c()).await
    }

    /// Translate `items` over `transport`, cancelling when `shutdown` resolves first
    pub async fn run_items_with<F>(
        &self,
        transport: Arc<dyn StepTransport>,
        items: Vec<QueueItem>,
        shutdown: F,
    ) -> Result<QueueSummary>
    where
        F: Future<Output = ()>,
    {
        if items.is_empty() {
            return Err(anyhow!("No items to translate"));
        }

        let progress_bar = self.progress_bar();
        let orchestrator = self.build_orchestrator(transport, &progress_bar)?;
        orchestrator.reset();
        orchestrator.enqueue(items);

        let runner = orchestrator.clone();
        let handle = tokio::spawn(async move { runner.start().await });
        self.drive(&orchestrator, handle, &progress_bar, shutdown).await
    }

    /// Restore the saved queue and continue it, cancelling on Ctrl-C
    pub async fn resume(&self) -> Result<Option<QueueSummary>> {
        let transport = self.build_transport()?;
        self.resume_with(transport, Self::ctrl_c()).await
    }

    /// Restore the saved queue and continue it over `transport`.
    ///
    /// Returns `None` when there is nothing to resume.
    pub async fn resume_with<F>(
        &self,
        transport: Arc<dyn StepTransport>,
        shutdown: F,
    ) -> Result<Option<QueueSummary>>
    where
        F: Future<Output = ()>,
    {
        let progress_bar = self.progress_bar();
        let orchestrator = self.build_orchestrator(transport, &progress_bar)?;

        if !orchestrator.restore() {
            info!("No saved queue to resume");
            progress_bar.finish_and_clear();
            return Ok(None);
        }

        let Some(handle) = orchestrator.resume() else {
            info!("Saved queue has no pending items");
            progress_bar.finish_and_clear();
            orchestrator.clear_saved_state();
            return Ok(None);
        };

        self.drive(&orchestrator, handle, &progress_bar, shutdown)
            .await
            .map(Some)
    }

    /// Saved snapshot, if one exists and is still fresh
    pub fn status(&self) -> Result<Option<PersistedSnapshot>> {
        Ok(self.build_store()?.load())
    }

    /// Remove the saved snapshot
    pub fn clear(&self) -> Result<()> {
        self.build_store()?.clear();
        info!("Cleared saved queue state");
        Ok(())
    }

    async fn drive<F>(
        &self,
        orchestrator: &QueueOrchestrator,
        mut handle: JoinHandle<Option<QueueSummary>>,
        progress_bar: &ProgressBar,
        shutdown: F,
    ) -> Result<QueueSummary>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();

        let outcome = tokio::select! {
            outcome = &mut handle => outcome,
            _ = shutdown => {
                warn!("Interrupted, cancelling translation queue");
                orchestrator.cancel();
                handle.await
            }
        };

        let summary = outcome
            .context("Translation queue task failed")?
            .ok_or_else(|| anyhow!("Translation queue is already running"))?;

        progress_bar.finish_and_clear();

        // A finished or user-cancelled run leaves nothing worth resuming
        orchestrator.clear_saved_state();

        info!(
            "Queue finished in {}: {} completed, {} failed{}",
            Self::format_duration(start_time.elapsed()),
            summary.completed.len(),
            summary.failed.len(),
            if summary.cancelled { ", cancelled" } else { "" }
        );
        Ok(summary)
    }

    async fn ctrl_c() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} items ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }

    fn progress_events(progress_bar: ProgressBar) -> EventSink {
        let error_bar = progress_bar.clone();
        EventSink::new()
            .on_progress(move |stats| {
                progress_bar.set_length(stats.total as u64);
                progress_bar.set_position((stats.completed + stats.failed) as u64);
                progress_bar.set_message(Self::progress_message(stats));
            })
            .on_item_start(|item| debug!("Started {}", item.label()))
            .on_item_error(move |item, error| {
                error_bar.println(format!("Failed: {} ({})", item.label(), error));
            })
    }

    /// One-line description of what the queue is doing
    pub fn progress_message(stats: &QueueStats) -> String {
        match (&stats.current, &stats.current_step) {
            (Some(item), Some(step)) => format!("{} - {}", item.label(), step.message),
            (Some(item), None) => item.label(),
            (None, _) if stats.is_paused => "Paused".to_string(),
            (None, _) => String::new(),
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
