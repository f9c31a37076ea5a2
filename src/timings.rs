//! Timings view-model
//!
//! `TimingsView` mirrors the raw timings feed into a display list enriched
//! with the trigger operation's name, reconciling on every upstream change.
//! Reconciliation upserts in place and prunes, never replaces wholesale, so
//! a row's transient UI state survives refreshes. Mutating operations push
//! the full field set to the backend and reload through it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::warn;

use crate::dialog::{CreateTimingDialog, PromptOutcome, Prompter, SelectOption};
use crate::error::Result;
use crate::model::{operation_name, DisplayTiming, Operation, Timing};
use crate::report::ErrorReporter;

/// Backend collaborator for timing writes and upstream refreshes
///
/// The timings REST service lives outside this crate; it owns the feeds
/// the view subscribes to and the write endpoints behind this trait.
#[async_trait]
pub trait TimingsBackend: Send + Sync {
    /// Push a timing's full field set
    async fn edit_timing(&self, timing: &Timing) -> Result<()>;

    /// Delete a timing by id
    async fn delete_timing(&self, timing_id: &str) -> Result<()>;

    /// Force a full upstream refresh of the timings feed
    async fn refresh(&self) -> Result<()>;
}

/// View-model reconciling the timings feed against the operations feed
pub struct TimingsView {
    timings_rx: watch::Receiver<Vec<Timing>>,
    operations_rx: watch::Receiver<Vec<Operation>>,
    backend: Arc<dyn TimingsBackend>,
    prompter: Arc<dyn Prompter>,
    create_dialog: Arc<dyn CreateTimingDialog>,
    reporter: Arc<dyn ErrorReporter>,
    display: Vec<DisplayTiming>,
    loading: bool,
}

impl TimingsView {
    /// Create a view over the two upstream feeds and reconcile once
    pub fn new(
        timings_rx: watch::Receiver<Vec<Timing>>,
        operations_rx: watch::Receiver<Vec<Operation>>,
        backend: Arc<dyn TimingsBackend>,
        prompter: Arc<dyn Prompter>,
        create_dialog: Arc<dyn CreateTimingDialog>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let mut view = Self {
            timings_rx,
            operations_rx,
            backend,
            prompter,
            create_dialog,
            reporter,
            display: Vec::new(),
            loading: false,
        };
        view.reconcile();
        view
    }

    /// The current display list, sorted by type then name
    pub fn timings(&self) -> &[DisplayTiming] {
        &self.display
    }

    /// A forced refresh is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Await the next change on either upstream feed and reconcile
    ///
    /// Returns `false` once an upstream feed has closed.
    pub async fn await_update(&mut self) -> bool {
        let changed = tokio::select! {
            changed = self.timings_rx.changed() => changed,
            changed = self.operations_rx.changed() => changed,
        };
        if changed.is_err() {
            return false;
        }

        self.reconcile();
        true
    }

    /// Reconcile the display list against the current upstream snapshots
    ///
    /// Upsert-then-prune-then-sort; idempotent, and the only state it
    /// touches is the display list. Each raw timing is overlaid onto its
    /// existing display entry (preserving transient flags) or appended,
    /// stale entries are pruned, and the list is re-sorted.
    pub fn reconcile(&mut self) {
        let timings = self.timings_rx.borrow_and_update().clone();
        let operations = self.operations_rx.borrow_and_update().clone();

        for timing in &timings {
            let resolved = operation_name(&operations, &timing.trigger_operation_id);

            match self
                .display
                .iter_mut()
                .find(|entry| entry.timing_id == timing.timing_id)
            {
                Some(entry) => entry.overlay(timing, resolved),
                None => self.display.push(DisplayTiming::project(timing, resolved)),
            }
        }

        self.display
            .retain(|entry| timings.iter().any(|t| t.timing_id == entry.timing_id));

        self.display.sort_by(|a, b| {
            (a.timing_type.as_str(), a.timing_name.as_str())
                .cmp(&(b.timing_type.as_str(), b.timing_name.as_str()))
        });
    }

    /// Activate or deactivate a timing
    pub async fn set_active(&mut self, timing_id: &str, active: bool) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let mut edited = self.display[index].to_timing();
        edited.is_active = active;
        self.push_edit(index, edited).await;
    }

    /// Set a timing's lock status
    pub async fn set_lock_status(&mut self, timing_id: &str, lock_status: bool) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let mut edited = self.display[index].to_timing();
        edited.lock_status = lock_status;
        self.push_edit(index, edited).await;
    }

    /// Set a timing's override-lock flag
    pub async fn set_override_lock(&mut self, timing_id: &str, override_lock: bool) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let mut edited = self.display[index].to_timing();
        edited.override_lock = override_lock;
        self.push_edit(index, edited).await;
    }

    /// Set a timing's shabbat mode
    pub async fn set_shabbat_mode(&mut self, timing_id: &str, shabbat_mode: bool) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let mut edited = self.display[index].to_timing();
        edited.shabbat_mode = shabbat_mode;
        self.push_edit(index, edited).await;
    }

    /// Push a row's inline edits and close the editor
    pub async fn commit_edit(&mut self, timing_id: &str) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let edited = self.display[index].to_timing();
        self.push_edit(index, edited).await;
        self.display[index].editing = false;
    }

    /// Rename a timing through a text-input prompt
    ///
    /// A dismissed prompt aborts with no backend call.
    pub async fn rename(&mut self, timing_id: &str) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let current = self.display[index].timing_name.clone();

        let outcome = self
            .prompter
            .input_text("Set a new name", &format!("Current name: {current}"))
            .await;
        let PromptOutcome::Confirmed(name) = outcome else {
            return;
        };

        let mut edited = self.display[index].to_timing();
        edited.timing_name = name;
        self.push_edit(index, edited).await;
    }

    /// Reassign a timing's trigger operation through a select prompt
    ///
    /// Options come from the current operations snapshot (label = name,
    /// value = id). A dismissed prompt aborts; confirmation updates the
    /// foreign key and then forces a full upstream refresh.
    pub async fn reassign_operation(&mut self, timing_id: &str) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };

        let operations = self.operations_rx.borrow().clone();
        let options: Vec<SelectOption> = operations
            .iter()
            .map(|op| SelectOption {
                value: op.operation_id.clone(),
                label: op.operation_name.clone(),
            })
            .collect();
        let current = operation_name(&operations, &self.display[index].trigger_operation_id);

        let outcome = self
            .prompter
            .select(
                "Replace operation",
                &format!("Current operation: {current}"),
                &options,
            )
            .await;
        let PromptOutcome::Confirmed(operation_id) = outcome else {
            return;
        };

        let mut edited = self.display[index].to_timing();
        edited.trigger_operation_id = operation_id;
        self.push_edit(index, edited).await;

        self.refresh().await;
    }

    /// Delete a timing after a destructive-action confirmation
    pub async fn delete(&mut self, timing_id: &str) {
        let Some(index) = self.index_of(timing_id) else {
            return;
        };
        let name = self.display[index].timing_name.clone();

        let outcome = self
            .prompter
            .confirm_danger("Are you sure?", &format!("This will delete {name}"))
            .await;
        if outcome == PromptOutcome::Cancelled {
            return;
        }

        self.display[index].syncing = true;
        let result = self.backend.delete_timing(timing_id).await;
        self.display[index].syncing = false;

        if let Err(error) = result {
            self.reporter.on_http_error(&error);
        }
    }

    /// Open the timing-creation dialog with empty seed data
    pub async fn create(&self) {
        self.create_dialog.open().await;
    }

    /// Force a full upstream refresh
    pub async fn refresh(&mut self) {
        self.loading = true;
        let result = self.backend.refresh().await;
        self.loading = false;

        if let Err(error) = result {
            self.reporter.on_http_error(&error);
        }
    }

    fn index_of(&self, timing_id: &str) -> Option<usize> {
        let index = self
            .display
            .iter()
            .position(|entry| entry.timing_id == timing_id);
        if index.is_none() {
            warn!(timing_id, "timing not present in display list");
        }
        index
    }

    /// Write a full field set with the syncing flag raised
    ///
    /// The flag is cleared whether or not the write succeeded; failures are
    /// only visible through the reporter. This mirrors the console's
    /// long-standing behavior (see DESIGN.md).
    async fn push_edit(&mut self, index: usize, edited: Timing) {
        self.display[index].syncing = true;
        let result = self.backend.edit_timing(&edited).await;
        self.display[index].syncing = false;

        if let Err(error) = result {
            self.reporter.on_http_error(&error);
        }
    }
}
