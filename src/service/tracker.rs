//! Owned progress state for the single in-flight run.
//!
//! The tracker replaces any notion of global mutable progress: the supervisor
//! owns one instance behind an `Arc`, pipelines mutate it synchronously, and
//! polling callers take cheap cloned snapshots.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::error;

use crate::account::session::IssuedSession;
use crate::categories::Category;
use crate::common::progress::{
    CategoryProgress, TableProgress, TransferPhase, TransferProgress,
};

/// Minimum interval between throughput recomputations.
const THROUGHPUT_WINDOW: Duration = Duration::from_millis(500);

struct TrackerState {
    progress: TransferProgress,
    /// Percent band the file-copy stage maps its completion ratio into.
    copy_band: (f64, f64),
    /// Start of the current throughput sampling window.
    window_at: Option<Instant>,
    /// `bytes_copied` at the start of the sampling window.
    window_bytes: u64,
}

impl TrackerState {
    fn touch(&mut self) {
        self.progress.updated_at = Some(Utc::now());
    }

    /// Monotonic within a run: percent never decreases until the next reset.
    fn raise_percent(&mut self, percent: f64) {
        let clamped = percent.clamp(0.0, 100.0);
        if clamped > self.progress.percent {
            self.progress.percent = clamped;
        }
    }

    fn recompute_throughput(&mut self) {
        let now = Instant::now();
        let Some(window_at) = self.window_at else {
            self.window_at = Some(now);
            self.window_bytes = self.progress.bytes_copied;
            return;
        };

        let elapsed = now.duration_since(window_at);
        if elapsed < THROUGHPUT_WINDOW {
            return;
        }

        let delta = self.progress.bytes_copied.saturating_sub(self.window_bytes);
        let throughput = delta as f64 / elapsed.as_secs_f64();
        self.progress.throughput_bps = Some(throughput);
        self.window_at = Some(now);
        self.window_bytes = self.progress.bytes_copied;

        // ETA = remaining files x average file size so far / throughput.
        let copied = self.progress.files_copied;
        let remaining = self.progress.files_total.saturating_sub(copied);
        if copied > 0 && throughput > 0.0 {
            let avg_size = self.progress.bytes_copied as f64 / copied as f64;
            let eta = (remaining as f64 * avg_size / throughput).ceil();
            self.progress.eta_seconds = Some(eta as u64);
        }
    }
}

/// Thread-safe progress tracker with snapshot reads for polling callers.
pub struct ProgressTracker {
    state: RwLock<TrackerState>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TrackerState {
                progress: TransferProgress::default(),
                copy_band: (0.0, 100.0),
                window_at: None,
                window_bytes: 0,
            }),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TrackerState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("progress tracker lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TrackerState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("progress tracker lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Clear all state at the start of a run.
    pub fn reset(&self) {
        let mut state = self.write();
        let now = Utc::now();
        state.progress = TransferProgress {
            started_at: Some(now),
            updated_at: Some(now),
            ..TransferProgress::default()
        };
        state.copy_band = (0.0, 100.0);
        state.window_at = None;
        state.window_bytes = 0;
    }

    pub fn set_phase(&self, phase: TransferPhase, message: &str) {
        let mut state = self.write();
        state.progress.phase = phase;
        state.progress.message = message.to_string();
        state.touch();
    }

    pub fn set_percent(&self, percent: f64) {
        let mut state = self.write();
        state.raise_percent(percent);
        state.touch();
    }

    /// Seed per-category totals and the aggregate file denominator.
    pub fn seed_categories(&self, totals: &[(Category, u64)]) {
        let mut state = self.write();
        state.progress.categories = totals
            .iter()
            .map(|(category, files)| CategoryProgress::new(*category, *files))
            .collect();
        state.progress.files_total = totals.iter().map(|(_, files)| files).sum();
        state.progress.files_copied = 0;
        state.progress.bytes_copied = 0;
        state.window_at = None;
        state.window_bytes = 0;
        state.touch();
    }

    /// Set the percent band the copy stage completion ratio maps into.
    pub fn begin_copy_band(&self, low: f64, high: f64) {
        let mut state = self.write();
        state.copy_band = (low, high);
        state.raise_percent(low);
        state.touch();
    }

    /// Record one fully copied file for `category`.
    pub fn file_copied(&self, category: Category, name: &str, bytes: u64) {
        let mut state = self.write();
        if let Some(entry) = state
            .progress
            .categories
            .iter_mut()
            .find(|c| c.category == category)
        {
            entry.files_copied += 1;
            entry.bytes_copied += bytes;
        }
        state.progress.files_copied += 1;
        state.progress.bytes_copied += bytes;
        state.progress.message = format!("Copied {name}");

        let (low, high) = state.copy_band;
        if state.progress.files_total > 0 {
            let ratio = state.progress.files_copied as f64 / state.progress.files_total as f64;
            state.raise_percent(low + (high - low) * ratio.min(1.0));
        }
        state.recompute_throughput();
        state.touch();
    }

    pub fn mark_category_complete(&self, category: Category) {
        let mut state = self.write();
        if let Some(entry) = state
            .progress
            .categories
            .iter_mut()
            .find(|c| c.category == category)
        {
            entry.complete = true;
        }
        state.touch();
    }

    /// Aggregate (files, bytes) copied during this run.
    pub fn copy_totals(&self) -> (u64, u64) {
        let state = self.read();
        (state.progress.files_copied, state.progress.bytes_copied)
    }

    pub fn seed_tables(&self, totals: &[(&str, u64)]) {
        let mut state = self.write();
        state.progress.tables = totals
            .iter()
            .map(|(table, total)| TableProgress::new(table, *total))
            .collect();
        state.touch();
    }

    /// Stream absolute row counts for one table. `imported` is clamped so it
    /// never exceeds the seeded total.
    pub fn set_table(&self, table: &str, imported: u64, skipped: u64, failed: u64) {
        let mut state = self.write();
        if let Some(entry) = state.progress.tables.iter_mut().find(|t| t.table == table) {
            entry.imported = imported.min(entry.total);
            entry.skipped = skipped;
            entry.failed = failed;
        }
        state.touch();
    }

    /// Attach the freshly issued session to the terminal snapshot.
    pub fn attach_session(&self, session: IssuedSession) {
        let mut state = self.write();
        state.progress.session_token = Some(session.token);
        state.progress.user = Some(session.user);
        state.touch();
    }

    pub fn finish(&self, message: &str) {
        let mut state = self.write();
        state.progress.phase = TransferPhase::Done;
        state.progress.percent = 100.0;
        state.progress.message = message.to_string();
        state.touch();
    }

    pub fn fail(&self, message: String) {
        let mut state = self.write();
        state.progress.phase = TransferPhase::Error;
        state.progress.message = message;
        state.touch();
    }

    /// Cloned snapshot for polling callers.
    pub fn snapshot(&self) -> TransferProgress {
        self.read().progress.clone()
    }
}
