//! Plot-history autofill.
//!
//! A lookup is an explicit task keyed by sample index and plot id. Issuing a
//! new lookup for a sample cancels the one in flight, and a result is only
//! merged into fields that are still empty.

use super::models::{HistoryFill, LookupKey, PlotHistoryEntry};
use crate::config::Config;
use crate::samples::models::SampleDraft;
use crate::store::SubmissionStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Plot ids are matched trimmed and upper-cased
pub fn normalize_plot_id(plot_id: &str) -> String {
    plot_id.trim().to_uppercase()
}

/// Copies crop, previous crop and yield goal from `entry` into whichever of
/// those fields are blank on `sample`. Never overwrites user input.
pub fn merge_history(sample: &mut SampleDraft, entry: &PlotHistoryEntry) -> HistoryFill {
    fn fill(target: &mut String, source: Option<&String>) -> bool {
        match source.map(|value| value.trim()) {
            Some(value) if target.trim().is_empty() && !value.is_empty() => {
                *target = value.to_string();
                true
            }
            _ => false,
        }
    }

    HistoryFill {
        crop: fill(&mut sample.crop, entry.crop.as_ref()),
        previous_crop: fill(&mut sample.previous_crop, entry.previous_crop.as_ref()),
        yield_goal: fill(&mut sample.yield_goal, entry.yield_goal.as_ref()),
    }
}

struct PendingLookup {
    key: LookupKey,
    token: CancellationToken,
    handle: JoinHandle<Option<PlotHistoryEntry>>,
}

/// Debounced, cancellable history lookups, at most one per sample.
///
/// Lookups run on the tokio runtime, so [`request`](Self::request) must be
/// called from within one.
pub struct PlotHistoryLookup {
    store: Arc<dyn SubmissionStore>,
    debounce: Duration,
    min_plot_id_len: usize,
    pending: HashMap<usize, PendingLookup>,
}

impl PlotHistoryLookup {
    pub fn new(store: Arc<dyn SubmissionStore>, config: &Config) -> Self {
        Self {
            store,
            debounce: config.history_debounce(),
            min_plot_id_len: config.history_min_plot_id_len,
            pending: HashMap::new(),
        }
    }

    /// Starts a lookup for `sample_index`, superseding any earlier one.
    /// Returns `false` when the plot id is too short to look up.
    pub fn request(&mut self, sample_index: usize, plot_id: &str) -> bool {
        self.cancel(sample_index);

        let plot_id = normalize_plot_id(plot_id);
        if plot_id.chars().count() < self.min_plot_id_len {
            debug!("Plot id '{plot_id}' too short for a history lookup");
            return false;
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let store = Arc::clone(&self.store);
        let debounce = self.debounce;
        let task_plot_id = plot_id.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => return None,
                () = tokio::time::sleep(debounce) => {}
            }
            tokio::select! {
                () = task_token.cancelled() => None,
                result = store.lookup_plot_history(&task_plot_id) => match result {
                    Ok(entries) => entries.into_iter().next(),
                    Err(e) => {
                        warn!("Plot history lookup for '{task_plot_id}' failed: {e}");
                        None
                    }
                },
            }
        });

        self.pending.insert(
            sample_index,
            PendingLookup {
                key: LookupKey {
                    sample_index,
                    plot_id,
                },
                token,
                handle,
            },
        );
        true
    }

    pub fn is_pending(&self, sample_index: usize) -> bool {
        self.pending.contains_key(&sample_index)
    }

    pub fn pending_key(&self, sample_index: usize) -> Option<&LookupKey> {
        self.pending.get(&sample_index).map(|pending| &pending.key)
    }

    pub fn cancel(&mut self, sample_index: usize) {
        if let Some(pending) = self.pending.remove(&sample_index) {
            debug!("Cancelled history lookup for '{}'", pending.key.plot_id);
            pending.token.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.token.cancel();
        }
    }

    /// Cancels the lookup of a removed sample and re-keys lookups of the
    /// samples that moved up one position
    pub fn sample_removed(&mut self, sample_index: usize) {
        self.cancel(sample_index);
        let mut moved: Vec<usize> = self
            .pending
            .keys()
            .copied()
            .filter(|index| *index > sample_index)
            .collect();
        // Ascending, so each slot is vacated before the next lookup moves in
        moved.sort_unstable();
        for index in moved {
            if let Some(mut pending) = self.pending.remove(&index) {
                pending.key.sample_index = index - 1;
                self.pending.insert(index - 1, pending);
            }
        }
    }

    /// Waits for the lookup of `sample_index`. `None` when nothing was
    /// pending, nothing was found, or the lookup failed.
    pub async fn finish(&mut self, sample_index: usize) -> Option<(LookupKey, PlotHistoryEntry)> {
        let pending = self.pending.remove(&sample_index)?;
        match pending.handle.await {
            Ok(Some(entry)) => Some((pending.key, entry)),
            Ok(None) => None,
            Err(e) => {
                warn!("History lookup task for '{}' failed: {e}", pending.key.plot_id);
                None
            }
        }
    }
}

impl Drop for PlotHistoryLookup {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
