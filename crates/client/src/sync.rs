//! Periodic evidence snapshot polling.
//!
//! Every tick fetches the unit's full evidence list, drops keys found in
//! the deleted-key ledger and replaces the board. Fetch failures are
//! logged and skipped; the next tick simply tries again. A 401 ends the
//! loop and tells subscribers the session is gone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use ikd_core::evidence::{Evidence, EvidenceKey};
use ikd_core::units::UnitKerja;

use crate::api::ApiError;
use crate::backend::IkdBackend;
use crate::board::EvidenceBoard;
use crate::events::{PageEvent, PageEvents};
use crate::ledger::LedgerSnapshot;
use crate::scores::ScoreEditor;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Key the records of `unit` and drop everything in `deleted`.
///
/// Should a snapshot hold two records for one key, the later one wins.
pub fn merge_snapshot(
    records: Vec<Evidence>,
    deleted: &HashSet<EvidenceKey>,
    unit: UnitKerja,
) -> HashMap<EvidenceKey, Evidence> {
    records
        .into_iter()
        .filter(|r| r.unit_kerja == unit)
        .map(|r| (r.key(), r))
        .filter(|(key, _)| !deleted.contains(key))
        .collect()
}

/// Everything one poll touches.
#[derive(Clone)]
pub struct SnapshotPoller {
    pub(crate) backend: Arc<dyn IkdBackend>,
    pub(crate) unit: UnitKerja,
    pub(crate) board: Arc<EvidenceBoard>,
    pub(crate) editor: ScoreEditor,
    pub(crate) events: Arc<PageEvents>,
    pub(crate) deleted: watch::Receiver<LedgerSnapshot>,
}

impl SnapshotPoller {
    /// Fetch and apply one snapshot. Returns the number of records kept.
    pub async fn poll_once(&self) -> Result<usize, ApiError> {
        let records = self.backend.list_evidence(self.unit).await?;

        // Read the ledger after the fetch so a delete that raced with the
        // request is still filtered.
        let deleted = self.deleted.borrow().clone();
        let fresh = merge_snapshot(records, &deleted, self.unit);
        let kept = fresh.len();

        self.board
            .apply_snapshot(fresh, |key| self.editor.is_editing(key));
        self.events
            .publish(PageEvent::SnapshotApplied { records: kept });
        Ok(kept)
    }

    /// Poll every `interval` until `cancel` fires or the session expires.
    ///
    /// The first poll happens one interval after the call; the caller is
    /// expected to have loaded an initial snapshot already.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        tracing::info!(
            unit = %self.unit,
            interval_ms = interval.as_millis() as u64,
            "Evidence sync loop started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(unit = %self.unit, "Evidence sync loop stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            match self.poll_once().await {
                Ok(records) => {
                    tracing::debug!(unit = %self.unit, records, "Evidence snapshot applied");
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::warn!(unit = %self.unit, "Session expired, stopping sync loop");
                    self.events.publish(PageEvent::LoggedOut);
                    return;
                }
                Err(e) => {
                    tracing::debug!(unit = %self.unit, error = %e, "Evidence poll failed");
                }
            }
        }
    }
}

/// Clamp a configured interval into the supported range.
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}
