//! One coordinator's view of one unit's IKD page.
//!
//! [`UnitPage::open`] loads the deleted-key ledger, roster and catalog,
//! applies a first evidence snapshot and starts the background sync loop.
//! The returned `Arc` is shared by whatever drives the page; every
//! operation takes `&self`.
//!
//! User-facing failures are published as [`PageEvent::Alert`]; a 401 from
//! any call publishes [`PageEvent::LoggedOut`]. Call
//! [`UnitPage::subscribe`] to receive them.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ikd_core::catalog::{CatalogTree, ParentIndicator};
use ikd_core::error::CoreError;
use ikd_core::evidence::{Evidence, EvidenceKey};
use ikd_core::pagination::{page_range, Paginator};
use ikd_core::report::ReportAggregate;
use ikd_core::roster::{self, Lecturer};
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;
use ikd_core::upload::{validate_upload, UploadFile};

use crate::api::ApiError;
use crate::backend::IkdBackend;
use crate::board::EvidenceBoard;
use crate::config::PageConfig;
use crate::download::download_to;
use crate::error::{ClientError, ClientResult};
use crate::events::{PageEvent, PageEvents};
use crate::ledger::DeletedKeyLedger;
use crate::loader::load_roster_and_catalog;
use crate::scores::ScoreEditor;
use crate::sync::SnapshotPoller;

/// How long [`UnitPage::shutdown`] waits for the sync loop to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const STALE_MARKER_MESSAGE: &str = "Bukti tersimpan, tetapi penanda hapus gagal dibersihkan";

/// One page of the filtered roster table.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterPage {
    pub rows: Vec<Lecturer>,
    /// 1-indexed.
    pub page: usize,
    pub total_pages: usize,
    /// Rows matching the query across all pages.
    pub total: usize,
}

/// One score cell of a lecturer's row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCell {
    pub activity_id: DbId,
    pub label: String,
    /// Only cells backed by uploaded evidence accept input.
    pub editable: bool,
    pub draft: String,
    pub file_name: Option<String>,
}

pub struct UnitPage {
    backend: Arc<dyn IkdBackend>,
    config: PageConfig,
    roster: Vec<Lecturer>,
    catalog: CatalogTree,
    paginator: Mutex<Paginator>,
    board: Arc<EvidenceBoard>,
    /// Single writer; the sync loop only reads its watch snapshots.
    ledger: AsyncMutex<DeletedKeyLedger>,
    editor: ScoreEditor,
    poller: SnapshotPoller,
    events: Arc<PageEvents>,
    cancel: CancellationToken,
    sync_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for UnitPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitPage").field("config", &self.config).finish_non_exhaustive()
    }
}

impl UnitPage {
    /// Load everything the page needs and start polling.
    ///
    /// Fails when the initial loads fail. A failed first snapshot is only
    /// fatal for an expired session; otherwise the loop fills the board on
    /// its next tick.
    pub async fn open(backend: Arc<dyn IkdBackend>, config: PageConfig) -> ClientResult<Arc<Self>> {
        let unit = config.unit;
        let paginator = Paginator::new(config.page_size)?;

        let (ledger, loaded) = futures::try_join!(
            DeletedKeyLedger::load(backend.as_ref(), unit),
            load_roster_and_catalog(backend.as_ref(), unit, config.content_rule),
        )?;

        let board = Arc::new(EvidenceBoard::new());
        let events = Arc::new(PageEvents::default());
        let editor = ScoreEditor::new(
            Arc::clone(&backend),
            unit,
            Arc::clone(&board),
            Arc::clone(&events),
            config.score_debounce,
        );
        let poller = SnapshotPoller {
            backend: Arc::clone(&backend),
            unit,
            board: Arc::clone(&board),
            editor: editor.clone(),
            events: Arc::clone(&events),
            deleted: ledger.subscribe(),
        };

        match poller.poll_once().await {
            Ok(records) => tracing::debug!(unit = %unit, records, "Initial evidence snapshot"),
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => tracing::warn!(unit = %unit, error = %e, "Initial evidence snapshot failed"),
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            poller
                .clone()
                .run(config.poll_interval, cancel.child_token()),
        );

        tracing::info!(
            unit = %unit,
            lecturers = loaded.roster.len(),
            activities = loaded.catalog.page_len(),
            deleted_keys = ledger.len(),
            "Unit page opened",
        );

        Ok(Arc::new(Self {
            backend,
            config,
            roster: loaded.roster,
            catalog: loaded.catalog,
            paginator: Mutex::new(paginator),
            board,
            ledger: AsyncMutex::new(ledger),
            editor,
            poller,
            events,
            cancel,
            sync_task: Mutex::new(Some(handle)),
        }))
    }

    pub fn unit(&self) -> UnitKerja {
        self.config.unit
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn roster(&self) -> &[Lecturer] {
        &self.roster
    }

    pub fn catalog(&self) -> &CatalogTree {
        &self.catalog
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    // ---- roster table ----

    fn paginator(&self) -> MutexGuard<'_, Paginator> {
        self.paginator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `query` and jump to `page`. A changed query always lands on
    /// page 1 regardless of `page`.
    pub fn roster_page(&self, query: &str, page: usize) -> RosterPage {
        let mut paginator = self.paginator();
        let changed = paginator.query() != query;
        paginator.set_query(query);
        if !changed {
            paginator.set_page(page);
        }
        self.render_roster(&paginator)
    }

    pub fn search_roster(&self, query: &str) -> RosterPage {
        let mut paginator = self.paginator();
        paginator.set_query(query);
        self.render_roster(&paginator)
    }

    pub fn goto_roster_page(&self, page: usize) -> RosterPage {
        let mut paginator = self.paginator();
        paginator.set_page(page);
        self.render_roster(&paginator)
    }

    pub fn roster_view(&self) -> RosterPage {
        self.render_roster(&self.paginator())
    }

    fn render_roster(&self, paginator: &Paginator) -> RosterPage {
        let matches = roster::search(&self.roster, paginator.query());
        let total = matches.len();
        let total_pages = paginator.total_pages(total);
        let page = paginator.page();
        RosterPage {
            rows: matches[page_range(page, paginator.page_size(), total)]
                .iter()
                .map(|l| (*l).clone())
                .collect(),
            page,
            total_pages,
            total,
        }
    }

    /// A lecturer's profile, from the roster or fetched when absent.
    pub async fn lecturer_profile(&self, lecturer_id: DbId) -> ClientResult<Lecturer> {
        if let Some(lecturer) = self.roster.iter().find(|l| l.id == lecturer_id) {
            return Ok(lecturer.clone());
        }
        self.backend
            .get_user(lecturer_id)
            .await
            .map_err(|e| self.surface(e.into()))
    }

    // ---- score cells ----

    pub fn evidence(&self, key: &EvidenceKey) -> Option<Evidence> {
        self.board.evidence(key)
    }

    pub fn evidence_snapshot(&self) -> Vec<Evidence> {
        self.board.evidence_snapshot()
    }

    pub fn draft(&self, key: &EvidenceKey) -> String {
        self.board.draft(key)
    }

    pub fn is_editing(&self, key: &EvidenceKey) -> bool {
        self.editor.is_editing(key)
    }

    /// The score cells of `lecturer_id`'s row, one per catalog page entry.
    pub fn row(&self, lecturer_id: DbId) -> Vec<ScoreCell> {
        self.catalog
            .page()
            .map(|activity| {
                let key = EvidenceKey::new(lecturer_id, activity.id);
                let record = self.board.evidence(&key);
                ScoreCell {
                    activity_id: activity.id,
                    label: activity.label.clone(),
                    editable: record.is_some(),
                    draft: self.board.draft(&key),
                    file_name: record.map(|r| r.file_name),
                }
            })
            .collect()
    }

    /// Type into a score cell. Rejected for cells without evidence.
    pub fn edit_score(&self, key: EvidenceKey, text: impl Into<String>) -> ClientResult<()> {
        self.editor.edit(key, text)?;
        Ok(())
    }

    pub fn parent_indicator(&self, activity_id: DbId) -> ClientResult<ParentIndicator> {
        Ok(self.catalog.parent_indicator(activity_id)?)
    }

    // ---- evidence files ----

    /// Upload (or replace) the evidence file for `key`.
    ///
    /// Validation failures return without any network call and without an
    /// alert; the caller shows them inline.
    pub async fn upload_evidence(&self, key: EvidenceKey, file: UploadFile) -> ClientResult<Evidence> {
        validate_upload(&file)?;

        let record = self
            .backend
            .upload_evidence(key, self.config.unit, &file)
            .await
            .map_err(|e| self.surface(e.into()))?;

        let unmarked = {
            let mut ledger = self.ledger.lock().await;
            ledger.unmark(self.backend.as_ref(), key).await
        };
        self.board.insert(record.clone());
        self.events.publish(PageEvent::EvidenceUploaded { key });

        tracing::info!(
            key = %key,
            evidence_id = record.id,
            file_name = %record.file_name,
            bytes = file.bytes.len(),
            "Evidence uploaded",
        );

        // The upload itself succeeded; a stale marker only costs an alert.
        if let Err(e) = unmarked {
            tracing::warn!(key = %key, error = %e, "Failed to clear deleted-key marker");
            if e.is_unauthorized() {
                self.events.publish(PageEvent::LoggedOut);
            } else {
                self.events.alert(STALE_MARKER_MESSAGE);
            }
        }
        Ok(record)
    }

    /// Delete the evidence for `key` and keep it from coming back.
    ///
    /// The key is marked before the backend delete so a poll landing in
    /// between already filters it. A failed delete rolls the marker back.
    pub async fn delete_evidence(&self, key: EvidenceKey) -> ClientResult<()> {
        let record = self.board.evidence(&key).ok_or(CoreError::NoEvidence {
            lecturer_id: key.lecturer_id,
            activity_id: key.activity_id,
        })?;
        self.editor.cancel(&key);

        let mut ledger = self.ledger.lock().await;
        let marked = ledger.mark(self.backend.as_ref(), key).await;

        match self.backend.delete_evidence(record.id).await {
            Ok(()) => {}
            Err(ApiError::Api { status: 404, .. }) => {
                tracing::debug!(key = %key, evidence_id = record.id, "Evidence already gone");
            }
            Err(e) => {
                let rollback = if marked.is_ok() {
                    ledger.unmark(self.backend.as_ref(), key).await
                } else {
                    ledger.forget(&key);
                    Ok(())
                };
                if let Err(rollback_err) = rollback {
                    tracing::warn!(key = %key, error = %rollback_err, "Failed to roll back deleted-key marker");
                }
                return Err(self.surface(e.into()));
            }
        }
        drop(ledger);

        if let Err(e) = marked {
            // The local marker still shields this session.
            tracing::warn!(key = %key, error = %e, "Failed to persist deleted-key marker");
        }

        self.board.remove(&key);
        self.events.publish(PageEvent::EvidenceDeleted { key });
        tracing::info!(key = %key, evidence_id = record.id, "Evidence deleted");
        Ok(())
    }

    /// Save the evidence file for `key` into `dir`.
    pub async fn download_evidence(&self, key: EvidenceKey, dir: &Path) -> ClientResult<PathBuf> {
        let record = self.board.evidence(&key).ok_or(CoreError::NoEvidence {
            lecturer_id: key.lecturer_id,
            activity_id: key.activity_id,
        })?;
        download_to(self.backend.as_ref(), &record, dir)
            .await
            .map_err(|e| self.surface(e))
    }

    // ---- report + lifecycle ----

    /// Aggregate the current evidence of this unit.
    pub fn report(&self) -> ReportAggregate {
        ReportAggregate::build(&self.catalog, &self.roster, &self.board.evidence_snapshot())
    }

    /// Poll immediately instead of waiting for the next tick.
    pub async fn poll_now(&self) -> ClientResult<usize> {
        self.poller
            .poll_once()
            .await
            .map_err(|e| self.surface(e.into()))
    }

    /// Stop the sync loop and drop pending score edits.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.editor.shutdown();

        let handle = self
            .sync_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!(unit = %self.config.unit, "Sync loop did not stop in time");
            }
        }
        tracing::info!(unit = %self.config.unit, "Unit page closed");
    }

    /// Publish the user-facing side of `err` and hand it back.
    fn surface(&self, err: ClientError) -> ClientError {
        if err.is_unauthorized() {
            self.events.publish(PageEvent::LoggedOut);
        } else {
            self.events.alert(err.alert_message());
        }
        err
    }
}

impl Drop for UnitPage {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.editor.shutdown();
    }
}
