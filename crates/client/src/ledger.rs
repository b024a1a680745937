//! Deleted-key ledger.
//!
//! Records which `(lecturer, activity)` pairs had their evidence explicitly
//! deleted so a snapshot fetched before the delete cannot bring the row
//! back. Markers are persisted through the backend and survive a reload.
//!
//! The ledger has a single owner (the page session) that mutates it.
//! Readers such as the sync loop hold a [`watch::Receiver`] and only ever
//! see immutable snapshots.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use ikd_core::evidence::{DeletedKey, EvidenceKey};
use ikd_core::units::UnitKerja;

use crate::api::ApiError;
use crate::backend::IkdBackend;

pub type LedgerSnapshot = Arc<HashSet<EvidenceKey>>;

pub struct DeletedKeyLedger {
    unit: UnitKerja,
    keys: HashSet<EvidenceKey>,
    tx: watch::Sender<LedgerSnapshot>,
}

impl DeletedKeyLedger {
    pub fn new(unit: UnitKerja, keys: impl IntoIterator<Item = EvidenceKey>) -> Self {
        let keys: HashSet<EvidenceKey> = keys.into_iter().collect();
        let (tx, _) = watch::channel(Arc::new(keys.clone()));
        Self { unit, keys, tx }
    }

    /// Load the persisted markers for `unit`.
    pub async fn load(backend: &dyn IkdBackend, unit: UnitKerja) -> Result<Self, ApiError> {
        let markers = backend.list_deleted_keys(unit).await?;
        let keys = markers
            .into_iter()
            .filter(|m| m.unit_kerja == unit)
            .map(|m| m.key());
        let ledger = Self::new(unit, keys);
        tracing::debug!(unit = %unit, markers = ledger.len(), "Deleted-key ledger loaded");
        Ok(ledger)
    }

    pub fn unit(&self) -> UnitKerja {
        self.unit
    }

    pub fn contains(&self, key: &EvidenceKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.tx.subscribe()
    }

    /// Mark `key` as deleted.
    ///
    /// The local set changes first so a poll landing while the marker is
    /// being persisted already filters the key. A persistence failure is
    /// returned but the local marker stays.
    pub async fn mark(&mut self, backend: &dyn IkdBackend, key: EvidenceKey) -> Result<(), ApiError> {
        if self.keys.insert(key) {
            self.publish();
        }
        backend.mark_deleted(&DeletedKey::new(key, self.unit)).await
    }

    /// Clear the marker for `key` after a new upload.
    ///
    /// As with [`mark`](Self::mark), the local set changes first.
    pub async fn unmark(
        &mut self,
        backend: &dyn IkdBackend,
        key: EvidenceKey,
    ) -> Result<(), ApiError> {
        if self.keys.remove(&key) {
            self.publish();
        }
        backend.unmark_deleted(&DeletedKey::new(key, self.unit)).await
    }

    /// Drop a local marker without touching the backend. Used to roll back
    /// a mark whose delete call failed.
    pub fn forget(&mut self, key: &EvidenceKey) {
        if self.keys.remove(key) {
            self.publish();
        }
    }

    fn publish(&self) {
        self.tx.send_replace(Arc::new(self.keys.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBackend;

    #[tokio::test]
    async fn load_keeps_only_this_unit() {
        let fake = FakeBackend::new();
        fake.seed_deleted_key(DeletedKey::new(EvidenceKey::new(1, 1), UnitKerja::Akademik));
        fake.seed_deleted_key(DeletedKey::new(EvidenceKey::new(2, 2), UnitKerja::Sdm));

        let ledger = DeletedKeyLedger::load(&fake, UnitKerja::Akademik).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(&EvidenceKey::new(1, 1)));
    }

    #[tokio::test]
    async fn mark_and_unmark_persist_and_publish() {
        let fake = FakeBackend::new();
        let mut ledger = DeletedKeyLedger::new(UnitKerja::Akademik, []);
        let rx = ledger.subscribe();
        let key = EvidenceKey::new(3, 4);

        ledger.mark(&fake, key).await.unwrap();
        assert!(rx.borrow().contains(&key));
        assert!(fake
            .deleted_keys()
            .contains(&DeletedKey::new(key, UnitKerja::Akademik)));

        ledger.unmark(&fake, key).await.unwrap();
        assert!(!rx.borrow().contains(&key));
        assert!(fake.deleted_keys().is_empty());
    }

    #[tokio::test]
    async fn local_mark_survives_backend_failure() {
        let fake = FakeBackend::new();
        fake.expire_session();
        let mut ledger = DeletedKeyLedger::new(UnitKerja::Sdm, []);
        let key = EvidenceKey::new(1, 2);

        assert!(ledger.mark(&fake, key).await.is_err());
        assert!(ledger.contains(&key));

        ledger.forget(&key);
        assert!(ledger.snapshot().is_empty());
    }
}
