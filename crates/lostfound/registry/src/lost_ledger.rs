//! Lost-item reports

use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use lostfound_types::{
    Amount, Identity, ItemDescriptor, LostItem, LostItemId, RegistryError, RegistryResult,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Ordered, append-only collection of lost-item reports.
pub struct LostItemLedger {
    ledger: Ledger<LostItem>,
}

impl LostItemLedger {
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(),
        }
    }

    /// Record a new report. Returns its id, starting at 1.
    pub fn append(
        &self,
        reporter: Identity,
        descriptor: ItemDescriptor,
        reward: Amount,
    ) -> RegistryResult<LostItemId> {
        self.append_at(reporter, descriptor, reward, Utc::now(), |_| Ok(()))
    }

    /// Record a report with an explicit timestamp.
    ///
    /// `commit` sees the finished record while the id sequence is locked; if it
    /// fails the id is not consumed and the report is not stored.
    pub fn append_at(
        &self,
        reporter: Identity,
        descriptor: ItemDescriptor,
        reward: Amount,
        at: DateTime<Utc>,
        commit: impl FnOnce(&LostItem) -> RegistryResult<()>,
    ) -> RegistryResult<LostItemId> {
        let id = self.ledger.append(|id| {
            let item = LostItem::new(LostItemId::new(id), reporter, descriptor, reward, at);
            commit(&item)?;
            Ok(item)
        })?;

        info!(item_id = id, reward = %reward, "Lost item reported");
        Ok(LostItemId::new(id))
    }

    pub fn get(&self, id: LostItemId) -> Option<LostItem> {
        self.ledger.get(id.get())
    }

    /// Highest assigned id; zero when empty.
    pub fn count(&self) -> u64 {
        self.ledger.count()
    }

    /// Every report in id order.
    pub fn snapshot(&self) -> Vec<LostItem> {
        self.ledger.snapshot()
    }

    pub(crate) fn entry(&self, id: LostItemId) -> RegistryResult<Arc<Mutex<LostItem>>> {
        self.ledger
            .entry(id.get())
            .ok_or(RegistryError::LostItemNotFound(id))
    }
}

impl Default for LostItemLedger {
    fn default() -> Self {
        Self::new()
    }
}
