//! Found-item reports

use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use lostfound_types::{FoundItem, FoundItemId, Identity, ItemDescriptor, RegistryError, RegistryResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Ordered, append-only collection of found-item reports. Ids are counted
/// independently of the lost ledger.
pub struct FoundItemLedger {
    ledger: Ledger<FoundItem>,
}

impl FoundItemLedger {
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(),
        }
    }

    pub fn append(&self, finder: Identity, descriptor: ItemDescriptor) -> RegistryResult<FoundItemId> {
        self.append_at(finder, descriptor, Utc::now(), |_| Ok(()))
    }

    /// Record a report with an explicit timestamp; see
    /// [`LostItemLedger::append_at`](crate::LostItemLedger::append_at) for the
    /// `commit` contract.
    pub fn append_at(
        &self,
        finder: Identity,
        descriptor: ItemDescriptor,
        at: DateTime<Utc>,
        commit: impl FnOnce(&FoundItem) -> RegistryResult<()>,
    ) -> RegistryResult<FoundItemId> {
        let id = self.ledger.append(|id| {
            let item = FoundItem::new(FoundItemId::new(id), finder, descriptor, at);
            commit(&item)?;
            Ok(item)
        })?;

        info!(item_id = id, "Found item reported");
        Ok(FoundItemId::new(id))
    }

    pub fn get(&self, id: FoundItemId) -> Option<FoundItem> {
        self.ledger.get(id.get())
    }

    pub fn count(&self) -> u64 {
        self.ledger.count()
    }

    pub fn snapshot(&self) -> Vec<FoundItem> {
        self.ledger.snapshot()
    }

    pub(crate) fn entry(&self, id: FoundItemId) -> RegistryResult<Arc<Mutex<FoundItem>>> {
        self.ledger
            .entry(id.get())
            .ok_or(RegistryError::FoundItemNotFound(id))
    }
}

impl Default for FoundItemLedger {
    fn default() -> Self {
        Self::new()
    }
}
