//! Append-only record ledger shared by the lost and found ledgers.
//!
//! Records live behind their own mutex so that settlement on one item never
//! blocks another. The outer lock only guards the id sequence.

use lostfound_types::RegistryResult;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub(crate) struct Ledger<T> {
    records: RwLock<Vec<Arc<Mutex<T>>>>,
}

impl<T: Clone> Ledger<T> {
    pub(crate) fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Assign the next id (1-based) and store the record `build` produces.
    ///
    /// `build` runs under the write lock. If it fails, no id is consumed.
    pub(crate) fn append(&self, build: impl FnOnce(u64) -> RegistryResult<T>) -> RegistryResult<u64> {
        let mut records = self.records.write();
        let id = records.len() as u64 + 1;
        let record = build(id)?;
        records.push(Arc::new(Mutex::new(record)));
        Ok(id)
    }

    /// Handle to a record's mutex. Id 0 and ids past the count are absent.
    pub(crate) fn entry(&self, id: u64) -> Option<Arc<Mutex<T>>> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.records.read().get(index).cloned()
    }

    pub(crate) fn get(&self, id: u64) -> Option<T> {
        self.entry(id).map(|record| record.lock().clone())
    }

    pub(crate) fn count(&self) -> u64 {
        self.records.read().len() as u64
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        let handles: Vec<_> = self.records.read().iter().cloned().collect();
        handles.iter().map(|record| record.lock().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lostfound_types::{RegistryError, ValidationError};

    #[test]
    fn test_ids_start_at_one() {
        let ledger = Ledger::new();
        assert_eq!(ledger.append(|id| Ok(id * 10)).unwrap(), 1);
        assert_eq!(ledger.append(|id| Ok(id * 10)).unwrap(), 2);
        assert_eq!(ledger.count(), 2);
        assert_eq!(ledger.get(2), Some(20));
        assert_eq!(ledger.get(0), None);
        assert_eq!(ledger.get(3), None);
    }

    #[test]
    fn test_failed_build_consumes_no_id() {
        let ledger: Ledger<u64> = Ledger::new();
        let err = ledger
            .append(|_| Err(RegistryError::Validation(ValidationError::single("name", "bad"))))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert_eq!(ledger.count(), 0);
        assert_eq!(ledger.append(Ok).unwrap(), 1);
    }

    #[test]
    fn test_snapshot_in_id_order() {
        let ledger = Ledger::new();
        for _ in 0..3 {
            ledger.append(Ok).unwrap();
        }
        assert_eq!(ledger.snapshot(), vec![1, 2, 3]);
    }
}
