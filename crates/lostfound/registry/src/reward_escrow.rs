//! Reward escrow for lost-item reports
//!
//! A reward pledged with a lost-item report is held here until the reporter
//! resolves the item, at which point the full amount is released exactly once.

use chrono::{DateTime, Utc};
use lostfound_types::{
    Amount, EscrowEntry, Identity, LostItemId, RegistryError, RegistryResult, ValidationError,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

pub struct RewardEscrow {
    entries: RwLock<HashMap<LostItemId, EscrowEntry>>,
}

impl RewardEscrow {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Hold `amount` against a lost item.
    pub fn hold(&self, id: LostItemId, depositor: Identity, amount: Amount) -> RegistryResult<()> {
        self.hold_at(id, depositor, amount, Utc::now())
    }

    pub fn hold_at(
        &self,
        id: LostItemId,
        depositor: Identity,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> RegistryResult<()> {
        if amount.is_zero() {
            return Err(RegistryError::Validation(ValidationError::single(
                "reward",
                "escrowed reward must be greater than zero",
            )));
        }

        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(RegistryError::InvariantViolation(format!(
                "escrow already exists for lost item {}",
                id
            )));
        }
        entries.insert(id, EscrowEntry::new(id, depositor, amount, at));

        info!(item_id = %id, amount = %amount, "Reward held in escrow");
        Ok(())
    }

    /// Release the held reward to `payee`. Returns the amount paid out.
    pub fn release(&self, id: LostItemId, payee: Identity) -> RegistryResult<Amount> {
        self.settle_at(id, payee, Utc::now(), Ok)
    }

    /// Withdraw the held reward without a payout.
    pub fn forfeit(&self, id: LostItemId) -> RegistryResult<Amount> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&id).ok_or(RegistryError::NoEscrow(id))?;
        let amount = entry.forfeit(Utc::now())?;

        info!(item_id = %id, amount = %amount, "Escrowed reward forfeited");
        Ok(amount)
    }

    pub fn get(&self, id: LostItemId) -> Option<EscrowEntry> {
        self.entries.read().get(&id).cloned()
    }

    /// Sum of every amount still in escrow.
    pub fn total_held(&self) -> Amount {
        self.entries
            .read()
            .values()
            .fold(Amount::zero(), |total, entry| total.saturating_add(entry.held))
    }

    /// Release under the escrow lock. `commit` receives the amount about to be
    /// paid out after every precondition has passed; the entry only changes if
    /// `commit` succeeds, and its output is handed back to the caller.
    pub(crate) fn settle_at<R>(
        &self,
        id: LostItemId,
        payee: Identity,
        at: DateTime<Utc>,
        commit: impl FnOnce(Amount) -> RegistryResult<R>,
    ) -> RegistryResult<R> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&id).ok_or(RegistryError::NoEscrow(id))?;
        if !entry.is_held() {
            return Err(RegistryError::AlreadyReleased {
                id,
                status: entry.status,
            });
        }

        let output = commit(entry.held)?;
        let amount = entry.release(payee.clone(), at)?;

        info!(item_id = %id, payee = %payee, amount = %amount, "Escrowed reward released");
        Ok(output)
    }
}

impl Default for RewardEscrow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lostfound_types::EscrowStatus;

    #[test]
    fn test_hold_and_release() {
        let escrow = RewardEscrow::new();
        let id = LostItemId::new(1);
        escrow.hold(id, Identity::new("alice"), Amount::new(100)).unwrap();
        assert_eq!(escrow.total_held(), Amount::new(100));

        let paid = escrow.release(id, Identity::new("alice")).unwrap();
        assert_eq!(paid, Amount::new(100));
        assert_eq!(escrow.total_held(), Amount::zero());

        let entry = escrow.get(id).unwrap();
        assert_eq!(entry.status, EscrowStatus::Released);
        assert_eq!(entry.payee, Some(Identity::new("alice")));
    }

    #[test]
    fn test_second_release_fails() {
        let escrow = RewardEscrow::new();
        let id = LostItemId::new(1);
        escrow.hold(id, Identity::new("alice"), Amount::new(100)).unwrap();
        escrow.release(id, Identity::new("alice")).unwrap();

        let err = escrow.release(id, Identity::new("alice")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyReleased {
                id,
                status: EscrowStatus::Released
            }
        );
    }

    #[test]
    fn test_release_without_hold() {
        let escrow = RewardEscrow::new();
        let err = escrow
            .release(LostItemId::new(7), Identity::new("alice"))
            .unwrap_err();
        assert_eq!(err, RegistryError::NoEscrow(LostItemId::new(7)));
    }

    #[test]
    fn test_hold_rejects_zero_and_duplicates() {
        let escrow = RewardEscrow::new();
        let id = LostItemId::new(1);

        let err = escrow.hold(id, Identity::new("alice"), Amount::zero()).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(escrow.get(id).is_none());

        escrow.hold(id, Identity::new("alice"), Amount::new(1)).unwrap();
        let err = escrow.hold(id, Identity::new("alice"), Amount::new(1)).unwrap_err();
        assert!(matches!(err, RegistryError::InvariantViolation(_)));
        assert_eq!(escrow.get(id).unwrap().pledged, Amount::new(1));
    }

    #[test]
    fn test_forfeit_blocks_release() {
        let escrow = RewardEscrow::new();
        let id = LostItemId::new(1);
        escrow.hold(id, Identity::new("alice"), Amount::new(40)).unwrap();

        assert_eq!(escrow.forfeit(id).unwrap(), Amount::new(40));
        let err = escrow.release(id, Identity::new("alice")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyReleased {
                id,
                status: EscrowStatus::Forfeited
            }
        );
    }

    #[test]
    fn test_failed_commit_keeps_reward_held() {
        let escrow = RewardEscrow::new();
        let id = LostItemId::new(1);
        escrow.hold(id, Identity::new("alice"), Amount::new(40)).unwrap();

        let result: RegistryResult<()> = escrow.settle_at(id, Identity::new("alice"), Utc::now(), |_| {
            Err(RegistryError::Storage("journal closed".into()))
        });
        assert!(result.is_err());
        assert!(escrow.get(id).unwrap().is_held());
        assert_eq!(escrow.total_held(), Amount::new(40));
    }
}
