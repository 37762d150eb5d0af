//! Claim settlement: resolving lost items and claiming found items
//!
//! Every settlement runs while holding the item's own mutex, so concurrent
//! attempts on one item serialize and exactly one of them wins. Escrow release
//! happens inside that critical section, under the escrow lock.

use crate::{FoundItemLedger, LostItemLedger, RewardEscrow};
use chrono::{DateTime, Utc};
use lostfound_types::{
    FoundItemId, Identity, LostItemId, RegistryError, RegistryResult, SettlementReceipt,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ClaimSettlementEngine {
    lost: Arc<LostItemLedger>,
    found: Arc<FoundItemLedger>,
    escrow: Arc<RewardEscrow>,
}

impl ClaimSettlementEngine {
    pub fn new(
        lost: Arc<LostItemLedger>,
        found: Arc<FoundItemLedger>,
        escrow: Arc<RewardEscrow>,
    ) -> Self {
        Self { lost, found, escrow }
    }

    /// Mark a lost item resolved and release any escrowed reward to the caller.
    ///
    /// Only the reporter may resolve. Checks run in order: not found,
    /// unauthorized, already resolved.
    pub fn resolve_lost_item(
        &self,
        caller: &Identity,
        id: LostItemId,
    ) -> RegistryResult<SettlementReceipt> {
        self.resolve_lost_item_at(caller, id, Utc::now(), |_| Ok(()))
    }

    /// [`resolve_lost_item`](Self::resolve_lost_item) with an explicit
    /// timestamp. `commit` sees the receipt after every check has passed and
    /// before anything changes; if it fails, nothing changes.
    pub fn resolve_lost_item_at(
        &self,
        caller: &Identity,
        id: LostItemId,
        at: DateTime<Utc>,
        commit: impl FnOnce(&SettlementReceipt) -> RegistryResult<()>,
    ) -> RegistryResult<SettlementReceipt> {
        let entry = self.lost.entry(id)?;
        let mut item = entry.lock();

        if item.reporter != *caller {
            warn!(item_id = %id, caller = %caller, "Resolve rejected: caller is not the reporter");
            return Err(RegistryError::Unauthorized {
                caller: caller.clone(),
                action: format!("resolve lost item {}", id),
            });
        }
        if !item.is_open() {
            warn!(item_id = %id, caller = %caller, "Resolve rejected: already resolved");
            return Err(RegistryError::AlreadyResolved(id));
        }

        let receipt = SettlementReceipt::lost_item_resolved(id, caller.clone(), at);
        let receipt = if item.reward.is_zero() {
            commit(&receipt)?;
            receipt
        } else {
            self.escrow.settle_at(id, caller.clone(), at, |amount| {
                let receipt = receipt.with_payout(amount);
                commit(&receipt)?;
                Ok(receipt)
            })?
        };

        item.mark_resolved(at)?;

        info!(
            item_id = %id,
            caller = %caller,
            payout = %receipt.payout.unwrap_or_default(),
            "Lost item resolved"
        );
        Ok(receipt)
    }

    /// Mark a found item claimed by the caller.
    ///
    /// Anyone except the finder may claim. Checks run in order: not found,
    /// unauthorized, already claimed.
    pub fn claim_found_item(
        &self,
        caller: &Identity,
        id: FoundItemId,
    ) -> RegistryResult<SettlementReceipt> {
        self.claim_found_item_at(caller, id, Utc::now(), |_| Ok(()))
    }

    pub fn claim_found_item_at(
        &self,
        caller: &Identity,
        id: FoundItemId,
        at: DateTime<Utc>,
        commit: impl FnOnce(&SettlementReceipt) -> RegistryResult<()>,
    ) -> RegistryResult<SettlementReceipt> {
        let entry = self.found.entry(id)?;
        let mut item = entry.lock();

        if item.finder == *caller {
            warn!(item_id = %id, caller = %caller, "Claim rejected: finder cannot claim");
            return Err(RegistryError::Unauthorized {
                caller: caller.clone(),
                action: format!("claim found item {} they reported", id),
            });
        }
        if !item.is_open() {
            warn!(item_id = %id, caller = %caller, "Claim rejected: already claimed");
            return Err(RegistryError::AlreadyClaimed(id));
        }

        let receipt = SettlementReceipt::found_item_claimed(id, caller.clone(), at);
        commit(&receipt)?;
        item.mark_claimed(caller.clone(), at)?;

        info!(item_id = %id, claimant = %caller, "Found item claimed");
        Ok(receipt)
    }
}
