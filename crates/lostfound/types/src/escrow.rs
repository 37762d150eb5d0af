//! Reward escrow entries

use crate::{Amount, Identity, LostItemId, RegistryError, RegistryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a held reward. `Held` is the only non-terminal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    #[default]
    Held,
    /// Paid out to the resolver
    Released,
    /// Withdrawn without a payout
    Forfeited,
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscrowStatus::Held => write!(f, "held"),
            EscrowStatus::Released => write!(f, "released"),
            EscrowStatus::Forfeited => write!(f, "forfeited"),
        }
    }
}

/// Reward held against one lost item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub lost_item_id: LostItemId,
    /// Reporter who pledged the reward
    pub depositor: Identity,
    /// Amount pledged at hold time; never changes
    pub pledged: Amount,
    /// Amount still in escrow; zero once the entry leaves `Held`
    pub held: Amount,
    pub status: EscrowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<Identity>,
    pub held_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl EscrowEntry {
    pub fn new(
        lost_item_id: LostItemId,
        depositor: Identity,
        amount: Amount,
        held_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lost_item_id,
            depositor,
            pledged: amount,
            held: amount,
            status: EscrowStatus::Held,
            payee: None,
            held_at,
            settled_at: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.status == EscrowStatus::Held
    }

    fn ensure_held(&self) -> RegistryResult<()> {
        if self.is_held() {
            Ok(())
        } else {
            Err(RegistryError::AlreadyReleased {
                id: self.lost_item_id,
                status: self.status,
            })
        }
    }

    /// Release the full held amount to `payee`. Returns the amount paid out.
    pub fn release(&mut self, payee: Identity, at: DateTime<Utc>) -> RegistryResult<Amount> {
        self.ensure_held()?;
        let paid = self.held;
        self.held = Amount::zero();
        self.status = EscrowStatus::Released;
        self.payee = Some(payee);
        self.settled_at = Some(at);
        Ok(paid)
    }

    /// Withdraw the held amount without paying anyone. Returns the amount withdrawn.
    pub fn forfeit(&mut self, at: DateTime<Utc>) -> RegistryResult<Amount> {
        self.ensure_held()?;
        let withdrawn = self.held;
        self.held = Amount::zero();
        self.status = EscrowStatus::Forfeited;
        self.settled_at = Some(at);
        Ok(withdrawn)
    }
}
