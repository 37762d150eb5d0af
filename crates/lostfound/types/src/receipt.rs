//! Settlement receipts

use crate::{Amount, FoundItemId, Identity, ItemKind, LostItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a settlement did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementAction {
    /// The reporter resolved a lost item (and any reward was released)
    LostItemResolved,
    /// An owner claimed a found item
    FoundItemClaimed,
}

impl SettlementAction {
    pub fn item_kind(&self) -> ItemKind {
        match self {
            SettlementAction::LostItemResolved => ItemKind::Lost,
            SettlementAction::FoundItemClaimed => ItemKind::Found,
        }
    }
}

impl std::fmt::Display for SettlementAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementAction::LostItemResolved => write!(f, "lost_item_resolved"),
            SettlementAction::FoundItemClaimed => write!(f, "found_item_claimed"),
        }
    }
}

/// Record of one successful resolution or claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Unique receipt id (UUID v4)
    pub receipt_id: String,
    pub action: SettlementAction,
    /// Lost or found item id, per `action`
    pub item_id: u64,
    /// The identity that performed the settlement
    pub actor: Identity,
    /// Reward released, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<Amount>,
    pub timestamp: DateTime<Utc>,
}

impl SettlementReceipt {
    pub fn lost_item_resolved(id: LostItemId, actor: Identity, at: DateTime<Utc>) -> Self {
        Self::new(SettlementAction::LostItemResolved, id.get(), actor, at)
    }

    pub fn found_item_claimed(id: FoundItemId, actor: Identity, at: DateTime<Utc>) -> Self {
        Self::new(SettlementAction::FoundItemClaimed, id.get(), actor, at)
    }

    fn new(action: SettlementAction, item_id: u64, actor: Identity, at: DateTime<Utc>) -> Self {
        Self {
            receipt_id: uuid::Uuid::new_v4().to_string(),
            action,
            item_id,
            actor,
            payout: None,
            timestamp: at,
        }
    }

    pub fn with_payout(mut self, payout: Amount) -> Self {
        self.payout = Some(payout);
        self
    }

    /// Keep a previously issued receipt id (journal replay).
    pub fn with_receipt_id(mut self, receipt_id: impl Into<String>) -> Self {
        self.receipt_id = receipt_id.into();
        self
    }
}
