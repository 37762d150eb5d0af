//! Registry facade: the single entry point for external collaborators.
//!
//! Requests arrive loosely typed and are turned into validated types here,
//! once. Every state change goes through a component's commit hook, which
//! appends the event to the journal (when one is configured) after all checks
//! pass and before anything in memory changes.

use crate::config::{RegistryConfig, SyncMode};
use crate::journal::{JournalStorage, RegistryEvent, RegistryJournal};
use crate::{ClaimSettlementEngine, FoundItemLedger, IdentityStore, LostItemLedger, RewardEscrow};
use chrono::Utc;
use lostfound_types::{
    Amount, EscrowEntry, FoundItem, FoundItemId, Identity, ItemDescriptor, ItemListing,
    ItemQuery, LostItem, LostItemId, RegistryError, RegistryResult, SettlementReceipt, User,
    UserProfile,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Registration payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
}

/// Lost-item report payload. `reward` is a decimal ether amount; absent or
/// empty means no reward.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLostItemRequest {
    pub name: String,
    pub description: String,
    pub location: String,
    pub reward: Option<String>,
}

/// Found-item report payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFoundItemRequest {
    pub name: String,
    pub description: String,
    pub location: String,
}

pub struct RegistryFacade {
    identities: IdentityStore,
    lost: Arc<LostItemLedger>,
    found: Arc<FoundItemLedger>,
    escrow: Arc<RewardEscrow>,
    engine: ClaimSettlementEngine,
    receipts: RwLock<Vec<SettlementReceipt>>,
    journal: Option<RegistryJournal>,
}

impl RegistryFacade {
    /// An empty, purely in-memory registry.
    pub fn new() -> Self {
        let lost = Arc::new(LostItemLedger::new());
        let found = Arc::new(FoundItemLedger::new());
        let escrow = Arc::new(RewardEscrow::new());
        let engine = ClaimSettlementEngine::new(lost.clone(), found.clone(), escrow.clone());
        Self {
            identities: IdentityStore::new(),
            lost,
            found,
            escrow,
            engine,
            receipts: RwLock::new(Vec::new()),
            journal: None,
        }
    }

    /// Open a registry per `config`, replaying its journal if it has one.
    pub fn open(config: &RegistryConfig) -> RegistryResult<Self> {
        match config.journal_path() {
            None => Ok(Self::new()),
            Some(path) => {
                info!(path = %path.display(), "Opening registry journal");
                let (journal, events) = RegistryJournal::open_file(path, config.sync_mode)?;
                Self::recover(journal, events)
            }
        }
    }

    /// Open over any journal storage.
    pub fn with_journal_storage(
        storage: Box<dyn JournalStorage>,
        sync_mode: SyncMode,
    ) -> RegistryResult<Self> {
        let (journal, events) = RegistryJournal::open(storage, sync_mode)?;
        Self::recover(journal, events)
    }

    fn recover(journal: RegistryJournal, events: Vec<RegistryEvent>) -> RegistryResult<Self> {
        let mut facade = Self::new();
        let replayed = events.len();
        for (index, event) in events.into_iter().enumerate() {
            let name = event.name();
            facade.replay(event).map_err(|e| {
                RegistryError::Storage(format!(
                    "journal entry {} ({}) failed to replay: {}",
                    index + 1,
                    name,
                    e
                ))
            })?;
        }
        facade.journal = Some(journal);

        info!(
            events = replayed,
            users = facade.identities.count(),
            lost_items = facade.lost.count(),
            found_items = facade.found.count(),
            "Registry recovered from journal"
        );
        Ok(facade)
    }

    // ---- Commands ----

    /// Register the caller. Each identity registers at most once.
    pub fn register_user(
        &self,
        caller: &Identity,
        request: RegisterUserRequest,
    ) -> RegistryResult<User> {
        let identity = checked_caller(caller)?;
        let profile = UserProfile::new(&request.username, &request.email, &request.phone)?;

        self.identities
            .register_at(identity, profile, Utc::now(), |user| {
                self.record(|| RegistryEvent::UserRegistered { user: user.clone() })
            })
    }

    /// Report a lost item, holding any reward in escrow.
    pub fn report_lost_item(
        &self,
        caller: &Identity,
        request: ReportLostItemRequest,
    ) -> RegistryResult<LostItemId> {
        let reporter = checked_caller(caller)?;
        let descriptor =
            ItemDescriptor::new(&request.name, &request.description, &request.location);
        let reward = request
            .reward
            .as_deref()
            .map_or(Ok(Amount::zero()), Amount::parse_ether);

        let (descriptor, reward) = match (descriptor, reward) {
            (Ok(descriptor), Ok(reward)) => (descriptor, reward),
            (Err(a), Err(b)) => return Err(a.merge(b).into()),
            (Err(e), _) | (_, Err(e)) => return Err(e.into()),
        };

        self.lost
            .append_at(reporter, descriptor, reward, Utc::now(), |item| {
                self.record(|| RegistryEvent::LostItemReported { item: item.clone() })?;
                self.hold_reward(item)
            })
    }

    pub fn report_found_item(
        &self,
        caller: &Identity,
        request: ReportFoundItemRequest,
    ) -> RegistryResult<FoundItemId> {
        let finder = checked_caller(caller)?;
        let descriptor =
            ItemDescriptor::new(&request.name, &request.description, &request.location)?;

        self.found.append_at(finder, descriptor, Utc::now(), |item| {
            self.record(|| RegistryEvent::FoundItemReported { item: item.clone() })
        })
    }

    /// Resolve a lost item; only its reporter may. Releases any reward to them.
    pub fn resolve_lost_item(
        &self,
        caller: &Identity,
        id: LostItemId,
    ) -> RegistryResult<SettlementReceipt> {
        let caller = checked_caller(caller)?;
        self.engine
            .resolve_lost_item_at(&caller, id, Utc::now(), |receipt| {
                self.record(|| RegistryEvent::LostItemResolved {
                    receipt: receipt.clone(),
                })?;
                self.receipts.write().push(receipt.clone());
                Ok(())
            })
    }

    /// Claim a found item; anyone but its finder may.
    pub fn claim_item(
        &self,
        caller: &Identity,
        id: FoundItemId,
    ) -> RegistryResult<SettlementReceipt> {
        let caller = checked_caller(caller)?;
        self.engine
            .claim_found_item_at(&caller, id, Utc::now(), |receipt| {
                self.record(|| RegistryEvent::FoundItemClaimed {
                    receipt: receipt.clone(),
                })?;
                self.receipts.write().push(receipt.clone());
                Ok(())
            })
    }

    // ---- Queries ----

    pub fn get_user(&self, identity: &Identity) -> Option<User> {
        self.identities.lookup(identity)
    }

    pub fn user_count(&self) -> usize {
        self.identities.count()
    }

    pub fn get_lost_item(&self, id: LostItemId) -> Option<LostItem> {
        self.lost.get(id)
    }

    pub fn get_found_item(&self, id: FoundItemId) -> Option<FoundItem> {
        self.found.get(id)
    }

    pub fn lost_item_count(&self) -> u64 {
        self.lost.count()
    }

    pub fn found_item_count(&self) -> u64 {
        self.found.count()
    }

    pub fn escrow(&self, id: LostItemId) -> Option<EscrowEntry> {
        self.escrow.get(id)
    }

    /// Rewards currently held across all open lost items.
    pub fn total_escrowed(&self) -> Amount {
        self.escrow.total_held()
    }

    /// Settlement receipts in the order they were issued.
    pub fn receipts(&self) -> Vec<SettlementReceipt> {
        self.receipts.read().clone()
    }

    /// Lost items 1..=n, then found items 1..=m, narrowed by `query`.
    pub fn list_items(&self, query: &ItemQuery) -> Vec<ItemListing> {
        let lost = self
            .lost
            .snapshot()
            .into_iter()
            .filter(|item| query.matches_lost(item))
            .map(ItemListing::Lost);
        let found = self
            .found
            .snapshot()
            .into_iter()
            .filter(|item| query.matches_found(item))
            .map(ItemListing::Found);
        lost.chain(found).collect()
    }

    /// Whether state changes are journaled.
    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    // ---- Internals ----

    fn record(&self, event: impl FnOnce() -> RegistryEvent) -> RegistryResult<()> {
        if let Some(journal) = &self.journal {
            let event = event();
            let sequence = journal.append(&event)?;
            debug!(sequence, event = event.name(), "Registry event journaled");
        }
        Ok(())
    }

    fn hold_reward(&self, item: &LostItem) -> RegistryResult<()> {
        if item.reward.is_zero() {
            return Ok(());
        }
        self.escrow
            .hold_at(item.id, item.reporter.clone(), item.reward, item.reported_at)
    }

    /// Re-apply a journaled event through the same components, checks, and
    /// id assignment as the live path.
    fn replay(&self, event: RegistryEvent) -> RegistryResult<()> {
        match event {
            RegistryEvent::UserRegistered { user } => {
                let profile = user.profile()?;
                self.identities.register_at(
                    user.identity.clone(),
                    profile,
                    user.registered_at,
                    |_| Ok(()),
                )?;
            }
            RegistryEvent::LostItemReported { item } => {
                let descriptor = item.descriptor()?;
                self.lost.append_at(
                    item.reporter.clone(),
                    descriptor,
                    item.reward,
                    item.reported_at,
                    |assigned| {
                        expect_same_id("lost item", item.id.get(), assigned.id.get())?;
                        self.hold_reward(assigned)
                    },
                )?;
            }
            RegistryEvent::FoundItemReported { item } => {
                let descriptor = item.descriptor()?;
                self.found.append_at(
                    item.finder.clone(),
                    descriptor,
                    item.reported_at,
                    |assigned| expect_same_id("found item", item.id.get(), assigned.id.get()),
                )?;
            }
            RegistryEvent::LostItemResolved { receipt } => {
                self.engine.resolve_lost_item_at(
                    &receipt.actor,
                    LostItemId::new(receipt.item_id),
                    receipt.timestamp,
                    |issued| expect_same_payout(&receipt, issued),
                )?;
                self.receipts.write().push(receipt);
            }
            RegistryEvent::FoundItemClaimed { receipt } => {
                self.engine.claim_found_item_at(
                    &receipt.actor,
                    FoundItemId::new(receipt.item_id),
                    receipt.timestamp,
                    |_| Ok(()),
                )?;
                self.receipts.write().push(receipt);
            }
        }
        Ok(())
    }
}

impl Default for RegistryFacade {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_caller(caller: &Identity) -> RegistryResult<Identity> {
    Identity::parse(caller.as_str())
}

fn expect_same_id(kind: &str, recorded: u64, assigned: u64) -> RegistryResult<()> {
    if recorded == assigned {
        Ok(())
    } else {
        Err(RegistryError::Storage(format!(
            "{} recorded as id {} replayed as id {}",
            kind, recorded, assigned
        )))
    }
}

fn expect_same_payout(recorded: &SettlementReceipt, issued: &SettlementReceipt) -> RegistryResult<()> {
    if recorded.payout == issued.payout {
        Ok(())
    } else {
        Err(RegistryError::Storage(format!(
            "receipt {} recorded payout {:?} but replay released {:?}",
            recorded.receipt_id, recorded.payout, issued.payout
        )))
    }
}
