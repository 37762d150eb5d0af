//! Lost & Found Registry - item registry and claim settlement engine
//!
//! The registry stores registered users and lost/found item reports, enforces
//! who may settle what, and holds rewards in escrow until a lost item is
//! resolved.
//!
//! # Components
//!
//! - [`IdentityStore`]: write-once users keyed by identity
//! - [`LostItemLedger`] / [`FoundItemLedger`]: append-only reports with
//!   independent 1-based ids
//! - [`RewardEscrow`]: rewards pledged against lost items
//! - [`ClaimSettlementEngine`]: resolve and claim, serialized per item
//! - [`RegistryFacade`]: the single writer and entry point for collaborators
//!
//! # Durability
//!
//! With a data directory configured, every state change is appended to a
//! write-ahead journal ([`RegistryJournal`]) before it is applied, and the
//! journal is replayed on open.
//!
//! # Lock order
//!
//! ledger id sequence → item → escrow → journal → receipts. Nothing holds a
//! lock across anything but the journal append.

#![deny(unsafe_code)]

pub mod config;
pub mod facade;
pub mod journal;

mod found_ledger;
mod identity_store;
mod ledger;
mod lost_ledger;
mod reward_escrow;
mod settlement_engine;

pub use config::{RegistryConfig, SyncMode, DEFAULT_JOURNAL_FILE};
pub use facade::{
    RegisterUserRequest, RegistryFacade, ReportFoundItemRequest, ReportLostItemRequest,
};
pub use found_ledger::FoundItemLedger;
pub use identity_store::IdentityStore;
pub use journal::{
    FileJournalStorage, JournalError, JournalStorage, MemoryJournalStorage, RegistryEvent,
    RegistryJournal,
};
pub use lost_ledger::LostItemLedger;
pub use reward_escrow::RewardEscrow;
pub use settlement_engine::ClaimSettlementEngine;

pub use lostfound_types as types;
