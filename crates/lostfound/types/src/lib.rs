//! Lost & Found Domain Types
//!
//! This crate defines the domain types for the Lost & Found registry:
//! participants who register an identity, report lost or found items, and
//! settle ownership through resolution and claims.
//!
//! # Key Concepts
//!
//! - **Identity**: the external caller key every action is attributed to.
//! - **Lost item**: a report by an owner, optionally backed by a reward.
//!   Only its reporter may resolve it.
//! - **Found item**: a report by a finder. Anyone but the finder may claim it.
//! - **Escrow entry**: the reward pledged against a lost item, released
//!   exactly once on resolution.
//! - **Settlement receipt**: the record every successful resolve or claim
//!   leaves behind.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime state. Validated inputs
//! ([`UserProfile`], [`ItemDescriptor`], [`Amount`]) can only be built through
//! their checking constructors, so downstream stores never see malformed data.

#![deny(unsafe_code)]

mod amount;
mod errors;
mod escrow;
mod ids;
mod item;
mod receipt;
mod user;
mod validation;

pub use amount::*;
pub use errors::*;
pub use escrow::*;
pub use ids::*;
pub use item::*;
pub use receipt::*;
pub use user::*;
pub use validation::*;
