//! Registered users, keyed by identity

use chrono::{DateTime, Utc};
use lostfound_types::{Identity, RegistryError, RegistryResult, User, UserProfile};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

/// Write-once map from identity to user.
pub struct IdentityStore {
    users: RwLock<HashMap<Identity, User>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register `identity` with an already validated profile.
    pub fn register(&self, identity: Identity, profile: UserProfile) -> RegistryResult<User> {
        self.register_at(identity, profile, Utc::now(), |_| Ok(()))
    }

    /// Register with an explicit timestamp. `commit` runs after the duplicate
    /// check and before the insert; its failure leaves the store unchanged.
    pub fn register_at(
        &self,
        identity: Identity,
        profile: UserProfile,
        at: DateTime<Utc>,
        commit: impl FnOnce(&User) -> RegistryResult<()>,
    ) -> RegistryResult<User> {
        let mut users = self.users.write();
        if users.contains_key(&identity) {
            return Err(RegistryError::AlreadyRegistered(identity));
        }

        let user = User::new(identity.clone(), profile, at);
        commit(&user)?;
        users.insert(identity, user.clone());

        info!(identity = %user.identity, username = %user.username, "User registered");
        Ok(user)
    }

    pub fn lookup(&self, identity: &Identity) -> Option<User> {
        self.users.read().get(identity).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.read().len()
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}
