//! Registered participants

use crate::{Identity, ValidationError, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated registration details.
///
/// Only [`UserProfile::new`] builds one, so a profile in hand has already
/// passed the username, email, and phone checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    username: String,
    email: String,
    phone: String,
}

impl UserProfile {
    pub fn new(username: &str, email: &str, phone: &str) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        let username = v.username(username);
        let email = v.email(email);
        let phone = v.phone(phone);
        v.finish()?;

        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// A registered participant. Write-once: never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The caller key the user registered under
    pub identity: Identity,
    pub username: String,
    pub email: String,
    /// Ten-digit phone number
    pub phone: String,
    /// When the registration was accepted
    pub registered_at: DateTime<Utc>,
}

impl User {
    pub fn new(identity: Identity, profile: UserProfile, registered_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            username: profile.username,
            email: profile.email,
            phone: profile.phone,
            registered_at,
        }
    }

    /// Re-derive the validated profile, e.g. when replaying a stored record.
    pub fn profile(&self) -> Result<UserProfile, ValidationError> {
        UserProfile::new(&self.username, &self.email, &self.phone)
    }
}
