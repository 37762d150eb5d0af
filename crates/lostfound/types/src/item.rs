//! Lost and found item reports

use crate::{Amount, FoundItemId, Identity, LostItemId, RegistryError, RegistryResult};
use crate::{ValidationError, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated name, description, and location of a reported item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemDescriptor {
    name: String,
    description: String,
    location: String,
}

impl ItemDescriptor {
    /// Build a descriptor; every field must be non-blank.
    pub fn new(name: &str, description: &str, location: &str) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        let name = v.required("name", name);
        let description = v.required("description", description);
        let location = v.required("location", location);
        v.finish()?;

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            location: location.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Which ledger an item lives in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Lost,
    Found,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Lost => write!(f, "lost"),
            ItemKind::Found => write!(f, "found"),
        }
    }
}

/// A lost-item report, optionally backed by a reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostItem {
    pub id: LostItemId,
    pub name: String,
    pub description: String,
    pub location: String,
    /// The owner who reported the loss; the only identity that may resolve it
    pub reporter: Identity,
    /// Reward pledged at report time (zero when none)
    pub reward: Amount,
    pub reported_at: DateTime<Utc>,
    /// One-way: false until resolved, then true forever
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl LostItem {
    pub fn new(
        id: LostItemId,
        reporter: Identity,
        descriptor: ItemDescriptor,
        reward: Amount,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: descriptor.name,
            description: descriptor.description,
            location: descriptor.location,
            reporter,
            reward,
            reported_at,
            resolved: false,
            resolved_at: None,
        }
    }

    /// Re-derive the validated descriptor, e.g. when replaying a stored record.
    pub fn descriptor(&self) -> Result<ItemDescriptor, ValidationError> {
        ItemDescriptor::new(&self.name, &self.description, &self.location)
    }

    pub fn is_open(&self) -> bool {
        !self.resolved
    }

    /// Terminal transition Open → Resolved.
    pub fn mark_resolved(&mut self, at: DateTime<Utc>) -> RegistryResult<()> {
        if self.resolved {
            return Err(RegistryError::AlreadyResolved(self.id));
        }
        self.resolved = true;
        self.resolved_at = Some(at);
        Ok(())
    }
}

/// A found-item report awaiting its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundItem {
    pub id: FoundItemId,
    pub name: String,
    pub description: String,
    pub location: String,
    /// Who found the item; the one identity that may not claim it
    pub finder: Identity,
    pub reported_at: DateTime<Utc>,
    /// One-way: false until claimed, then true forever
    pub claimed: bool,
    /// The owner the claim is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimant: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl FoundItem {
    pub fn new(
        id: FoundItemId,
        finder: Identity,
        descriptor: ItemDescriptor,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: descriptor.name,
            description: descriptor.description,
            location: descriptor.location,
            finder,
            reported_at,
            claimed: false,
            claimant: None,
            claimed_at: None,
        }
    }

    /// Re-derive the validated descriptor, e.g. when replaying a stored record.
    pub fn descriptor(&self) -> Result<ItemDescriptor, ValidationError> {
        ItemDescriptor::new(&self.name, &self.description, &self.location)
    }

    pub fn is_open(&self) -> bool {
        !self.claimed
    }

    /// Terminal transition Open → Claimed, bound to the claiming owner.
    pub fn mark_claimed(&mut self, claimant: Identity, at: DateTime<Utc>) -> RegistryResult<()> {
        if self.claimed {
            return Err(RegistryError::AlreadyClaimed(self.id));
        }
        self.claimed = true;
        self.claimant = Some(claimant);
        self.claimed_at = Some(at);
        Ok(())
    }
}

/// Which reports a listing includes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemFilter {
    #[default]
    All,
    Lost,
    Found,
}

impl ItemFilter {
    pub fn includes(&self, kind: ItemKind) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Lost => kind == ItemKind::Lost,
            ItemFilter::Found => kind == ItemKind::Found,
        }
    }
}

/// A listing request: kind filter plus free-text search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemQuery {
    #[serde(default)]
    pub filter: ItemFilter,
    #[serde(default)]
    pub search: String,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Case-insensitive substring match on name, description, or location.
    /// A blank search matches everything.
    fn matches_text(&self, name: &str, description: &str, location: &str) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || [name, description, location]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn matches_lost(&self, item: &LostItem) -> bool {
        self.filter.includes(ItemKind::Lost)
            && self.matches_text(&item.name, &item.description, &item.location)
    }

    pub fn matches_found(&self, item: &FoundItem) -> bool {
        self.filter.includes(ItemKind::Found)
            && self.matches_text(&item.name, &item.description, &item.location)
    }
}

/// One entry of a combined listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemListing {
    Lost(LostItem),
    Found(FoundItem),
}

impl ItemListing {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemListing::Lost(_) => ItemKind::Lost,
            ItemListing::Found(_) => ItemKind::Found,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            ItemListing::Lost(item) => item.id.get(),
            ItemListing::Found(item) => item.id.get(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ItemListing::Lost(item) => &item.name,
            ItemListing::Found(item) => &item.name,
        }
    }

    /// Reporter of a lost item or finder of a found item
    pub fn reported_by(&self) -> &Identity {
        match self {
            ItemListing::Lost(item) => &item.reporter,
            ItemListing::Found(item) => &item.finder,
        }
    }

    /// Resolved (lost) or claimed (found)
    pub fn is_settled(&self) -> bool {
        match self {
            ItemListing::Lost(item) => item.resolved,
            ItemListing::Found(item) => item.claimed,
        }
    }
}
