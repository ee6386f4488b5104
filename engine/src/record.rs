//! Collection and member types.

use crate::{CollectionId, MemberId, Msisdn};
use serde::{Deserialize, Serialize};

/// A named blacklist as resolved from a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Backend-assigned identifier
    pub id: CollectionId,
    /// Human-readable name
    pub name: String,
}

impl Collection {
    /// Create a new collection handle.
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Check whether this collection answers to `name`, ignoring case.
    pub fn matches_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Case-insensitive comparison used for every collection lookup.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// One entry inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Backend-assigned identifier
    pub id: MemberId,
    /// The phone number this entry blocks
    pub msisdn: Msisdn,
    /// Active flag, only reported by backends that have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Member {
    /// Create a new member without an active flag.
    pub fn new(id: MemberId, msisdn: impl Into<Msisdn>) -> Self {
        Self {
            id,
            msisdn: msisdn.into(),
            active: None,
        }
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Check if the entry is active. Entries without a flag count as active.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}
