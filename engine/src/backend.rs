//! Backend capability trait.
//!
//! A backend is anything that can resolve a blacklist by name, list its
//! entries, create an entry and remove one. The reconciler depends only on
//! this trait; concrete transports live outside the engine.

use crate::{error::Result, Collection, Error, Member};
use async_trait::async_trait;

/// How a backend identifies the entry to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalKeying {
    /// Removal needs the backend-assigned member id, so the member listing
    /// is fetched once before the remove pass.
    ByMemberId,
    /// Removal is keyed by the identifier value directly.
    ByValue,
}

/// How many mutations may be in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// One request at a time; completions arrive in input order.
    Sequential,
    /// Up to `limit` requests in flight; completions arrive in any order.
    Concurrent { limit: usize },
}

impl Dispatch {
    /// Maximum number of in-flight mutations.
    pub fn limit(&self) -> usize {
        match self {
            Dispatch::Sequential => 1,
            Dispatch::Concurrent { limit } => (*limit).max(1),
        }
    }
}

/// Uniform capability set over every backend kind.
///
/// Implementations must be safe to call with overlapping in-flight requests
/// when they advertise [`Dispatch::Concurrent`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// How this backend keys removals.
    fn removal_keying(&self) -> RemovalKeying;

    /// Preferred dispatch shape for mutation batches.
    fn dispatch(&self) -> Dispatch {
        Dispatch::Sequential
    }

    /// Find a collection by name, ignoring case.
    ///
    /// Returns [`Error::CollectionNotFound`] when nothing matches.
    async fn resolve_collection(&self, name: &str) -> Result<Collection>;

    /// List every member of a collection.
    async fn list_members(&self, collection: &Collection) -> Result<Vec<Member>>;

    /// Create a member with the given value.
    async fn create_member(&self, collection: &Collection, msisdn: &str) -> Result<()>;

    /// Remove a member previously returned by [`Backend::list_members`].
    async fn remove_member(&self, collection: &Collection, member: &Member) -> Result<()>;

    /// Remove every member with the given value.
    ///
    /// Returns the number of removed members; zero means nothing matched.
    async fn remove_by_value(&self, collection: &Collection, msisdn: &str) -> Result<u64> {
        let _ = (collection, msisdn);
        Err(Error::Unsupported("remove by value".to_string()))
    }
}
