//! In-memory backend.
//!
//! Holds collections and members in process memory and records every call
//! it receives. It follows the same contract as the network backends and is
//! what the engine's own tests run against. Failures, latency and the
//! removal keying can be configured to imitate either backend shape.

use crate::{
    error::Result, record::names_match, Backend, Collection, CollectionId, Dispatch, Error,
    Member, MemberId, Msisdn, RemovalKeying,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A call received by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Resolve(String),
    List(CollectionId),
    Create(Msisdn),
    Deactivate(MemberId),
    Delete(MemberId),
    DeleteByValue(Msisdn),
}

#[derive(Debug, Default)]
struct State {
    collections: Vec<Collection>,
    members: HashMap<CollectionId, Vec<Member>>,
    next_member_id: MemberId,
    failing: HashSet<Msisdn>,
    fail_listing: bool,
    calls: Vec<Call>,
}

/// Backend keeping everything in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    keying: RemovalKeying,
    dispatch: Dispatch,
    supports_create: bool,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend keyed by member id with sequential dispatch.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_member_id: 1_000,
                ..State::default()
            }),
            keying: RemovalKeying::ByMemberId,
            dispatch: Dispatch::Sequential,
            supports_create: true,
            latency: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Set the removal keying.
    pub fn with_keying(mut self, keying: RemovalKeying) -> Self {
        self.keying = keying;
        self
    }

    /// Set the preferred dispatch shape.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Delay every mutation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject every create with [`Error::Unsupported`].
    pub fn without_create(mut self) -> Self {
        self.supports_create = false;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a collection.
    pub fn add_collection(&self, id: CollectionId, name: &str) {
        let mut state = self.state();
        state.collections.push(Collection::new(id, name));
        state.members.entry(id).or_default();
    }

    /// Add a member to a collection.
    pub fn add_member(&self, collection: CollectionId, id: MemberId, msisdn: &str) {
        self.state()
            .members
            .entry(collection)
            .or_default()
            .push(Member::new(id, msisdn).with_active(true));
    }

    /// Make every mutation naming `msisdn` fail.
    pub fn fail_on(&self, msisdn: &str) {
        self.state().failing.insert(msisdn.to_string());
    }

    /// Make listing requests fail.
    pub fn fail_listing(&self) {
        self.state().fail_listing = true;
    }

    /// Look up a collection without recording a call.
    pub fn collection_by_name(&self, name: &str) -> Option<Collection> {
        self.state()
            .collections
            .iter()
            .find(|c| c.matches_name(name))
            .cloned()
    }

    /// Values of a collection's members, in insertion order.
    pub fn member_values(&self, collection: CollectionId) -> Vec<Msisdn> {
        self.state()
            .members
            .get(&collection)
            .map(|members| members.iter().map(|m| m.msisdn.clone()).collect())
            .unwrap_or_default()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Highest number of mutations observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }

    fn check_failing(&self, msisdn: &str, action: &str) -> Result<()> {
        if self.state().failing.contains(msisdn) {
            return Err(Error::status(format!("{} {}", action, msisdn), 500));
        }
        Ok(())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn removal_keying(&self) -> RemovalKeying {
        self.keying
    }

    fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    async fn resolve_collection(&self, name: &str) -> Result<Collection> {
        let mut state = self.state();
        state.calls.push(Call::Resolve(name.to_string()));
        state
            .collections
            .iter()
            .find(|c| names_match(&c.name, name))
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    async fn list_members(&self, collection: &Collection) -> Result<Vec<Member>> {
        let mut state = self.state();
        state.calls.push(Call::List(collection.id));
        if state.fail_listing {
            return Err(Error::Transport("listing unavailable".to_string()));
        }
        Ok(state
            .members
            .get(&collection.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_member(&self, collection: &Collection, msisdn: &str) -> Result<()> {
        let _guard = self.enter().await;
        self.state().calls.push(Call::Create(msisdn.to_string()));
        if !self.supports_create {
            return Err(Error::Unsupported("create member".to_string()));
        }
        self.check_failing(msisdn, "create")?;

        let mut state = self.state();
        let id = state.next_member_id;
        state.next_member_id += 1;
        state
            .members
            .entry(collection.id)
            .or_default()
            .push(Member::new(id, msisdn).with_active(true));
        Ok(())
    }

    async fn remove_member(&self, collection: &Collection, member: &Member) -> Result<()> {
        let _guard = self.enter().await;
        if member.is_active() {
            self.state().calls.push(Call::Deactivate(member.id));
            self.check_failing(&member.msisdn, "deactivate")?;
        } else {
            self.check_failing(&member.msisdn, "delete")?;
        }

        let mut state = self.state();
        state.calls.push(Call::Delete(member.id));
        let members = state.members.entry(collection.id).or_default();
        match members.iter().position(|m| m.id == member.id) {
            Some(position) => {
                members.remove(position);
                Ok(())
            }
            None => Err(Error::status(format!("delete entry {}", member.id), 404)),
        }
    }

    async fn remove_by_value(&self, collection: &Collection, msisdn: &str) -> Result<u64> {
        if self.keying != RemovalKeying::ByValue {
            return Err(Error::Unsupported("remove by value".to_string()));
        }
        let _guard = self.enter().await;
        self.state().calls.push(Call::DeleteByValue(msisdn.to_string()));
        self.check_failing(msisdn, "delete")?;

        let mut state = self.state();
        let members = state.members.entry(collection.id).or_default();
        let before = members.len();
        members.retain(|m| m.msisdn != msisdn);
        Ok((before - members.len()) as u64)
    }
}
