//! Reconciliation of an identifier list against a resolved collection.
//!
//! This is the core of the engine. Given a collection and a list of
//! identifiers, it applies one mutation per identifier through a
//! [`Backend`], records an [`Outcome`] for every item and reports progress.
//!
//! # Algorithm
//!
//! 1. Plan: turn every identifier into an action. In remove mode against a
//!    backend keyed by member id, fetch the listing once and map each
//!    identifier to the members carrying its value. Identifiers without a
//!    member are planned as an immediate `NotFound`.
//! 2. Dispatch: run the actions as a stream with at most `limit` in flight
//!    (`1` for sequential backends).
//! 3. Collect: record each outcome as it completes and advance progress.
//! 4. Stall limit: if no item completes within the optional timeout, drop
//!    the stream (which cancels in-flight requests) and mark the rest
//!    `Cancelled`. The limit restarts on every completion, so a slow batch
//!    that keeps moving always runs to the end.
//!
//! A failed item never stops the batch. Only a failure to fetch the member
//! listing is returned as an error, since no removal can be planned without
//! it.

use crate::{
    error::Result, Backend, Collection, Dispatch, Member, MemberId, Msisdn, MutationRequest,
    Operation, Progress, RemovalKeying,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Result of one mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum Outcome {
    /// The backend accepted the mutation
    Succeeded,
    /// The backend rejected the mutation or could not be reached
    Failed(String),
    /// Nothing in the collection carries this identifier
    NotFound,
    /// The batch stalled past its timeout before this item completed
    Cancelled,
}

/// Outcome of a single input item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    /// Position in the input list (0-based)
    pub index: usize,
    /// The identifier
    pub msisdn: Msisdn,
    /// What happened to it
    pub outcome: Outcome,
}

impl ItemResult {
    fn new(request: &MutationRequest, outcome: Outcome) -> Self {
        Self {
            index: request.index,
            msisdn: request.msisdn.clone(),
            outcome,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    /// Operation applied to every item
    pub operation: Operation,
    /// Name of the collection the run targeted
    pub collection: String,
    /// Number of input items
    pub total: usize,
    /// Items the backend accepted
    pub succeeded: usize,
    /// Items the backend rejected
    pub failed: usize,
    /// Items with no matching member
    pub not_found: usize,
    /// Items cut off by a stall
    pub cancelled: usize,
    /// Per-item results, in input order
    pub items: Vec<ItemResult>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether the batch stalled past its timeout
    pub timed_out: bool,
}

impl ReconcileResult {
    /// Create an empty result for a run of `total` items.
    pub fn new(operation: Operation, collection: impl Into<String>, total: usize) -> Self {
        Self {
            operation,
            collection: collection.into(),
            total,
            succeeded: 0,
            failed: 0,
            not_found: 0,
            cancelled: 0,
            items: Vec::with_capacity(total),
            duration_ms: 0,
            timed_out: false,
        }
    }

    fn record(&mut self, item: ItemResult) {
        match item.outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Cancelled => self.cancelled += 1,
        }
        self.items.push(item);
    }

    /// Items that completed, whatever their outcome.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.not_found
    }

    /// Check if every item succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }

    /// Check if any item failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Items the backend rejected.
    pub fn failed_items(&self) -> impl Iterator<Item = &ItemResult> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, Outcome::Failed(_)))
    }
}

/// Tuning knobs for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOptions {
    /// Overrides the backend's preferred dispatch shape
    pub dispatch: Option<Dispatch>,
    /// Longest wait for the next item to complete
    pub timeout: Option<Duration>,
}

impl ReconcileOptions {
    /// Set the dispatch shape.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Set the stall timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What to do for one planned request.
#[derive(Debug, Clone)]
enum Action {
    Create,
    RemoveByValue,
    RemoveMembers(Vec<Member>),
    Skip(Outcome),
}

/// Applies a batch of mutations through a backend.
pub struct Reconciler<'a> {
    backend: &'a dyn Backend,
    progress: &'a dyn Progress,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    /// Create a new reconciler.
    pub fn new(
        backend: &'a dyn Backend,
        progress: &'a dyn Progress,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            backend,
            progress,
            options,
        }
    }

    /// Dispatch shape in effect for this reconciler.
    pub fn dispatch(&self) -> Dispatch {
        self.options
            .dispatch
            .unwrap_or_else(|| self.backend.dispatch())
    }

    /// Apply `operation` to every identifier.
    pub async fn run(
        &self,
        collection: &Collection,
        operation: Operation,
        identifiers: &[Msisdn],
    ) -> Result<ReconcileResult> {
        match operation {
            Operation::Create => Ok(self.add(collection, identifiers).await),
            Operation::Remove => self.remove(collection, identifiers).await,
        }
    }

    /// Create one member per identifier, in input order.
    pub async fn add(&self, collection: &Collection, identifiers: &[Msisdn]) -> ReconcileResult {
        let planned = MutationRequest::batch(identifiers, Operation::Create)
            .into_iter()
            .map(|request| (request, Action::Create))
            .collect();

        self.execute(collection, Operation::Create, planned).await
    }

    /// Remove every identifier from the collection.
    ///
    /// Fails only when the member listing needed for planning cannot be
    /// fetched.
    pub async fn remove(
        &self,
        collection: &Collection,
        identifiers: &[Msisdn],
    ) -> Result<ReconcileResult> {
        let requests = MutationRequest::batch(identifiers, Operation::Remove);

        let planned = match self.backend.removal_keying() {
            RemovalKeying::ByValue => requests
                .into_iter()
                .map(|request| (request, Action::RemoveByValue))
                .collect(),
            RemovalKeying::ByMemberId => {
                tracing::info!(
                    backend = self.backend.name(),
                    collection = %collection.name,
                    "fetching member listing"
                );
                let members = self.backend.list_members(collection).await?;
                tracing::debug!(count = members.len(), "member listing fetched");
                plan_member_removals(requests, members)
            }
        };

        Ok(self.execute(collection, Operation::Remove, planned).await)
    }

    async fn execute(
        &self,
        collection: &Collection,
        operation: Operation,
        planned: Vec<(MutationRequest, Action)>,
    ) -> ReconcileResult {
        let started = Instant::now();
        let total = planned.len();
        let dispatch = self.dispatch();
        let mut result = ReconcileResult::new(operation, collection.name.clone(), total);

        tracing::info!(
            backend = self.backend.name(),
            collection = %collection.name,
            %operation,
            total,
            ?dispatch,
            "starting batch"
        );
        self.progress.start(total as u64);

        let requests: Vec<MutationRequest> =
            planned.iter().map(|(request, _)| request.clone()).collect();
        let mut done = vec![false; total];

        let mut outcomes = stream::iter(planned.into_iter().enumerate())
            .map(|(position, (request, action))| async move {
                let outcome = self.apply(collection, &request, action).await;
                (position, outcome)
            })
            .buffer_unordered(dispatch.limit());

        let mut completed = 0u64;

        loop {
            let next = match self.options.timeout {
                Some(timeout) => match tokio::time::timeout(timeout, outcomes.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        result.timed_out = true;
                        break;
                    }
                },
                None => outcomes.next().await,
            };
            let Some((position, outcome)) = next else {
                break;
            };

            let request = &requests[position];
            if let Outcome::Failed(reason) = &outcome {
                tracing::warn!(msisdn = %request.msisdn, %reason, "mutation failed");
            }
            done[position] = true;
            result.record(ItemResult::new(request, outcome));

            completed += 1;
            self.progress.advance(completed);
        }

        // Dropping the stream cancels whatever is still in flight.
        drop(outcomes);

        if result.timed_out {
            tracing::warn!(
                completed,
                total,
                "no item completed within the timeout, cancelling outstanding requests"
            );
            for (request, _) in requests.iter().zip(&done).filter(|(_, done)| !**done) {
                result.record(ItemResult::new(request, Outcome::Cancelled));
            }
        }

        result.items.sort_by_key(|item| item.index);
        result.duration_ms = started.elapsed().as_millis() as u64;
        self.progress.finish();

        tracing::info!(
            succeeded = result.succeeded,
            failed = result.failed,
            not_found = result.not_found,
            cancelled = result.cancelled,
            duration_ms = result.duration_ms,
            "batch finished"
        );
        result
    }

    async fn apply(
        &self,
        collection: &Collection,
        request: &MutationRequest,
        action: Action,
    ) -> Outcome {
        tracing::debug!(index = request.index, msisdn = %request.msisdn, ?action, "applying");

        match action {
            Action::Skip(outcome) => outcome,
            Action::Create => match self
                .backend
                .create_member(collection, &request.msisdn)
                .await
            {
                Ok(()) => Outcome::Succeeded,
                Err(e) => Outcome::Failed(e.to_string()),
            },
            Action::RemoveByValue => match self
                .backend
                .remove_by_value(collection, &request.msisdn)
                .await
            {
                Ok(0) => Outcome::NotFound,
                Ok(_) => Outcome::Succeeded,
                Err(e) => Outcome::Failed(e.to_string()),
            },
            Action::RemoveMembers(members) => {
                for member in &members {
                    if let Err(e) = self.backend.remove_member(collection, member).await {
                        return Outcome::Failed(e.to_string());
                    }
                }
                Outcome::Succeeded
            }
        }
    }
}

/// Map each removal request to the listing members carrying its value.
///
/// A member is claimed by the first request that names it, so a repeated
/// identifier finds nothing left to remove.
fn plan_member_removals(
    requests: Vec<MutationRequest>,
    members: Vec<Member>,
) -> Vec<(MutationRequest, Action)> {
    let mut by_value: HashMap<Msisdn, Vec<Member>> = HashMap::new();
    for member in members {
        by_value.entry(member.msisdn.clone()).or_default().push(member);
    }

    let mut claimed: HashSet<MemberId> = HashSet::new();
    requests
        .into_iter()
        .map(|request| {
            let matches: Vec<Member> = by_value
                .get(&request.msisdn)
                .map(|found| {
                    found
                        .iter()
                        .filter(|member| claimed.insert(member.id))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            let action = if matches.is_empty() {
                Action::Skip(Outcome::NotFound)
            } else {
                Action::RemoveMembers(matches)
            };
            (request, action)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryBackend, NoProgress};

    fn ids(values: &[&str]) -> Vec<Msisdn> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn plan_skips_unknown_identifiers() {
        let requests = MutationRequest::batch(&ids(&["B", "D"]), Operation::Remove);
        let members = vec![Member::new(1, "A"), Member::new(2, "B"), Member::new(3, "C")];

        let planned = plan_member_removals(requests, members);

        assert!(matches!(&planned[0].1, Action::RemoveMembers(m) if m == &vec![Member::new(2, "B")]));
        assert!(matches!(&planned[1].1, Action::Skip(Outcome::NotFound)));
    }

    #[test]
    fn plan_claims_each_member_once() {
        let requests = MutationRequest::batch(&ids(&["A", "A"]), Operation::Remove);
        let members = vec![Member::new(1, "A"), Member::new(2, "A")];

        let planned = plan_member_removals(requests, members);

        assert!(matches!(&planned[0].1, Action::RemoveMembers(m) if m.len() == 2));
        assert!(matches!(&planned[1].1, Action::Skip(Outcome::NotFound)));
    }

    #[test]
    fn result_counters() {
        let mut result = ReconcileResult::new(Operation::Create, "global", 4);
        let request = MutationRequest::new(0, "1", Operation::Create);

        result.record(ItemResult::new(&request, Outcome::Succeeded));
        result.record(ItemResult::new(&request, Outcome::Failed("boom".into())));
        result.record(ItemResult::new(&request, Outcome::NotFound));
        result.record(ItemResult::new(&request, Outcome::Cancelled));

        assert_eq!(result.processed(), 3);
        assert!(result.has_failures());
        assert!(!result.all_succeeded());
        assert_eq!(result.failed_items().count(), 1);
    }

    #[test]
    fn outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Failed("status 500".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"status 500"}"#);

        let json = serde_json::to_string(&Outcome::NotFound).unwrap();
        assert_eq!(json, r#"{"status":"notFound"}"#);
    }

    #[tokio::test]
    async fn remove_by_member_id() {
        let backend = MemoryBackend::new();
        backend.add_collection(1, "Global");
        backend.add_member(1, 10, "A");
        backend.add_member(1, 11, "B");
        backend.add_member(1, 12, "C");
        let collection = backend.collection_by_name("global").unwrap();

        let reconciler = Reconciler::new(&backend, &NoProgress, ReconcileOptions::default());
        let result = reconciler.remove(&collection, &ids(&["B", "D"])).await.unwrap();

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.not_found, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(backend.member_values(1), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn dispatch_override() {
        let backend = MemoryBackend::new();
        let options = ReconcileOptions::default().with_dispatch(Dispatch::Concurrent { limit: 4 });

        let reconciler = Reconciler::new(&backend, &NoProgress, options);
        assert_eq!(reconciler.dispatch(), Dispatch::Concurrent { limit: 4 });

        let reconciler = Reconciler::new(&backend, &NoProgress, ReconcileOptions::default());
        assert_eq!(reconciler.dispatch(), backend.dispatch());
    }
}
