//! Operation types for expressing mutations.
//!
//! A run applies one uniform [`Operation`] to every identifier of the input
//! list. Each identifier becomes a [`MutationRequest`] that remembers its
//! position so outcomes can be reported in input order.

use crate::Msisdn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The mutation applied to every identifier of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Add the identifier to the collection
    Create,
    /// Remove the identifier from the collection
    Remove,
}

impl Operation {
    /// Present-participle label used in status lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "Adding",
            Operation::Remove => "Deleting",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Remove => write!(f, "remove"),
        }
    }
}

/// One identifier queued against a resolved collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    /// Position in the input list (0-based)
    pub index: usize,
    /// The identifier to mutate
    pub msisdn: Msisdn,
    /// What to do with it
    pub operation: Operation,
}

impl MutationRequest {
    /// Create a new request.
    pub fn new(index: usize, msisdn: impl Into<Msisdn>, operation: Operation) -> Self {
        Self {
            index,
            msisdn: msisdn.into(),
            operation,
        }
    }

    /// Build the requests for a whole run, preserving input order.
    pub fn batch(identifiers: &[Msisdn], operation: Operation) -> Vec<Self> {
        identifiers
            .iter()
            .enumerate()
            .map(|(index, msisdn)| Self::new(index, msisdn.clone(), operation))
            .collect()
    }
}
