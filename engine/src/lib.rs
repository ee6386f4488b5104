//! # Blacklist Engine
//!
//! Batch reconciliation of phone-number (MSISDN) entries against a named
//! blacklist.
//!
//! This crate holds the logic that takes a list of target numbers, resolves
//! them against an existing blacklist and applies the required mutations
//! (create or remove) with per-item outcome tracking and progress feedback.
//!
//! ## Design Principles
//!
//! - **No transport**: the engine knows nothing about HTTP or SQL. Backends
//!   plug in through the [`Backend`] capability trait.
//! - **Partial-failure tolerant**: a failed item never aborts the batch.
//! - **Explicit outcomes**: every input identifier ends up with an
//!   [`Outcome`], including "not found" and "cancelled".
//!
//! ## Core Concepts
//!
//! ### Collections and Members
//!
//! A [`Collection`] is a named blacklist; a [`Member`] is one entry in it.
//! Collection names are matched case-insensitively.
//!
//! ### Operations
//!
//! A run is either in add mode or remove mode:
//! - [`Operation::Create`] - add every identifier to the collection
//! - [`Operation::Remove`] - remove every identifier from the collection
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] drives a [`Backend`] for each [`MutationRequest`],
//! reports to a [`Progress`] sink and accumulates a [`ReconcileResult`].
//! Mutations are dispatched either one at a time or with bounded fan-out,
//! see [`Dispatch`].
//!
//! ## Quick Start
//!
//! ```rust
//! use blacklist_engine::{
//!     input, MemoryBackend, NoProgress, Operation, ReconcileOptions, Reconciler,
//! };
//!
//! # tokio_test_block(async {
//! let backend = MemoryBackend::new();
//! backend.add_collection(1, "Global");
//! backend.add_member(1, 10, "38640111222");
//!
//! let identifiers = input::parse_identifiers("38640111222\n38640999888\n");
//! let collection = backend.collection_by_name("global").unwrap();
//!
//! let reconciler = Reconciler::new(&backend, &NoProgress, ReconcileOptions::default());
//! let result = reconciler
//!     .run(&collection, Operation::Remove, &identifiers)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.succeeded, 1);
//! assert_eq!(result.not_found, 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod input;
pub mod memory;
pub mod operation;
pub mod progress;
pub mod reconcile;
pub mod record;

// Re-export main types at crate root
pub use backend::{Backend, Dispatch, RemovalKeying};
pub use error::Error;
pub use memory::MemoryBackend;
pub use operation::{MutationRequest, Operation};
pub use progress::{NoProgress, Progress};
pub use reconcile::{ItemResult, Outcome, ReconcileOptions, ReconcileResult, Reconciler};
pub use record::{Collection, Member};

/// Type aliases for clarity
pub type Msisdn = String;
pub type CollectionId = i64;
pub type MemberId = i64;
