//! Blacklist CLI - bulk add or remove msisdns from a named blacklist.
//!
//! Talks either to the HTTP API or straight to the PostgreSQL database and
//! drives the blacklist-engine reconciler against it.

pub mod args;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod output;
pub mod progress;
pub mod run;
