//! A single blacklist run: load, connect, resolve, reconcile.

use crate::auth::AuthToken;
use crate::backend;
use crate::config::{BackendKind, Config};
use crate::error::CliResult;
use crate::output;
use crate::progress::BarProgress;
use blacklist_engine::{
    input, Backend, Msisdn, NoProgress, Operation, Progress, ReconcileOptions, ReconcileResult,
    Reconciler,
};

/// One batch to apply to a named blacklist.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    /// Name of the blacklist, matched without regard to case
    pub blacklist: &'a str,
    /// Add or remove
    pub operation: Operation,
    /// Msisdns in input order
    pub identifiers: &'a [Msisdn],
    /// Dispatch override and stall timeout
    pub options: ReconcileOptions,
    /// Suppress status lines on stdout
    pub quiet: bool,
}

/// Execute the run described by `config`.
pub async fn run(config: &Config) -> CliResult<ReconcileResult> {
    let identifiers = input::load(&config.input)?;
    if !config.json {
        output::info(&format!("Loaded {} lines from file", identifiers.len()));
    }

    let (token, found) = AuthToken::load_or_empty(&config.auth_file);
    if !found && config.target.kind() == BackendKind::Api && !config.json {
        output::warning(&format!(
            "{} not found, sending requests without authorization",
            config.auth_file.display()
        ));
    }

    let backend = backend::connect(config, token).await?;
    tracing::info!(backend = backend.name(), "backend ready");

    let batch = Batch {
        blacklist: &config.blacklist,
        operation: config.operation,
        identifiers: &identifiers,
        options: ReconcileOptions::default().with_timeout(config.timeout),
        quiet: config.json,
    };

    if config.json {
        reconcile(backend.as_ref(), &NoProgress, &batch).await
    } else {
        let progress = BarProgress::new(&format!("{} entries", config.operation.verb()));
        reconcile(backend.as_ref(), &progress, &batch).await
    }
}

/// Resolve the blacklist and apply the batch to it.
pub async fn reconcile(
    backend: &dyn Backend,
    progress: &dyn Progress,
    batch: &Batch<'_>,
) -> CliResult<ReconcileResult> {
    let collection = backend.resolve_collection(batch.blacklist).await?;
    if !batch.quiet {
        output::info(&format!("blacklistId: {}", collection.id));
        output::info(&format!("{} entries", batch.operation.verb()));
    }

    let reconciler = Reconciler::new(backend, progress, batch.options);
    let result = reconciler
        .run(&collection, batch.operation, batch.identifiers)
        .await?;

    Ok(result)
}
