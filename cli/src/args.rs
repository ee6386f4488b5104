//! Command-line arguments.

use crate::config::BackendKind;
use clap::Parser;
use std::path::PathBuf;

/// Bulk add or remove phone numbers from a named blacklist.
#[derive(Debug, Clone, Parser)]
#[command(name = "blacklist")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Text file with one msisdn per line
    pub text_file: PathBuf,

    /// `host:port` of the API or `user:password@host:port/database` of the database
    pub connection_string: String,

    /// Name of the blacklist to modify (not case sensitive)
    #[arg(default_value = "global")]
    pub blacklist_name: String,

    /// Any value switches to add mode
    #[arg(value_name = "ADD_MODE")]
    pub add_mode: Option<String>,

    /// Add the entries instead of deleting them
    #[arg(long)]
    pub add: bool,

    /// Which backend the connection string points at
    #[arg(long, value_enum, default_value_t = BackendKind::Auto)]
    pub backend: BackendKind,

    /// File holding the Authorization header value for the API
    #[arg(long, env = "BLACKLIST_AUTH_FILE", default_value = "auth.txt")]
    pub auth_file: PathBuf,

    /// Give up when no entry completes for this many seconds
    #[arg(long, env = "BLACKLIST_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Maximum number of concurrent database deletes
    #[arg(long, env = "BLACKLIST_CONCURRENCY", default_value_t = 16)]
    pub concurrency: usize,

    /// Page size used when listing blacklist entries over the API
    #[arg(long, env = "BLACKLIST_PAGE_SIZE", default_value_t = 1000)]
    pub page_size: u32,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Whether the run adds entries instead of removing them.
    pub fn add_mode(&self) -> bool {
        self.add || self.add_mode.is_some()
    }
}
