//! CLI error types and exit codes.

use std::path::PathBuf;

pub type CliResult<T> = Result<T, CliError>;

/// Exit code for a run where no entry completed within the timeout.
pub const EXIT_TIMED_OUT: u8 = 6;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("File {} does not exist", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to read input: {0}")]
    Input(String),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("{0} not found")]
    CollectionNotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// - 0: Success (individual items may still have failed)
    /// - 1: Insufficient or invalid arguments
    /// - 2: Input file not found or unreadable
    /// - 3: Invalid connection string
    /// - 4: Named blacklist not found
    /// - 5: Backend unreachable or listing failed
    /// - 6: No entry completed within the timeout ([`EXIT_TIMED_OUT`])
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 1,
            CliError::InputNotFound(_) | CliError::Input(_) => 2,
            CliError::InvalidConnectionString(_) => 3,
            CliError::CollectionNotFound(_) => 4,
            CliError::Backend(_) => 5,
        }
    }
}

impl From<blacklist_engine::Error> for CliError {
    fn from(err: blacklist_engine::Error) -> Self {
        use blacklist_engine::Error;

        match err {
            Error::FileNotFound(path) => CliError::InputNotFound(path),
            Error::Io(msg) => CliError::Input(msg),
            Error::CollectionNotFound(name) => CliError::CollectionNotFound(name),
            other => CliError::Backend(other.to_string()),
        }
    }
}
