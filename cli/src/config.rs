//! Run configuration.
//!
//! Everything a run needs is collected into [`Config`] up front and passed
//! to the backend constructors.

use crate::args::Args;
use crate::error::CliError;
use blacklist_engine::Operation;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const API_PATTERN: &str = r"^([A-Za-z0-9.\-]+):([0-9]{1,5})$";
const DATASTORE_PATTERN: &str = r"^([^:@/]+):(.*)@([A-Za-z0-9.\-]+):([0-9]{1,5})/([^/\s]+)$";

/// Which backend a connection string points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Datastore form if the string contains `@`, API form otherwise
    Auto,
    /// HTTP API
    Api,
    /// PostgreSQL database
    Db,
}

/// Location of the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    pub host: String,
    pub port: u16,
}

impl ApiTarget {
    /// Base URL every endpoint hangs off.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Location and credentials of the database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatastoreTarget {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl fmt::Debug for DatastoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatastoreTarget")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for DatastoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// A parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Api(ApiTarget),
    Datastore(DatastoreTarget),
}

impl ConnectionTarget {
    /// Parse a connection string of the given kind.
    pub fn parse(input: &str, kind: BackendKind) -> Result<Self, CliError> {
        let kind = match kind {
            BackendKind::Auto if input.contains('@') => BackendKind::Db,
            BackendKind::Auto => BackendKind::Api,
            other => other,
        };

        match kind {
            BackendKind::Db => parse_datastore(input).map(ConnectionTarget::Datastore),
            _ => parse_api(input).map(ConnectionTarget::Api),
        }
    }

    /// Kind of backend this target needs.
    pub fn kind(&self) -> BackendKind {
        match self {
            ConnectionTarget::Api(_) => BackendKind::Api,
            ConnectionTarget::Datastore(_) => BackendKind::Db,
        }
    }
}

fn invalid(input: &str) -> CliError {
    CliError::InvalidConnectionString(input.to_string())
}

fn compile(pattern: &str) -> Result<Regex, CliError> {
    Regex::new(pattern).map_err(|e| CliError::Usage(format!("bad connection pattern: {}", e)))
}

fn parse_port(input: &str, port: &str) -> Result<u16, CliError> {
    port.parse().map_err(|_| invalid(input))
}

/// Parse `host:port`, also accepting a leading `http://` and trailing `/`.
fn parse_api(input: &str) -> Result<ApiTarget, CliError> {
    let address = input
        .strip_prefix("http://")
        .unwrap_or(input)
        .trim_end_matches('/');
    let captures = compile(API_PATTERN)?
        .captures(address)
        .ok_or_else(|| invalid(input))?;

    Ok(ApiTarget {
        host: captures[1].to_string(),
        port: parse_port(input, &captures[2])?,
    })
}

fn parse_datastore(input: &str) -> Result<DatastoreTarget, CliError> {
    let captures = compile(DATASTORE_PATTERN)?
        .captures(input)
        .ok_or_else(|| invalid(input))?;

    Ok(DatastoreTarget {
        user: captures[1].to_string(),
        password: captures[2].to_string(),
        host: captures[3].to_string(),
        port: parse_port(input, &captures[4])?,
        database: captures[5].to_string(),
    })
}

/// Configuration for a single run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Newline-delimited msisdn list
    pub input: PathBuf,
    /// Where the blacklist lives
    pub target: ConnectionTarget,
    /// Name of the blacklist to modify
    pub blacklist: String,
    /// Add or remove
    pub operation: Operation,
    /// File holding the API Authorization header value
    pub auth_file: PathBuf,
    /// Longest wait for the next entry to complete, also used per HTTP request
    pub timeout: Duration,
    /// Maximum concurrent database deletes
    pub concurrency: usize,
    /// Page size for API entry listings
    pub page_size: u32,
    /// Print the summary as JSON
    pub json: bool,
}

impl Config {
    /// Validate arguments into a configuration.
    ///
    /// The input file is checked before the connection string, and neither
    /// check touches the network.
    pub fn from_args(args: Args) -> Result<Self, CliError> {
        if !args.text_file.exists() {
            return Err(CliError::InputNotFound(args.text_file));
        }

        let target = ConnectionTarget::parse(&args.connection_string, args.backend)?;

        let operation = if args.add_mode() {
            Operation::Create
        } else {
            Operation::Remove
        };

        Ok(Self {
            input: args.text_file,
            target,
            blacklist: args.blacklist_name,
            operation,
            auth_file: args.auth_file,
            timeout: Duration::from_secs(args.timeout_secs.max(1)),
            concurrency: args.concurrency.max(1),
            page_size: args.page_size.max(1),
            json: args.json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_api_target() {
        let target = ConnectionTarget::parse("localhost:8877", BackendKind::Auto).unwrap();
        assert_eq!(
            target,
            ConnectionTarget::Api(ApiTarget {
                host: "localhost".into(),
                port: 8877,
            })
        );
        assert_eq!(target.kind(), BackendKind::Api);
    }

    #[test]
    fn parse_api_target_with_scheme() {
        let target = ConnectionTarget::parse("http://localhost:8877/", BackendKind::Auto).unwrap();
        assert_eq!(
            target,
            ConnectionTarget::Api(ApiTarget {
                host: "localhost".into(),
                port: 8877,
            })
        );

        let err = ConnectionTarget::parse("https://localhost:8877", BackendKind::Auto).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn api_base_url() {
        let target = ApiTarget {
            host: "10.0.0.5".into(),
            port: 80,
        };
        assert_eq!(target.base_url(), "http://10.0.0.5:80");
    }

    #[test]
    fn parse_datastore_target() {
        let target =
            ConnectionTarget::parse("mgw:s3cr@t@db.local:5432/mgw", BackendKind::Auto).unwrap();
        match target {
            ConnectionTarget::Datastore(db) => {
                assert_eq!(db.user, "mgw");
                assert_eq!(db.password, "s3cr@t");
                assert_eq!(db.host, "db.local");
                assert_eq!(db.port, 5432);
                assert_eq!(db.database, "mgw");
                assert_eq!(db.to_string(), "mgw@db.local:5432/mgw");
                assert!(!format!("{:?}", db).contains("s3cr@t"));
            }
            other => panic!("expected datastore target, got {:?}", other),
        }
    }

    #[test]
    fn reject_malformed_strings() {
        for input in [
            "not-a-valid-string",
            "localhost",
            "localhost:",
            "localhost:99999",
            "local host:80",
            "user@host:5432/db",
            "user:pw@host/db",
        ] {
            let err = ConnectionTarget::parse(input, BackendKind::Auto).unwrap_err();
            assert_eq!(err.exit_code(), 3, "{}", input);
        }
    }

    #[test]
    fn explicit_backend_kind_wins() {
        let err = ConnectionTarget::parse("localhost:8877", BackendKind::Db).unwrap_err();
        assert!(matches!(err, CliError::InvalidConnectionString(_)));
    }

    #[test]
    fn config_checks_file_before_connection_string() {
        let args = Args::parse_from([
            "blacklist",
            "/definitely/missing/list.txt",
            "not-a-valid-string",
        ]);
        let err = Config::from_args(args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_from_args() {
        let file = std::env::temp_dir().join(format!("blacklist-config-{}.txt", std::process::id()));
        std::fs::write(&file, "1\n").unwrap();

        let args = Args::parse_from([
            "blacklist",
            file.to_str().unwrap(),
            "localhost:8877",
            "Global",
            "1",
            "--timeout-secs",
            "0",
        ]);
        let config = Config::from_args(args).unwrap();
        std::fs::remove_file(&file).ok();

        assert_eq!(config.operation, Operation::Create);
        assert_eq!(config.blacklist, "Global");
        assert_eq!(config.timeout, Duration::from_secs(1));
    }
}
