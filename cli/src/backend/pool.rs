//! Database connection pool management.

use crate::config::DatastoreTarget;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

/// Type alias for the database pool.
pub type Pool = PgPool;

/// Build connection options from a parsed connection string.
pub fn connect_options(target: &DatastoreTarget) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&target.host)
        .port(target.port)
        .username(&target.user)
        .password(&target.password)
        .database(&target.database)
}

/// Create a new database connection pool.
pub async fn create_pool(
    target: &DatastoreTarget,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<Pool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect_with(connect_options(target))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_target() {
        let target = DatastoreTarget {
            user: "mgw".into(),
            password: "p@ss:word".into(),
            host: "db.local".into(),
            port: 6543,
            database: "blacklists".into(),
        };

        let options = connect_options(&target);
        assert_eq!(options.get_host(), "db.local");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "mgw");
        assert_eq!(options.get_database(), Some("blacklists"));
    }
}
