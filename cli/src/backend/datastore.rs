//! PostgreSQL backend.
//!
//! Works directly on the `blacklist` and `blacklist_entry` tables. Removal
//! is keyed by value, so no listing is needed, and deletes fan out over the
//! connection pool.

use super::pool::{self, Pool};
use crate::config::DatastoreTarget;
use async_trait::async_trait;
use blacklist_engine::{
    error::Result, Backend, Collection, CollectionId, Dispatch, Error, Member, MemberId,
    RemovalKeying,
};
use sqlx::Row;
use std::time::Duration;

/// A stored blacklist row.
#[derive(Debug)]
pub struct StoredBlacklist {
    pub id: CollectionId,
    pub name: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredBlacklist {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredBlacklist {
            id: id_column(row, "id")?,
            name: row.try_get("name")?,
        })
    }
}

/// A stored blacklist entry row.
#[derive(Debug)]
pub struct StoredEntry {
    pub id: MemberId,
    pub msisdn: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEntry {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredEntry {
            id: id_column(row, "id")?,
            msisdn: row.try_get("msisdn")?,
        })
    }
}

/// Read an id column that may be `bigint` or `integer`.
fn id_column(row: &sqlx::postgres::PgRow, column: &str) -> std::result::Result<i64, sqlx::Error> {
    row.try_get::<i64, _>(column)
        .or_else(|_| row.try_get::<i32, _>(column).map(i64::from))
}

fn query_error(action: &str, err: sqlx::Error) -> Error {
    tracing::debug!(action, error = %err, "query failed");
    Error::Query(format!("{}: {}", action, err))
}

/// Backend executing SQL against the blacklist tables.
#[derive(Debug, Clone)]
pub struct DatastoreBackend {
    pool: Pool,
    concurrency: usize,
}

impl DatastoreBackend {
    /// Wrap an existing pool.
    pub fn new(pool: Pool, concurrency: usize) -> Self {
        Self {
            pool,
            concurrency: concurrency.max(1),
        }
    }

    /// Connect to the database named by `target`.
    ///
    /// The pool holds at most `concurrency` connections.
    pub async fn connect(
        target: &DatastoreTarget,
        concurrency: usize,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        tracing::info!(%target, "connecting to database");
        let max_connections = u32::try_from(concurrency).unwrap_or(u32::MAX);
        let pool = pool::create_pool(target, max_connections, acquire_timeout)
            .await
            .map_err(|e| Error::Transport(format!("connect to {}: {}", target, e)))?;

        Ok(Self::new(pool, concurrency))
    }
}

#[async_trait]
impl Backend for DatastoreBackend {
    fn name(&self) -> &'static str {
        "datastore"
    }

    fn removal_keying(&self) -> RemovalKeying {
        RemovalKeying::ByValue
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Concurrent {
            limit: self.concurrency,
        }
    }

    async fn resolve_collection(&self, name: &str) -> Result<Collection> {
        let rows = sqlx::query_as::<_, StoredBlacklist>("SELECT * FROM blacklist")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("select blacklists", e))?;

        rows.into_iter()
            .map(|row| Collection::new(row.id, row.name))
            .find(|c| c.matches_name(name))
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    async fn list_members(&self, collection: &Collection) -> Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, StoredEntry>(
            r#"
            SELECT id, msisdn
            FROM blacklist_entry
            WHERE blacklist_id = $1
            ORDER BY msisdn
            "#,
        )
        .bind(collection.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("select entries", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Member::new(row.id, row.msisdn))
            .collect())
    }

    async fn create_member(&self, _collection: &Collection, _msisdn: &str) -> Result<()> {
        Err(Error::Unsupported("create member".to_string()))
    }

    async fn remove_member(&self, collection: &Collection, member: &Member) -> Result<()> {
        let result = sqlx::query("DELETE FROM blacklist_entry WHERE blacklist_id = $1 AND id = $2")
            .bind(collection.id)
            .bind(member.id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("delete entry", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::Query(format!("entry {} no longer exists", member.id)));
        }
        Ok(())
    }

    async fn remove_by_value(&self, collection: &Collection, msisdn: &str) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM blacklist_entry WHERE blacklist_id = $1 AND msisdn = $2")
                .bind(collection.id)
                .bind(msisdn)
                .execute(&self.pool)
                .await
                .map_err(|e| query_error("delete entry", e))?;

        tracing::debug!(msisdn, rows = result.rows_affected(), "deleted by value");
        Ok(result.rows_affected())
    }
}
