//! Datastore backend tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL before running them with `--ignored`.

use blacklist_cli::backend::DatastoreBackend;
use blacklist_engine::{
    Backend, Collection, Error, NoProgress, Operation, Outcome, ReconcileOptions, Reconciler,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS blacklist (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS blacklist_entry (
            id BIGSERIAL PRIMARY KEY,
            blacklist_id BIGINT NOT NULL REFERENCES blacklist(id),
            msisdn TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}

/// Create a uniquely named blacklist holding `entries`.
async fn seed(pool: &PgPool, entries: &[&str]) -> Collection {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let name = format!("Test-{}-{}", std::process::id(), nanos);

    let id: i64 = sqlx::query_scalar("INSERT INTO blacklist (name) VALUES ($1) RETURNING id")
        .bind(&name)
        .fetch_one(pool)
        .await
        .unwrap();

    for msisdn in entries {
        sqlx::query("INSERT INTO blacklist_entry (blacklist_id, msisdn) VALUES ($1, $2)")
            .bind(id)
            .bind(*msisdn)
            .execute(pool)
            .await
            .unwrap();
    }

    Collection::new(id, name)
}

async fn remaining(pool: &PgPool, collection: &Collection) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT msisdn FROM blacklist_entry WHERE blacklist_id = $1 ORDER BY msisdn",
    )
    .bind(collection.id)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn resolve_ignores_case() {
    let pool = pool().await;
    let collection = seed(&pool, &[]).await;
    let backend = DatastoreBackend::new(pool, 4);

    let resolved = backend
        .resolve_collection(&collection.name.to_uppercase())
        .await
        .unwrap();
    assert_eq!(resolved.id, collection.id);

    let err = backend
        .resolve_collection("no-such-blacklist")
        .await
        .unwrap_err();
    assert_eq!(err, Error::CollectionNotFound("no-such-blacklist".into()));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn remove_by_value_is_scoped_and_idempotent() {
    let pool = pool().await;
    let target = seed(&pool, &["A", "B", "C"]).await;
    let other = seed(&pool, &["B"]).await;
    let backend = DatastoreBackend::new(pool.clone(), 4);

    let reconciler = Reconciler::new(&backend, &NoProgress, ReconcileOptions::default());
    let ids = vec!["B".to_string(), "D".to_string()];

    let first = reconciler.run(&target, Operation::Remove, &ids).await.unwrap();
    assert_eq!(first.items[0].outcome, Outcome::Succeeded);
    assert_eq!(first.items[1].outcome, Outcome::NotFound);
    assert_eq!(remaining(&pool, &target).await, vec!["A", "C"]);
    assert_eq!(remaining(&pool, &other).await, vec!["B"]);

    let second = reconciler.run(&target, Operation::Remove, &ids).await.unwrap();
    assert_eq!(second.not_found, 2);
    assert_eq!(remaining(&pool, &target).await, vec!["A", "C"]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn add_is_unsupported() {
    let pool = pool().await;
    let collection = seed(&pool, &[]).await;
    let backend = DatastoreBackend::new(pool.clone(), 4);

    let reconciler = Reconciler::new(&backend, &NoProgress, ReconcileOptions::default());
    let result = reconciler
        .run(&collection, Operation::Create, &["A".to_string()])
        .await
        .unwrap();

    assert_eq!(result.failed, 1);
    assert!(remaining(&pool, &collection).await.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn list_members_reads_collection() {
    let pool = pool().await;
    let collection = seed(&pool, &["2", "1"]).await;
    let backend = DatastoreBackend::new(pool, 4);

    let members = backend.list_members(&collection).await.unwrap();
    let values: Vec<_> = members.into_iter().map(|m| m.msisdn).collect();
    assert_eq!(values, vec!["1", "2"]);
}
