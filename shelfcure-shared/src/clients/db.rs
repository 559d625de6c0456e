use anyhow::Context;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<PgConnection>>;

const DEFAULT_POOL_SIZE: u32 = 10;

/// Build the Postgres pool every ShelfCure service holds in its state.
/// Pool size is overridable through `SHELFCURE_DB_POOL_SIZE`.
pub fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let max_size = std::env::var("SHELFCURE_DB_POOL_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POOL_SIZE);

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(2))
        .test_on_check_out(true)
        .build(manager)
        .context("failed to create database pool")?;

    tracing::info!(max_size, "database connection pool created");
    Ok(pool)
}
