use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to the connection pool, cloned into every service.
pub type DbPool = Arc<DatabaseConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &DatabaseConnection) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Wraps a mock database in the same shared handle the services take.
#[cfg(test)]
pub trait IntoPool {
    fn into_pool(self) -> DbPool;
}

#[cfg(test)]
impl IntoPool for sea_orm::MockDatabase {
    fn into_pool(self) -> DbPool {
        Arc::new(self.into_connection())
    }
}

/// Drains the statements a mock pool has seen. Every service holding a
/// clone of the pool must be dropped first.
#[cfg(test)]
pub fn into_transaction_log(pool: DbPool) -> Vec<sea_orm::Transaction> {
    match Arc::try_unwrap(pool) {
        Ok(db) => db.into_transaction_log(),
        Err(_) => panic!("mock pool is still shared"),
    }
}
