use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::database::DatabaseError;

/// Embedded schema migrations from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Open the pool, waiting for the database to come up.
///
/// Containers usually start the API and Postgres together, so the first
/// few attempts are expected to fail.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let attempts = config.connect_retries.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => {
                info!(event = "DB-CONNECTION-ESTABLISHED", attempt);
                return Ok(pool);
            }
            Err(err) => {
                warn!(event = "WAITING-FOR-DB-SETUP", attempt, attempts, error = %err);
                last_error = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    Err(DatabaseError::Connection(
        last_error.map(|e| e.to_string()).unwrap_or_else(|| "no attempts made".to_string()),
    ))
}

pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    MIGRATOR.run(pool).await?;
    info!(event = "DB-MIGRATIONS-APPLIED");
    Ok(())
}
