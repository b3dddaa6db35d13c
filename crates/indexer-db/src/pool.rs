use crate::{config::DatabaseConfig, DatabaseError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Postgres pool holding the mirror tables
#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool. The first connection is established eagerly so a bad
    /// `DATABASE_URL` fails at startup rather than on the first write.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            target_db = %redact_credentials(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to mirror database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Mirror schema up to date");
        Ok(())
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query and report how long it took
    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, idle = self.pool.num_idle(), "Mirror database ping failed");
                DatabaseError::Connection(e.to_string())
            })?;
        Ok(start.elapsed())
    }

    pub async fn close(&self) {
        info!("Closing mirror database pool");
        self.pool.close().await;
    }
}

/// Drop the password from a connection URL before it is logged
fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_credentials() {
        assert_eq!(
            redact_credentials("postgres://indexer:s3cret@db:5432/launchpad"),
            "postgres://indexer:***@db:5432/launchpad"
        );
        assert_eq!(
            redact_credentials("postgres://db:5432/launchpad"),
            "postgres://db:5432/launchpad"
        );
        assert_eq!(redact_credentials("not a url"), "not a url");
    }
}
