//! Embedded PostgreSQL for integration tests (feature `test-utils`).

use std::sync::LazyLock;

use postgresql_embedded::PostgreSQL;
use tokio::runtime::Runtime;

use crate::config::{DbConfig, SslMode};

/// Shared tokio runtime for starting and stopping embedded servers.
static SHARED_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("Failed to create tokio runtime for test utilities"));

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    /// Working configuration, credentials included.
    pub config: DbConfig,
}

/// Set up an embedded `PostgreSQL` instance with a fresh database named `dbname`.
///
/// # Errors
/// Returns an error if the server cannot be installed, started, or the database created.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(dbname).await?;

        let settings = postgresql.settings();
        let config = DbConfig::new(
            settings.host.clone(),
            settings.port,
            settings.username.clone(),
            settings.password.clone(),
            dbname,
        )
        .with_ssl_mode(SslMode::Disable);

        tracing::info!(port = settings.port, dbname, "embedded postgres started");
        Ok(EmbeddedPostgres { postgresql, config })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        if let Err(e) = postgresql.stop().await {
            tracing::warn!(error = %e, "failed to stop embedded postgres");
        }
    });
}
