use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;

use crate::error::PgMiddlewareError;
use crate::observe::{QueryObserver, TracingObserver};
use crate::pool::PgPool;

/// `sslmode` values understood by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = PgMiddlewareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <SslMode as ValueEnum>::from_str(s, true)
            .map_err(|_| PgMiddlewareError::ConfigError(format!("unknown sslmode: {s}")))
    }
}

/// Connection settings for [`new_pool`].
///
/// `max_connections` and `connect_timeout` only take effect when both are non-zero;
/// otherwise the pool and driver defaults apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub ssl_mode: SslMode,
    pub max_connections: usize,
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            dbname: String::new(),
            ssl_mode: SslMode::default(),
            max_connections: 0,
            connect_timeout: Duration::ZERO,
        }
    }
}

impl DbConfig {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    fn limits(&self) -> Option<(usize, Duration)> {
        (self.max_connections != 0 && !self.connect_timeout.is_zero())
            .then_some((self.max_connections, self.connect_timeout))
    }

    /// Key/value connection string in libpq form.
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote(&self.host),
            self.port,
            quote(&self.user),
            quote(&self.password),
            quote(&self.dbname),
            self.ssl_mode
        )
    }

    /// Parse the connection string into a driver config, applying the optional limits.
    ///
    /// # Errors
    /// Returns `PgMiddlewareError::ConfigError` if the driver rejects the connection string.
    pub fn to_tokio_config(&self) -> Result<tokio_postgres::Config, PgMiddlewareError> {
        let mut pg_config = tokio_postgres::Config::from_str(&self.connection_string())
            .map_err(|e| PgMiddlewareError::ConfigError(format!("failed to parse config: {e}")))?;
        if let Some((_, timeout)) = self.limits() {
            pg_config.connect_timeout(timeout);
        }
        Ok(pg_config)
    }
}

// Values are always single-quoted so empty passwords and embedded spaces survive parsing.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Build a pool that reports query timings through `tracing`.
///
/// # Errors
/// Returns `PgMiddlewareError::ConfigError` if the connection string cannot be parsed or
/// `sslmode=require` is asked for, and `PgMiddlewareError::ConnectionError` if the pool
/// cannot be built.
pub fn new_pool(config: &DbConfig) -> Result<PgPool, PgMiddlewareError> {
    new_pool_with_observer(config, Arc::new(TracingObserver))
}

/// Build a pool with a custom timing observer.
///
/// No connection is opened here; the first checkout connects.
///
/// # Errors
/// Same as [`new_pool`].
pub fn new_pool_with_observer(
    config: &DbConfig,
    observer: Arc<dyn QueryObserver>,
) -> Result<PgPool, PgMiddlewareError> {
    // Connections are made without a TLS connector.
    if config.ssl_mode == SslMode::Require {
        return Err(PgMiddlewareError::ConfigError(
            "sslmode=require needs TLS support".into(),
        ));
    }
    let pg_config = config.to_tokio_config()?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    let mut builder = Pool::builder(manager).runtime(Runtime::Tokio1);
    if let Some((max_size, _)) = config.limits() {
        builder = builder.max_size(max_size);
    }
    let pool = builder.build().map_err(|e| {
        PgMiddlewareError::ConnectionError(format!("failed to create connection pool: {e}"))
    })?;

    tracing::debug!(
        host = %config.host,
        port = config.port,
        dbname = %config.dbname,
        "created postgres pool"
    );
    Ok(PgPool::new(pool, observer))
}

/// Close the pool. Passing `None` is a no-op.
pub fn close(pool: Option<&PgPool>) {
    if let Some(pool) = pool {
        pool.close();
    }
}
