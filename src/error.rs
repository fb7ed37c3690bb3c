use std::fmt;

use thiserror::Error;

/// Which step of a transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Begin,
    Execute,
    Commit,
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStage::Begin => "begin transaction",
            TxStage::Execute => "execute query",
            TxStage::Commit => "commit transaction",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PgMiddlewareError {
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("failed to {stage}: {source}")]
    Transaction {
        stage: TxStage,
        #[source]
        source: Box<PgMiddlewareError>,
    },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("query returned no rows")]
    NoRows,

    #[error("query returned {0} rows, expected exactly one")]
    TooManyRows(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PgMiddlewareError {
    pub(crate) fn in_tx(stage: TxStage, err: impl Into<PgMiddlewareError>) -> Self {
        PgMiddlewareError::Transaction {
            stage,
            source: Box::new(err.into()),
        }
    }

    /// True when the error is a single-row contract violation (`NoRows` / `TooManyRows`).
    #[must_use]
    pub fn is_row_count(&self) -> bool {
        matches!(
            self,
            PgMiddlewareError::NoRows | PgMiddlewareError::TooManyRows(_)
        )
    }
}
