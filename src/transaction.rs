use deadpool_postgres::Transaction as PgTransaction;
use tokio_postgres::types::FromSqlOwned;

use crate::decode::{FromRow, decode_scalar};
use crate::error::{PgMiddlewareError, TxStage};
use crate::params::Params;
use crate::pool::{PgPool, PooledClient};
use crate::types::{QueryAndParams, RowValues};

/// Lightweight transaction wrapper for a pooled connection.
///
/// Dropping a `Tx` without committing rolls the transaction back.
pub struct Tx<'a> {
    tx: PgTransaction<'a>,
}

/// Begin a new transaction on the provided connection.
///
/// # Errors
/// Returns an error if creating the transaction fails.
pub async fn begin(conn: &mut PooledClient) -> Result<Tx<'_>, PgMiddlewareError> {
    let tx = conn.transaction().await?;
    Ok(Tx { tx })
}

impl Tx<'_> {
    /// Execute a parameterized statement and return the affected row count.
    ///
    /// # Errors
    /// Returns an error if preparing or executing the statement fails.
    pub async fn exec(&self, sql: &str, params: &[RowValues]) -> Result<u64, PgMiddlewareError> {
        let stmt = self.tx.prepare_cached(sql).await?;
        let converted = Params::convert(params);
        Ok(self.tx.execute(&stmt, converted.as_refs()).await?)
    }

    /// Run a query inside the transaction and decode rows by column name.
    ///
    /// # Errors
    /// Returns driver or decode errors.
    pub async fn query_structs<T: FromRow>(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<T>, PgMiddlewareError> {
        let stmt = self.tx.prepare_cached(sql).await?;
        let converted = Params::convert(params);
        let rows = self.tx.query(&stmt, converted.as_refs()).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run a single-column query inside the transaction.
    ///
    /// # Errors
    /// Returns driver or decode errors.
    pub async fn query_simple<T: FromSqlOwned>(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<T>, PgMiddlewareError> {
        let stmt = self.tx.prepare_cached(sql).await?;
        let converted = Params::convert(params);
        let rows = self.tx.query(&stmt, converted.as_refs()).await?;
        rows.iter().map(decode_scalar::<T>).collect()
    }

    /// Execute parameterless, possibly multi-statement SQL text.
    ///
    /// # Errors
    /// Returns an error if execution fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), PgMiddlewareError> {
        self.tx.batch_execute(sql).await?;
        Ok(())
    }

    /// Commit the transaction.
    ///
    /// # Errors
    /// Returns an error if commit fails.
    pub async fn commit(self) -> Result<(), PgMiddlewareError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Roll back the transaction.
    ///
    /// # Errors
    /// Returns an error if rollback fails.
    pub async fn rollback(self) -> Result<(), PgMiddlewareError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Run `statements` in order inside one transaction.
///
/// The first failing statement rolls everything back; otherwise the transaction commits.
///
/// # Errors
/// `PgMiddlewareError::Transaction` carrying the failed stage (begin, execute or commit).
/// A failed connection checkout counts as the begin stage.
pub async fn run_statements_in_transaction(
    pool: &PgPool,
    statements: &[QueryAndParams],
) -> Result<(), PgMiddlewareError> {
    let label = format!("transaction ({} statements)", statements.len());
    pool.observe(&label, async {
        let mut client = pool
            .get()
            .await
            .map_err(|e| PgMiddlewareError::in_tx(TxStage::Begin, e))?;
        let tx = begin(&mut client)
            .await
            .map_err(|e| PgMiddlewareError::in_tx(TxStage::Begin, e))?;

        for (idx, statement) in statements.iter().enumerate() {
            if let Err(err) = tx.exec(&statement.query, &statement.params).await {
                tracing::debug!(statement = idx, sql = %statement.query, "rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                return Err(PgMiddlewareError::in_tx(TxStage::Execute, err));
            }
        }

        tx.commit()
            .await
            .map_err(|e| PgMiddlewareError::in_tx(TxStage::Commit, e))
    })
    .await
}

/// Execute parameterless SQL text (several `;`-separated statements allowed) in one
/// transaction, e.g. schema setup.
///
/// # Errors
/// `PgMiddlewareError::Transaction` carrying the failed stage.
pub async fn execute_batch(pool: &PgPool, sql: &str) -> Result<(), PgMiddlewareError> {
    pool.observe(sql, async {
        let mut client = pool
            .get()
            .await
            .map_err(|e| PgMiddlewareError::in_tx(TxStage::Begin, e))?;
        let tx = begin(&mut client)
            .await
            .map_err(|e| PgMiddlewareError::in_tx(TxStage::Begin, e))?;
        if let Err(err) = tx.execute_batch(sql).await {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            return Err(PgMiddlewareError::in_tx(TxStage::Execute, err));
        }
        tx.commit()
            .await
            .map_err(|e| PgMiddlewareError::in_tx(TxStage::Commit, e))
    })
    .await
}
