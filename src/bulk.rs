use std::fmt::Write as _;

use crate::error::PgMiddlewareError;
use crate::executor::exec;
use crate::pool::PgPool;
use crate::types::{QueryAndParams, RowValues};

/// Build a single multi-row `INSERT` with placeholders numbered across the flattened rows.
///
/// Row width is not checked against `columns`; the server rejects a mismatch.
///
/// # Errors
/// `PgMiddlewareError::InvalidInput` if `rows` is empty.
pub fn build_bulk_insert<S: AsRef<str>>(
    table: &str,
    columns: &[S],
    rows: &[Vec<RowValues>],
) -> Result<QueryAndParams, PgMiddlewareError> {
    if rows.is_empty() {
        return Err(PgMiddlewareError::InvalidInput(
            "no values provided for insert".to_string(),
        ));
    }

    let column_list = columns
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",");
    let mut query = format!("INSERT INTO {table} ({column_list}) VALUES ");
    let mut params = Vec::with_capacity(rows.len() * columns.len());

    for (row_idx, row) in rows.iter().enumerate() {
        if row_idx > 0 {
            query.push(',');
        }
        query.push('(');
        for col_idx in 0..row.len() {
            if col_idx > 0 {
                query.push(',');
            }
            // Writing to a String cannot fail.
            let _ = write!(query, "${}", params.len() + col_idx + 1);
        }
        query.push(')');
        params.extend(row.iter().cloned());
    }

    Ok(QueryAndParams { query, params })
}

/// Insert all `rows` into `table` with one statement.
///
/// # Errors
/// `InvalidInput` for empty `rows` (no connection is used), `ExecutionError` wrapping the
/// driver's message if the insert fails.
pub async fn bulk_insert<S: AsRef<str>>(
    pool: &PgPool,
    table: &str,
    columns: &[S],
    rows: &[Vec<RowValues>],
) -> Result<(), PgMiddlewareError> {
    let statement = build_bulk_insert(table, columns, rows)?;
    exec(pool, &statement.query, &statement.params)
        .await
        .map_err(|e| PgMiddlewareError::ExecutionError(format!("bulk insert failed: {e}")))
}
