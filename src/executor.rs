//! Query helpers: run one statement on a pooled connection and decode the result.
//!
//! Every helper reports its elapsed time, tagged with the SQL text, to the pool's
//! [`QueryObserver`](crate::observe::QueryObserver), whether the call succeeded or not.

use serde::Serialize;
use tokio_postgres::Row;
use tokio_postgres::types::FromSqlOwned;

use crate::decode::{FromRow, build_result_set, decode_json_object, decode_scalar, exactly_one};
use crate::error::PgMiddlewareError;
use crate::params::Params;
use crate::pool::{PgPool, PooledClient};
use crate::results::ResultSet;
use crate::types::{JsonMap, RowValues};

pub(crate) async fn fetch_rows(
    client: &PooledClient,
    sql: &str,
    params: &[RowValues],
) -> Result<Vec<Row>, PgMiddlewareError> {
    let stmt = client.prepare_cached(sql).await?;
    let converted = Params::convert(params);
    Ok(client.query(&stmt, converted.as_refs()).await?)
}

async fn fetch(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<Vec<Row>, PgMiddlewareError> {
    let client = pool.get().await?;
    fetch_rows(&client, sql, params).await
}

/// Run a query and decode every row into `T` by column name.
///
/// # Errors
/// Returns the driver's error if the query fails, or a decode error if any row does not
/// match `T`.
pub async fn query_structs<T: FromRow>(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<Vec<T>, PgMiddlewareError> {
    pool.observe(sql, async {
        fetch(pool, sql, params).await?.iter().map(T::from_row).collect()
    })
    .await
}

/// Run a query whose rows each hold a single column and decode it into `T`.
///
/// # Errors
/// Returns the driver's error if the query fails or a value doesn't convert, and
/// `DecodeError` if a row has other than one column.
pub async fn query_simple<T: FromSqlOwned>(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<Vec<T>, PgMiddlewareError> {
    pool.observe(sql, async {
        fetch(pool, sql, params).await?.iter().map(decode_scalar::<T>).collect()
    })
    .await
}

/// Run a query expected to return exactly one row with one column.
///
/// # Errors
/// `NoRows` / `TooManyRows` when the row count is not one, plus driver and decode errors.
pub async fn query_one<T: FromSqlOwned>(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<T, PgMiddlewareError> {
    pool.observe(sql, async {
        let row = exactly_one(fetch(pool, sql, params).await?)?;
        decode_scalar(&row)
    })
    .await
}

/// Run a query expected to return exactly one row and decode it into `T` by column name.
///
/// # Errors
/// `NoRows` / `TooManyRows` when the row count is not one, plus driver and decode errors.
pub async fn query_one_struct<T: FromRow>(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<T, PgMiddlewareError> {
    pool.observe(sql, async {
        let row = exactly_one(fetch(pool, sql, params).await?)?;
        T::from_row(&row)
    })
    .await
}

/// Execute a statement that returns no rows (INSERT, UPDATE, DELETE, DDL).
///
/// # Errors
/// Returns the driver's error if the statement fails.
pub async fn exec(pool: &PgPool, sql: &str, params: &[RowValues]) -> Result<(), PgMiddlewareError> {
    pool.observe(sql, async {
        let client = pool.get().await?;
        let stmt = client.prepare_cached(sql).await?;
        let converted = Params::convert(params);
        client.execute(&stmt, converted.as_refs()).await?;
        Ok(())
    })
    .await
}

/// Run a query returning one row with a single `json`/`jsonb` object column.
///
/// # Errors
/// Row-count errors as in [`query_one`]; `DecodeError` for NULL or non-object JSON.
pub async fn query_json(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<JsonMap, PgMiddlewareError> {
    pool.observe(sql, async {
        let row = exactly_one(fetch(pool, sql, params).await?)?;
        decode_json_object(&row)
    })
    .await
}

/// Serialize `json_data` and execute `sql` with it appended as the last positional parameter.
///
/// With two caller parameters, the JSON value binds to `$3`.
///
/// # Errors
/// `PgMiddlewareError::Json` if serialization fails (nothing is sent), otherwise as [`exec`].
pub async fn exec_json<J: Serialize + ?Sized>(
    pool: &PgPool,
    sql: &str,
    json_data: &J,
    params: &[RowValues],
) -> Result<(), PgMiddlewareError> {
    let params = with_json_param(json_data, params)?;
    exec(pool, sql, &params).await
}

fn with_json_param<J: Serialize + ?Sized>(
    json_data: &J,
    params: &[RowValues],
) -> Result<Vec<RowValues>, PgMiddlewareError> {
    let value = serde_json::to_value(json_data)?;
    let mut all = Vec::with_capacity(params.len() + 1);
    all.extend_from_slice(params);
    all.push(RowValues::JSON(value));
    Ok(all)
}

/// Run a query and return a dynamic [`ResultSet`] of [`RowValues`].
///
/// # Errors
/// Returns the driver's error, or `DecodeError` for column types `RowValues` can't hold.
pub async fn query_rows(
    pool: &PgPool,
    sql: &str,
    params: &[RowValues],
) -> Result<ResultSet, PgMiddlewareError> {
    pool.observe(sql, async {
        let client = pool.get().await?;
        let stmt = client.prepare_cached(sql).await?;
        let converted = Params::convert(params);
        let rows = client.query(&stmt, converted.as_refs()).await?;
        let column_names = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        build_result_set(column_names, &rows)
    })
    .await
}
