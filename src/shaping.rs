//! SQL rewriting for pagination and common table expressions.

use tokio_postgres::types::FromSqlOwned;

use crate::error::PgMiddlewareError;
use crate::executor::query_simple;
use crate::pool::PgPool;
use crate::types::RowValues;

/// Append `LIMIT`/`OFFSET` using the two placeholders after the existing `arg_count`.
#[must_use]
pub fn paginate_sql(sql: &str, arg_count: usize) -> String {
    format!("{sql} LIMIT ${} OFFSET ${}", arg_count + 1, arg_count + 2)
}

/// Prefix `query` with `WITH <cte>`; `cte` is used verbatim.
#[must_use]
pub fn with_cte(cte: &str, query: &str) -> String {
    format!("WITH {cte} {query}")
}

/// Run a single-column query one page at a time.
///
/// `sql` must not already end in a `LIMIT`/`OFFSET` clause.
///
/// # Errors
/// As [`query_simple`].
pub async fn query_with_pagination<T: FromSqlOwned>(
    pool: &PgPool,
    sql: &str,
    limit: i64,
    offset: i64,
    params: &[RowValues],
) -> Result<Vec<T>, PgMiddlewareError> {
    let (paged_sql, paged_params) = paginate(sql, limit, offset, params);
    query_simple(pool, &paged_sql, &paged_params).await
}

fn paginate(
    sql: &str,
    limit: i64,
    offset: i64,
    params: &[RowValues],
) -> (String, Vec<RowValues>) {
    let mut all = Vec::with_capacity(params.len() + 2);
    all.extend_from_slice(params);
    all.push(RowValues::Int(limit));
    all.push(RowValues::Int(offset));
    (paginate_sql(sql, params.len()), all)
}

/// Run a single-column query behind a `WITH` clause.
///
/// # Errors
/// As [`query_simple`]; a malformed `cte` surfaces as the server's syntax error.
pub async fn query_with_cte<T: FromSqlOwned>(
    pool: &PgPool,
    cte: &str,
    query: &str,
    params: &[RowValues],
) -> Result<Vec<T>, PgMiddlewareError> {
    query_simple(pool, &with_cte(cte, query), params).await
}
