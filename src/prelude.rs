//! Convenient imports for common functionality.

pub use crate::impl_from_row;
pub use crate::{
    CustomDbRow, DbConfig, FromRow, JsonMap, PgMiddlewareError, PgPool, QueryAndParams,
    ResultSet, RowValues, SslMode, bulk_insert, close, exec, exec_json, execute_batch,
    new_pool, query_json, query_one, query_one_struct, query_rows, query_simple,
    query_structs, query_with_cte, query_with_pagination, run_statements_in_transaction,
};
