//! Thin async helpers over a `tokio-postgres` connection pool.
//!
//! Build a pool once with [`new_pool`], pass `&PgPool` to the helpers, and [`close`] it at
//! shutdown:
//!
//! ```no_run
//! use pg_middleware::prelude::*;
//!
//! struct Item {
//!     id: i32,
//!     name: String,
//! }
//! impl_from_row!(Item { id, name });
//!
//! # async fn demo() -> Result<(), PgMiddlewareError> {
//! let pool = new_pool(&DbConfig::new("localhost", 5432, "app", "secret", "shop"))?;
//! let items: Vec<Item> =
//!     query_structs(&pool, "SELECT id, name FROM item WHERE id > $1", &[RowValues::Int(0)])
//!         .await?;
//! let total: i64 = query_one(&pool, "SELECT count(*) FROM item", &[]).await?;
//! close(Some(&pool));
//! # let _ = (items, total);
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod observe;
pub mod params;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod shaping;
pub mod transaction;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use bulk::{build_bulk_insert, bulk_insert};
pub use config::{DbConfig, SslMode, close, new_pool, new_pool_with_observer};
pub use decode::FromRow;
pub use error::{PgMiddlewareError, TxStage};
pub use executor::{
    exec, exec_json, query_json, query_one, query_one_struct, query_rows, query_simple,
    query_structs,
};
pub use observe::{NoopObserver, QueryObserver, TracingObserver};
pub use pool::{PgPool, PooledClient};
pub use results::{CustomDbRow, ResultSet};
pub use shaping::{paginate_sql, query_with_cte, query_with_pagination, with_cte};
pub use transaction::{Tx, begin, execute_batch, run_statements_in_transaction};
pub use types::{JsonMap, QueryAndParams, RowValues};

pub use tokio_postgres::Row;
pub use tokio_postgres::types::FromSqlOwned;
