use std::fmt;
use std::future::Future;
use std::sync::Arc;

use deadpool_postgres::{Object, Pool, Status};

use crate::error::PgMiddlewareError;
use crate::observe::{QueryObserver, timed};

/// A connection checked out of the pool; returned to the pool on drop.
pub type PooledClient = Object;

/// Shared handle to a Postgres connection pool plus the observer that times each call.
///
/// Cloning is cheap and every clone refers to the same pool.
#[derive(Clone)]
pub struct PgPool {
    pool: Pool,
    observer: Arc<dyn QueryObserver>,
}

impl fmt::Debug for PgPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgPool")
            .field("pool", &self.pool)
            .field("observer", &"<dyn QueryObserver>")
            .finish()
    }
}

impl PgPool {
    pub(crate) fn new(pool: Pool, observer: Arc<dyn QueryObserver>) -> Self {
        Self { pool, observer }
    }

    /// Same pool, different observer.
    #[must_use]
    pub fn with_observer(&self, observer: Arc<dyn QueryObserver>) -> Self {
        Self {
            pool: self.pool.clone(),
            observer,
        }
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns `PgMiddlewareError::Pool` if no connection can be obtained (including after close).
    pub async fn get(&self) -> Result<PooledClient, PgMiddlewareError> {
        Ok(self.pool.get().await?)
    }

    /// Underlying deadpool pool, for anything these helpers don't cover.
    #[must_use]
    pub fn inner(&self) -> &Pool {
        &self.pool
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.pool.status()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub(crate) fn close(&self) {
        self.pool.close();
    }

    pub(crate) async fn observe<T, F>(&self, label: &str, fut: F) -> Result<T, PgMiddlewareError>
    where
        F: Future<Output = Result<T, PgMiddlewareError>>,
    {
        timed(self.observer.as_ref(), label, fut).await
    }
}
