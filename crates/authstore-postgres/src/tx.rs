//! Transactional unit of work.
//!
//! Every multi-statement save (client upsert, access insert plus refresh
//! upsert) runs its statements through [`with_tx`] so they commit or roll
//! back as a set. Statements execute in program order within the
//! transaction; the backend's default isolation (read-committed or stronger)
//! is assumed.

use futures_util::future::BoxFuture;
use sqlx_postgres::PgTransaction;
use tracing::warn;

use authstore::{StoreError, StoreResult};

use crate::PgPool;

/// Begin a transaction, run `step` against it, commit on success.
///
/// On a step error the transaction is rolled back and the step's error is
/// returned unchanged; a rollback failure is logged, never allowed to mask
/// the original error.
///
/// The step future may borrow nothing but the transaction handle: the
/// higher-ranked bound ranges over every `'t`, so the closure has to move
/// owned copies of whatever data it writes.
pub(crate) async fn with_tx<T, F>(pool: &PgPool, op: &'static str, step: F) -> StoreResult<T>
where
    F: for<'t> FnOnce(&'t mut PgTransaction<'static>) -> BoxFuture<'t, StoreResult<T>>,
{
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StoreError::database(format!("{op}: begin transaction: {e}")))?;

    match step(&mut tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| StoreError::database(format!("{op}: commit transaction: {e}")))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(op, error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
