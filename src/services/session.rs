use futures_util::future::BoxFuture;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::core::error::{DomainError, DomainResult, SessionError};

/// A transactional handle with a bounded lifetime.
///
/// Wraps exactly one pooled connection inside a transaction. The scope owns
/// the connection until it is committed or rolled back; it is never shared
/// across concurrent operations. Statements issued through [`Self::conn`]
/// execute in order and commit (or vanish) together.
pub struct SessionScope {
    tx: Transaction<'static, Postgres>,
}

impl SessionScope {
    /// The connection backing this scope, for executing statements.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    /// Rolls back the scope. A rollback failure cannot change the outcome of
    /// the operation (the transaction is gone either way), so it is logged
    /// rather than surfaced.
    pub async fn rollback(self) {
        if let Err(err) = self.tx.rollback().await {
            tracing::warn!(error = %err, "session rollback failed");
        }
    }
}

/// Factory for session scopes, backed by the shared connection pool.
///
/// This is the single entry point for transaction boundaries: repository
/// operations and domain services alike go through [`Sessions::run`], which
/// guarantees rollback-before-translation on every failure path.
#[derive(Clone)]
pub struct Sessions {
    pool: PgPool,
}

impl Sessions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Acquires a scope for manual composition. Prefer [`Self::run`]; this
    /// exists for callers that need to thread one scope through several
    /// repository calls and decide the commit themselves.
    pub async fn begin(&self) -> Result<SessionScope, sqlx::Error> {
        Ok(SessionScope {
            tx: self.pool.begin().await?,
        })
    }

    /// Runs one logical operation inside a fresh session scope.
    ///
    /// Waiting for a pooled connection is the only suspension point added
    /// here; the operation itself decides what it awaits. On success the
    /// scope commits when `auto_commit` is set and rolls back otherwise
    /// (read-only flows have nothing to persist, and a deterministic
    /// rollback is how the connection is handed back clean). On failure the
    /// scope always rolls back first and only then translates the error, so
    /// the handle is never left in an indeterminate transactional state.
    ///
    /// `entity` tags translated errors with the table the caller was
    /// operating on.
    pub async fn run<T, F>(&self, entity: &'static str, auto_commit: bool, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut SessionScope) -> BoxFuture<'s, Result<T, SessionError>>,
    {
        let mut scope = self
            .begin()
            .await
            .map_err(|err| DomainError::translate(SessionError::Store(err), entity))?;

        match op(&mut scope).await {
            Ok(value) => {
                if auto_commit {
                    scope
                        .commit()
                        .await
                        .map_err(|err| DomainError::translate(SessionError::Store(err), entity))?;
                } else {
                    scope.rollback().await;
                }
                Ok(value)
            }
            Err(err) => {
                scope.rollback().await;
                Err(DomainError::translate(err, entity))
            }
        }
    }
}
