use std::fmt::Display;
use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder};

use crate::core::error::{DomainError, DomainResult, SessionError};
use crate::core::filters::{push_bind_value, push_predicates, ChangeSet, FieldValue, PageRequest};
use crate::models::{page_window, PageResult};
use crate::services::session::{SessionScope, Sessions};

/// A keyed record type managed by the generic repository.
///
/// `FIELDS` is the construction-time field registry: the set of column names
/// dynamic filters, searches and writes may reference. Names outside the
/// registry are a declared no-op, and the registry is the only path through
/// which identifiers reach SQL text.
pub trait Entity: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin + 'static {
    type Key: for<'q> sqlx::Encode<'q, Postgres>
        + sqlx::Type<Postgres>
        + Clone
        + Display
        + Send
        + Sync
        + 'static;

    const TABLE: &'static str;
    const KEY_COLUMN: &'static str = "id";
    const FIELDS: &'static [&'static str];

    fn has_field(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }
}

/// Generic CRUD and search-and-paginate over one entity type.
///
/// The one-shot methods (`get`, `create`, `update`, `delete`, `paginate`)
/// each run inside their own session scope and surface domain errors. The
/// `*_in` associated functions take a caller-owned [`SessionScope`] instead,
/// for flows that compose several statements into one transaction (the match
/// service is the main customer).
pub struct Repository<E: Entity> {
    sessions: Sessions,
    _entity: PhantomData<E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(sessions: Sessions) -> Self {
        Self {
            sessions,
            _entity: PhantomData,
        }
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Single-row lookup by key.
    pub async fn get(&self, key: E::Key) -> DomainResult<E> {
        self.sessions
            .run(E::TABLE, false, move |scope| {
                Box::pin(async move {
                    Self::get_in(scope, &key)
                        .await?
                        .ok_or(SessionError::Domain(DomainError::NotFound(E::TABLE)))
                })
            })
            .await
    }

    /// Inserts one row and returns it as the store materialized it,
    /// generated key and defaulted columns included.
    pub async fn create(&self, changes: ChangeSet) -> DomainResult<E> {
        self.sessions
            .run(E::TABLE, true, move |scope| {
                Box::pin(async move {
                    let created = Self::create_in(scope, &changes).await?;
                    tracing::debug!(entity = E::TABLE, "row created");
                    Ok(created)
                })
            })
            .await
    }

    /// Insert for callers that do not need the entity back; returns the
    /// affected row count instead.
    pub async fn create_count(&self, changes: ChangeSet) -> DomainResult<u64> {
        self.sessions
            .run(E::TABLE, true, move |scope| {
                Box::pin(async move { Self::create_count_in(scope, &changes).await })
            })
            .await
    }

    /// Conditional update by key. Fails with `NotFound` when zero rows
    /// match. The returned entity is re-read after the commit, so columns
    /// computed by defaults or triggers are authoritative.
    pub async fn update(&self, key: E::Key, changes: ChangeSet) -> DomainResult<E> {
        let write_key = key.clone();
        self.sessions
            .run(E::TABLE, true, move |scope| {
                Box::pin(async move {
                    let updated = Self::update_in(scope, &write_key, &changes).await?;
                    if updated.is_none() {
                        return Err(SessionError::Domain(DomainError::NotFound(E::TABLE)));
                    }
                    tracing::debug!(entity = E::TABLE, key = %write_key, "row updated");
                    Ok(())
                })
            })
            .await?;

        self.get(key).await
    }

    /// Deletes by key, returning the removed row. Same matching semantics
    /// as `update`.
    pub async fn delete(&self, key: E::Key) -> DomainResult<E> {
        self.sessions
            .run(E::TABLE, true, move |scope| {
                Box::pin(async move {
                    let deleted = Self::delete_in(scope, &key)
                        .await?
                        .ok_or(SessionError::Domain(DomainError::NotFound(E::TABLE)))?;
                    tracing::debug!(entity = E::TABLE, key = %key, "row deleted");
                    Ok(deleted)
                })
            })
            .await
    }

    /// Dynamic search, filter and paginate. Read-only; runs in a shared
    /// scope that is rolled back on completion.
    pub async fn paginate(&self, request: PageRequest) -> DomainResult<PageResult<E>> {
        self.sessions
            .run(E::TABLE, false, move |scope| {
                Box::pin(async move { Ok(Self::paginate_in(scope, &request).await?) })
            })
            .await
    }

    // Scope-taking operations, for composition inside one transaction.

    pub async fn get_in(scope: &mut SessionScope, key: &E::Key) -> Result<Option<E>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM {} WHERE {} = ",
            E::TABLE,
            E::KEY_COLUMN
        ));
        qb.push_bind(key.clone());
        qb.build_query_as::<E>().fetch_optional(scope.conn()).await
    }

    /// Lookup that additionally takes a row-level lock held until the
    /// enclosing scope ends. Read-modify-write flows lock every row they
    /// will touch up front.
    pub async fn get_for_update_in(
        scope: &mut SessionScope,
        key: &E::Key,
    ) -> Result<Option<E>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM {} WHERE {} = ",
            E::TABLE,
            E::KEY_COLUMN
        ));
        qb.push_bind(key.clone());
        qb.push(" FOR UPDATE");
        qb.build_query_as::<E>().fetch_optional(scope.conn()).await
    }

    pub async fn create_in(scope: &mut SessionScope, changes: &ChangeSet) -> Result<E, SessionError> {
        let columns = Self::known_columns(changes)?;
        let mut qb = Self::insert_builder(&columns);
        qb.push(" RETURNING *");
        Ok(qb.build_query_as::<E>().fetch_one(scope.conn()).await?)
    }

    pub async fn create_count_in(
        scope: &mut SessionScope,
        changes: &ChangeSet,
    ) -> Result<u64, SessionError> {
        let columns = Self::known_columns(changes)?;
        let mut qb = Self::insert_builder(&columns);
        let result = qb.build().execute(scope.conn()).await?;
        Ok(result.rows_affected())
    }

    pub async fn update_in(
        scope: &mut SessionScope,
        key: &E::Key,
        changes: &ChangeSet,
    ) -> Result<Option<E>, SessionError> {
        let columns = Self::known_columns(changes)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", E::TABLE));
        for (i, (name, value)) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*name).push(" = ");
            push_bind_value(&mut qb, value);
        }
        qb.push(format!(" WHERE {} = ", E::KEY_COLUMN));
        qb.push_bind(key.clone());
        qb.push(" RETURNING *");
        Ok(qb
            .build_query_as::<E>()
            .fetch_optional(scope.conn())
            .await?)
    }

    pub async fn delete_in(
        scope: &mut SessionScope,
        key: &E::Key,
    ) -> Result<Option<E>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "DELETE FROM {} WHERE {} = ",
            E::TABLE,
            E::KEY_COLUMN
        ));
        qb.push_bind(key.clone());
        qb.push(" RETURNING *");
        qb.build_query_as::<E>().fetch_optional(scope.conn()).await
    }

    pub async fn paginate_in(
        scope: &mut SessionScope,
        request: &PageRequest,
    ) -> Result<PageResult<E>, sqlx::Error> {
        // Count over the filtered set, before any window is applied.
        let mut count_qb =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        push_predicates::<E>(&mut count_qb, request);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(scope.conn())
            .await?;
        let total = total.max(0) as u64;

        let (pages, page, window) = page_window(total, request.page, request.page_size);

        let mut rows_qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", E::TABLE));
        push_predicates::<E>(&mut rows_qb, request);
        if let Some(order) = &request.order_by {
            rows_qb.push(" ORDER BY ").push(order.as_str());
        }
        if let Some((offset, limit)) = window {
            rows_qb.push(" LIMIT ");
            rows_qb.push_bind(limit as i64);
            rows_qb.push(" OFFSET ");
            rows_qb.push_bind(offset as i64);
        }

        let values = rows_qb
            .build_query_as::<E>()
            .fetch_all(scope.conn())
            .await?;

        Ok(PageResult {
            values,
            total,
            page,
            pages,
            page_size: request.page_size,
        })
    }

    /// Registry-checked columns of a change set. Unknown names are skipped;
    /// a write that ends up with nothing to say is rejected outright rather
    /// than sent to the store as malformed SQL.
    fn known_columns(changes: &ChangeSet) -> Result<Vec<(&str, &FieldValue)>, SessionError> {
        let columns: Vec<(&str, &FieldValue)> = changes
            .iter()
            .filter(|(name, _)| E::has_field(name))
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        if columns.is_empty() {
            return Err(SessionError::Domain(DomainError::Validation(format!(
                "{} write carries no recognized fields",
                E::TABLE
            ))));
        }
        Ok(columns)
    }

    fn insert_builder<'a>(columns: &[(&str, &FieldValue)]) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", E::TABLE));
        for (i, (name, _)) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*name);
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_bind_value(&mut qb, value);
        }
        qb.push(")");
        qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(sqlx::FromRow)]
    struct Gadget {
        #[allow(dead_code)]
        id: Uuid,
    }

    impl Entity for Gadget {
        type Key = Uuid;
        const TABLE: &'static str = "gadgets";
        const FIELDS: &'static [&'static str] = &["id", "label", "weight"];
    }

    #[test]
    fn test_known_columns_skips_unregistered_fields() {
        let changes = ChangeSet::new()
            .set("label", "widget")
            .set("color", "red")
            .set("weight", 3_i64);
        let columns = Repository::<Gadget>::known_columns(&changes).unwrap();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["label", "weight"]);
    }

    #[test]
    fn test_write_with_no_recognized_fields_is_rejected() {
        let changes = ChangeSet::new().set("color", "red");
        let err = Repository::<Gadget>::known_columns(&changes).unwrap_err();
        match err {
            SessionError::Domain(DomainError::Validation(msg)) => {
                assert!(msg.contains("gadgets"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_builder_shape() {
        let changes = ChangeSet::new().set("label", "widget").set("weight", 3_i64);
        let columns = Repository::<Gadget>::known_columns(&changes).unwrap();
        let qb = Repository::<Gadget>::insert_builder(&columns);
        assert_eq!(qb.sql(), "INSERT INTO gadgets (label, weight) VALUES ($1, $2)");
    }

    #[test]
    fn test_insert_builder_pushes_null_literal() {
        let changes = ChangeSet::new()
            .set("label", "widget")
            .set("weight", None::<i64>);
        let columns = Repository::<Gadget>::known_columns(&changes).unwrap();
        let qb = Repository::<Gadget>::insert_builder(&columns);
        assert_eq!(
            qb.sql(),
            "INSERT INTO gadgets (label, weight) VALUES ($1, NULL)"
        );
    }
}
