use sqlx::error::ErrorKind;
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// Result alias used across the repository and domain services.
pub type DomainResult<T> = Result<T, DomainError>;

/// Stable failure taxonomy exposed to callers.
///
/// Store-native errors never cross this boundary: every operation funnels
/// its failures through [`DomainError::translate`] at the session-scope
/// boundary, so callers can match on these kinds without knowing what the
/// storage engine is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested key is absent, or an update/delete matched zero rows.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A foreign key points at a row that does not exist. Carries the
    /// referenced table name when it could be recovered.
    #[error("referenced {0} does not exist")]
    ReferenceViolation(String),

    /// An integrity violation whose offending table could not be determined
    /// (typically a unique constraint).
    #[error("record conflicts with existing data")]
    Conflict,

    /// Anything unclassified. The message is deliberately opaque; the
    /// underlying error is logged at translation time instead.
    #[error("internal storage error")]
    Internal,

    /// Raised by domain services (match, account, post logic), never by the
    /// store itself.
    #[error("{0}")]
    Validation(String),
}

/// Error as seen inside a session scope, before translation.
///
/// Repository operations fail with store errors; domain services running in
/// the same scope fail with already-translated domain errors. Translation is
/// idempotent for the latter.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl DomainError {
    /// Maps a session-level failure to the domain taxonomy.
    ///
    /// `entity` is the table name of the repository that was executing; it
    /// tags not-found conditions so callers see "accounts not found" rather
    /// than a bare miss.
    pub fn translate(err: SessionError, entity: &'static str) -> Self {
        match err {
            SessionError::Domain(domain) => domain,
            SessionError::Store(sqlx::Error::RowNotFound) => Self::NotFound(entity),
            SessionError::Store(sqlx::Error::Database(db)) => {
                let detail = db
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(PgDatabaseError::detail);
                classify_database(db.kind(), db.constraint(), detail, db.message(), entity)
            }
            SessionError::Store(other) => {
                tracing::error!(entity, error = %other, "unclassified store error");
                Self::Internal
            }
        }
    }
}

/// Classifies a database-reported error from its structured fields.
///
/// Pure so it can be tested without a live connection. Resolution order for
/// the referenced table of a foreign-key violation: the constraint registry
/// first (the constraint name identifies the referenced table directly),
/// then a best-effort scan of the detail text for `in table "..."`. The
/// error's own table field and primary message both name the constrained
/// table, not the referenced one, so neither is consulted.
fn classify_database(
    kind: ErrorKind,
    constraint: Option<&str>,
    detail: Option<&str>,
    message: &str,
    entity: &'static str,
) -> DomainError {
    match kind {
        ErrorKind::ForeignKeyViolation => {
            let referenced = constraint
                .and_then(table_for_constraint)
                .map(str::to_owned)
                .or_else(|| detail.and_then(parse_referenced_table));

            match referenced {
                Some(table_name) => DomainError::ReferenceViolation(table_name),
                None => DomainError::Conflict,
            }
        }
        ErrorKind::UniqueViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            tracing::debug!(entity, constraint, message, "integrity violation");
            DomainError::Conflict
        }
        _ => {
            tracing::error!(entity, message, "unclassified database error");
            DomainError::Internal
        }
    }
}

/// Constraint-name registry, kept in sync with the schema documented in
/// `models`. Maps a constraint back to the table it references.
fn table_for_constraint(constraint: &str) -> Option<&'static str> {
    match constraint {
        "posts_account_id_fkey" => Some("accounts"),
        _ => None,
    }
}

/// Fallback scan for `in table "<name>"` in a foreign-key detail line
/// (`Key (account_id)=(...) is not present in table "accounts".`).
fn parse_referenced_table(detail: &str) -> Option<String> {
    let start = detail.find("in table \"")? + "in table \"".len();
    let rest = detail.get(start..)?;
    let end = rest.find('"')?;
    let name = &rest[..end];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_becomes_not_found() {
        let err = DomainError::translate(SessionError::Store(sqlx::Error::RowNotFound), "accounts");
        assert_eq!(err, DomainError::NotFound("accounts"));
    }

    #[test]
    fn test_domain_errors_pass_through_unchanged() {
        let original = DomainError::Validation("account is gone".to_string());
        let err = DomainError::translate(SessionError::Domain(original.clone()), "posts");
        assert_eq!(err, original);
    }

    #[test]
    fn test_unclassified_store_error_is_opaque() {
        let err = DomainError::translate(
            SessionError::Store(sqlx::Error::PoolTimedOut),
            "accounts",
        );
        assert_eq!(err, DomainError::Internal);
        assert_eq!(err.to_string(), "internal storage error");
    }

    // Field values below mirror what Postgres actually reports for a
    // dangling posts.account_id: the constraint identifies the referenced
    // table, while the primary message and table field both name the
    // constrained table (posts).

    #[test]
    fn test_fk_violation_resolves_via_constraint_registry() {
        let err = classify_database(
            ErrorKind::ForeignKeyViolation,
            Some("posts_account_id_fkey"),
            Some(r#"Key (account_id)=(42) is not present in table "accounts"."#),
            r#"insert or update on table "posts" violates foreign key constraint "posts_account_id_fkey""#,
            "posts",
        );
        assert_eq!(err, DomainError::ReferenceViolation("accounts".to_string()));
    }

    #[test]
    fn test_fk_violation_falls_back_to_detail_scan() {
        let err = classify_database(
            ErrorKind::ForeignKeyViolation,
            Some("unregistered_fkey"),
            Some(r#"Key (account_id)=(42) is not present in table "accounts"."#),
            r#"insert or update on table "posts" violates foreign key constraint "unregistered_fkey""#,
            "posts",
        );
        assert_eq!(err, DomainError::ReferenceViolation("accounts".to_string()));
    }

    #[test]
    fn test_fk_violation_never_reports_the_constrained_table() {
        // No registry hit and no detail: the primary message quotes the
        // constrained table, which must not be mistaken for the referenced
        // one. Unresolvable collapses to Conflict instead.
        let err = classify_database(
            ErrorKind::ForeignKeyViolation,
            Some("unregistered_fkey"),
            None,
            r#"insert or update on table "posts" violates foreign key constraint "unregistered_fkey""#,
            "posts",
        );
        assert_eq!(err, DomainError::Conflict);
    }

    #[test]
    fn test_unresolvable_fk_violation_is_conflict() {
        let err = classify_database(
            ErrorKind::ForeignKeyViolation,
            None,
            None,
            "constraint failed",
            "posts",
        );
        assert_eq!(err, DomainError::Conflict);
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = classify_database(
            ErrorKind::UniqueViolation,
            Some("accounts_email_key"),
            Some("Key (email)=(a@x.com) already exists."),
            r#"duplicate key value violates unique constraint "accounts_email_key""#,
            "accounts",
        );
        assert_eq!(err, DomainError::Conflict);
    }

    #[test]
    fn test_parse_referenced_table() {
        assert_eq!(
            parse_referenced_table(r#"Key (account_id)=(42) is not present in table "accounts"."#),
            Some("accounts".to_string())
        );
        assert_eq!(parse_referenced_table("no quotes at all"), None);
        assert_eq!(parse_referenced_table(r#"in table """#), None);
        assert_eq!(parse_referenced_table(r#"in table "unterminated"#), None);
    }
}
