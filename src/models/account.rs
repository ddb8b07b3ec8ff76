use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::repository::Entity;

/// A registered account with its profile fields and swipe state.
///
/// The `liked` and `matched` collections are owned by the match service;
/// nothing else writes to them. `password` holds an opaque one-way hash and
/// is never serialized outward.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Unique identifier from the external auth provider.
    pub external_id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub city: String,
    pub about: Option<String>,
    pub liked: Vec<Uuid>,
    pub matched: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn has_liked(&self, other: Uuid) -> bool {
        self.liked.contains(&other)
    }

    pub fn is_matched_with(&self, other: Uuid) -> bool {
        self.matched.contains(&other)
    }
}

impl Entity for Account {
    type Key = Uuid;

    const TABLE: &'static str = "accounts";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "email",
        "password",
        "external_id",
        "name",
        "birth_date",
        "city",
        "about",
        "liked",
        "matched",
        "created_at",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(liked: Vec<Uuid>, matched: Vec<Uuid>) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password: "hash".to_string(),
            external_id: "ext-1".to_string(),
            name: "A".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1995, 6, 1).unwrap(),
            city: "Lima".to_string(),
            about: None,
            liked,
            matched,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_liked_and_matched_lookups() {
        let other = Uuid::new_v4();
        let acct = account(vec![other], vec![]);
        assert!(acct.has_liked(other));
        assert!(!acct.is_matched_with(other));
    }

    #[test]
    fn test_field_registry_covers_swipe_state() {
        assert!(Account::has_field("liked"));
        assert!(Account::has_field("matched"));
        assert!(!Account::has_field("no_such_column"));
    }

    #[test]
    fn test_password_not_serialized() {
        let acct = account(vec![], vec![]);
        let json = serde_json::to_value(&acct).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("email").is_some());
    }
}
