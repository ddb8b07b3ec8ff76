use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::repository::Entity;

/// A text post owned by one account.
///
/// Posts are deleted by the store's `ON DELETE CASCADE` when their owning
/// account goes away; the application never cleans them up itself.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub account_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Post {
    type Key = Uuid;

    const TABLE: &'static str = "posts";
    const FIELDS: &'static [&'static str] = &["id", "account_id", "content", "created_at"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_registry() {
        assert!(Post::has_field("account_id"));
        assert!(Post::has_field("content"));
        assert!(!Post::has_field("liked"));
    }
}
