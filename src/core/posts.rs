use uuid::Uuid;

use crate::core::error::{DomainError, DomainResult};
use crate::core::filters::{ChangeSet, PageRequest};
use crate::core::repository::Repository;
use crate::models::{PageResult, PageSize, Post};
use crate::services::session::Sessions;

/// Text posts: creation, listing and author-only maintenance.
#[derive(Clone)]
pub struct PostService {
    repo: Repository<Post>,
}

impl PostService {
    pub fn new(sessions: Sessions) -> Self {
        Self {
            repo: Repository::new(sessions),
        }
    }

    pub fn repository(&self) -> &Repository<Post> {
        &self.repo
    }

    /// Creates a post owned by `account_id`. A dangling owner id surfaces
    /// as `ReferenceViolation("accounts")` from the foreign key.
    pub async fn create(&self, account_id: Uuid, content: String) -> DomainResult<Post> {
        self.repo
            .create(
                ChangeSet::new()
                    .set("account_id", account_id)
                    .set("content", content),
            )
            .await
    }

    pub async fn get(&self, post_id: Uuid) -> DomainResult<Post> {
        self.repo.get(post_id).await
    }

    /// One account's posts, newest first.
    pub async fn for_account(
        &self,
        account_id: Uuid,
        page: u64,
        page_size: PageSize,
    ) -> DomainResult<PageResult<Post>> {
        self.repo
            .paginate(
                PageRequest::new()
                    .page(page)
                    .page_size(page_size)
                    .filter("account_id", account_id)
                    .order_by("created_at DESC"),
            )
            .await
    }

    pub async fn update(&self, post_id: Uuid, editor: Uuid, content: String) -> DomainResult<Post> {
        let post = self.repo.get(post_id).await?;
        Self::check_author(&post, editor)?;
        self.repo
            .update(post_id, ChangeSet::new().set("content", content))
            .await
    }

    pub async fn remove(&self, post_id: Uuid, editor: Uuid) -> DomainResult<Post> {
        let post = self.repo.get(post_id).await?;
        Self::check_author(&post, editor)?;
        self.repo.delete(post_id).await
    }

    fn check_author(post: &Post, editor: Uuid) -> DomainResult<()> {
        if post.account_id != editor {
            return Err(DomainError::Validation(
                "posts can only be changed by their author".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_check_author() {
        let owner = Uuid::new_v4();
        let post = Post {
            id: Uuid::new_v4(),
            account_id: owner,
            content: "hello".to_string(),
            created_at: Utc::now(),
        };

        assert!(PostService::check_author(&post, owner).is_ok());

        let stranger = Uuid::new_v4();
        let err = PostService::check_author(&post, stranger).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
