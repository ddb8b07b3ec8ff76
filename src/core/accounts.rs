use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::error::{DomainError, DomainResult};
use crate::core::filters::{ChangeSet, PageRequest};
use crate::core::repository::Repository;
use crate::models::{Account, PageResult, PageSize};
use crate::services::session::Sessions;

/// Opaque one-way password hashing capability.
///
/// The primitive itself lives outside this crate; callers inject whatever
/// implementation they use (bcrypt, argon2, a test stub).
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> String;
    fn verify(&self, plain: &str, hashed: &str) -> bool;
}

/// Caller-supplied fields for a new registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub external_id: String,
    pub password: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub city: String,
    pub about: Option<String>,
}

/// Registration, browsing and profile maintenance for accounts.
#[derive(Clone)]
pub struct AccountService {
    repo: Repository<Account>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    pub fn new(sessions: Sessions, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            repo: Repository::new(sessions),
            hasher,
        }
    }

    pub fn repository(&self) -> &Repository<Account> {
        &self.repo
    }

    /// Registers a new account.
    ///
    /// The pre-check mirrors the store's unique constraints to give a
    /// friendlier error than `Conflict` in the common case; a race between
    /// two registrations still ends at the constraint, and the second one
    /// surfaces as `Conflict`.
    pub async fn register(&self, new_account: NewAccount) -> DomainResult<Account> {
        let duplicates = self
            .repo
            .paginate(
                PageRequest::new()
                    .page_size(PageSize::Limit(1))
                    .filter("email", new_account.email.clone())
                    .filter("external_id", new_account.external_id.clone()),
            )
            .await?;
        if duplicates.total > 0 {
            return Err(DomainError::Validation(
                "an account with these credentials already exists".to_string(),
            ));
        }

        let password = self.hasher.hash(&new_account.password);
        let changes = ChangeSet::new()
            .set("email", new_account.email)
            .set("external_id", new_account.external_id)
            .set("password", password)
            .set("name", new_account.name)
            .set("birth_date", new_account.birth_date)
            .set("city", new_account.city)
            .set("about", new_account.about);

        self.repo.create(changes).await
    }

    /// Looks an account up by email and checks the password against its
    /// stored hash. The caller turns the returned account into whatever
    /// session or token it issues; none of that happens here.
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<Account> {
        let page = self
            .repo
            .paginate(
                PageRequest::new()
                    .page_size(PageSize::Limit(1))
                    .filter("email", email),
            )
            .await?;

        let account = page
            .values
            .into_iter()
            .next()
            .filter(|account| self.hasher.verify(password, &account.password))
            .ok_or_else(|| DomainError::Validation("invalid credentials".to_string()))?;

        Ok(account)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Account> {
        self.repo.get(id).await
    }

    /// Profile browsing. The password hash is never a legal search field,
    /// whatever the caller asks for.
    pub async fn browse(&self, mut request: PageRequest) -> DomainResult<PageResult<Account>> {
        if let Some(search) = request.search.as_mut() {
            search.fields.retain(|field| field != "password");
        }
        self.repo.paginate(request).await
    }

    /// Updates profile fields. Swipe state is owned by the match service
    /// and stripped here; password changes go through `change_password` so
    /// they cannot bypass the hasher.
    pub async fn update_profile(&self, id: Uuid, changes: ChangeSet) -> DomainResult<Account> {
        let changes = changes.without(&["liked", "matched", "password"]);
        self.repo.update(id, changes).await
    }

    pub async fn change_password(&self, id: Uuid, new_password: &str) -> DomainResult<Account> {
        let hashed = self.hasher.hash(new_password);
        self.repo
            .update(id, ChangeSet::new().set("password", hashed))
            .await
    }

    /// Deletes the account. The account's posts go with it via the store's
    /// cascade.
    pub async fn remove(&self, id: Uuid) -> DomainResult<Account> {
        self.repo.delete(id).await
    }
}
