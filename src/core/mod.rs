// Core exports: error taxonomy, generic repository and the domain services
// layered on top of it.
pub mod accounts;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod posts;
pub mod repository;

pub use accounts::{AccountService, NewAccount, PasswordHasher};
pub use error::{DomainError, DomainResult, SessionError};
pub use filters::{ChangeSet, FieldValue, FilterSet, PageRequest, SearchSpec};
pub use matcher::{MatchService, SwipeAction, SwipeOutcome};
pub use posts::PostService;
pub use repository::{Entity, Repository};
