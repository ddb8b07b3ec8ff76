//! Swipestore - transactional data-access core for the Swipestore social backend
//!
//! This library provides the storage layer a request-handling tier builds on:
//! a generic repository (CRUD plus dynamic search/filter/pagination) with
//! uniform transaction boundaries and a stable error taxonomy, and the
//! swipe/match state machine that turns two independent likes into a
//! consistent mutual match.

pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use self::core::{
    AccountService, ChangeSet, DomainError, DomainResult, Entity, FieldValue, FilterSet,
    MatchService, NewAccount, PageRequest, PasswordHasher, PostService, Repository, SwipeAction,
    SwipeOutcome,
};
pub use models::{Account, PageResult, PageSize, Post};
pub use services::{Database, SessionScope, Sessions};
