use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{DomainError, DomainResult, SessionError};
use crate::core::filters::ChangeSet;
use crate::core::repository::{Entity, Repository};
use crate::models::Account;
use crate::services::session::Sessions;

/// A swipe from one account toward another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Dislike,
}

/// What a swipe did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeOutcome {
    /// The actor's `liked` collection gained the target's key.
    pub was_new_like: bool,
    /// The pair is (or already was) mutually matched.
    pub is_match: bool,
}

/// The state transition a swipe implies, decided from both accounts' swipe
/// state. Pure: persistence happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwipeTransition {
    pub record_like: bool,
    pub record_match: bool,
    pub is_match: bool,
}

impl SwipeTransition {
    pub(crate) fn evaluate(
        action: SwipeAction,
        actor_id: Uuid,
        target_id: Uuid,
        actor_liked: &[Uuid],
        actor_matched: &[Uuid],
        target_liked: &[Uuid],
    ) -> Self {
        // Dislikes are not persisted; the pair's state is untouched.
        if action != SwipeAction::Like {
            return Self {
                record_like: false,
                record_match: false,
                is_match: false,
            };
        }

        // Repeated like: nothing to write, but report the pair's standing
        // match state so callers see a stable answer.
        if actor_liked.contains(&target_id) {
            return Self {
                record_like: false,
                record_match: false,
                is_match: actor_matched.contains(&target_id),
            };
        }

        let reciprocal = target_liked.contains(&actor_id);
        Self {
            record_like: true,
            record_match: reciprocal,
            is_match: reciprocal,
        }
    }
}

/// Like/dislike/match state machine over pairs of accounts.
///
/// Transitions are one-directional until matched; there is no unlike. The
/// `liked` and `matched` collections on `accounts` rows are written only
/// here.
#[derive(Clone)]
pub struct MatchService {
    sessions: Sessions,
}

impl MatchService {
    pub fn new(sessions: Sessions) -> Self {
        Self { sessions }
    }

    /// Applies one swipe and reports whether it recorded a new like and
    /// whether the pair is matched.
    ///
    /// The whole read-modify-write runs in a single committed scope with
    /// both account rows locked `FOR UPDATE`, so two concurrent swipes on
    /// the same account cannot lose each other's appends. Rows are locked
    /// in ascending key order; crossing swipes for the same pair then
    /// acquire their locks in the same order and queue instead of
    /// deadlocking.
    pub async fn swipe(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        action: SwipeAction,
    ) -> DomainResult<SwipeOutcome> {
        if actor_id == target_id {
            return Err(DomainError::Validation(
                "an account cannot swipe itself".to_string(),
            ));
        }

        self.sessions
            .run(Account::TABLE, true, move |scope| {
                Box::pin(async move {
                    let (lo, hi) = if actor_id < target_id {
                        (actor_id, target_id)
                    } else {
                        (target_id, actor_id)
                    };
                    let lo_row = Repository::<Account>::get_for_update_in(scope, &lo).await?;
                    let hi_row = Repository::<Account>::get_for_update_in(scope, &hi).await?;
                    let (actor, target) = if lo == actor_id {
                        (lo_row, hi_row)
                    } else {
                        (hi_row, lo_row)
                    };
                    let actor = actor.ok_or_else(|| missing_account(actor_id))?;
                    let target = target.ok_or_else(|| missing_account(target_id))?;

                    let transition = SwipeTransition::evaluate(
                        action,
                        actor_id,
                        target_id,
                        &actor.liked,
                        &actor.matched,
                        &target.liked,
                    );

                    if transition.record_like {
                        let mut liked = actor.liked.clone();
                        liked.push(target_id);
                        Repository::<Account>::update_in(
                            scope,
                            &actor_id,
                            &ChangeSet::new().set("liked", liked),
                        )
                        .await?;
                    }

                    if transition.record_match {
                        let mut actor_matched = actor.matched.clone();
                        actor_matched.push(target_id);
                        let mut target_matched = target.matched.clone();
                        target_matched.push(actor_id);

                        Repository::<Account>::update_in(
                            scope,
                            &actor_id,
                            &ChangeSet::new().set("matched", actor_matched),
                        )
                        .await?;
                        Repository::<Account>::update_in(
                            scope,
                            &target_id,
                            &ChangeSet::new().set("matched", target_matched),
                        )
                        .await?;

                        tracing::info!(%actor_id, %target_id, "mutual match recorded");
                    }

                    Ok(SwipeOutcome {
                        was_new_like: transition.record_like,
                        is_match: transition.is_match,
                    })
                })
            })
            .await
    }
}

fn missing_account(id: Uuid) -> SessionError {
    SessionError::Domain(DomainError::Validation(format!(
        "account {id} does not exist"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_dislike_changes_nothing() {
        let (a, b) = ids();
        let t = SwipeTransition::evaluate(SwipeAction::Dislike, a, b, &[], &[], &[b]);
        assert_eq!(
            t,
            SwipeTransition {
                record_like: false,
                record_match: false,
                is_match: false
            }
        );
    }

    #[test]
    fn test_first_like_without_reciprocal() {
        let (a, b) = ids();
        let t = SwipeTransition::evaluate(SwipeAction::Like, a, b, &[], &[], &[]);
        assert_eq!(
            t,
            SwipeTransition {
                record_like: true,
                record_match: false,
                is_match: false
            }
        );
    }

    #[test]
    fn test_reciprocal_like_becomes_match() {
        let (a, b) = ids();
        let t = SwipeTransition::evaluate(SwipeAction::Like, a, b, &[], &[], &[a]);
        assert_eq!(
            t,
            SwipeTransition {
                record_like: true,
                record_match: true,
                is_match: true
            }
        );
    }

    #[test]
    fn test_repeated_like_is_idempotent() {
        let (a, b) = ids();
        // Not matched: second like reports (false, false).
        let t = SwipeTransition::evaluate(SwipeAction::Like, a, b, &[b], &[], &[]);
        assert_eq!(
            t,
            SwipeTransition {
                record_like: false,
                record_match: false,
                is_match: false
            }
        );

        // Already matched: second like still reports the match, writes
        // nothing.
        let t = SwipeTransition::evaluate(SwipeAction::Like, a, b, &[b], &[b], &[a]);
        assert_eq!(
            t,
            SwipeTransition {
                record_like: false,
                record_match: false,
                is_match: true
            }
        );
    }

    #[test]
    fn test_unrelated_likes_do_not_match() {
        let (a, b) = ids();
        let c = Uuid::new_v4();
        // Target likes someone else entirely.
        let t = SwipeTransition::evaluate(SwipeAction::Like, a, b, &[], &[], &[c]);
        assert!(t.record_like);
        assert!(!t.is_match);
    }
}
