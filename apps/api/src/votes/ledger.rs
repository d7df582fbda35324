//! Per-user up/down vote ledger with denormalized counters on the entity row.
//!
//! A vote cast is one transaction: the entity row is locked, the ledger row
//! is inserted, deleted or flipped, and both counters move by the planned
//! deltas (floored at 0). Concurrent casts on the same item serialize on the
//! row lock, so counters track the ledger exactly.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::entities::rating::compute_rating;
use crate::entities::EntityKind;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "up" => Some(VoteType::Up),
            "down" => Some(VoteType::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Insert,
    Delete,
    Update,
}

/// What a cast does to the ledger row and to the two counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotePlan {
    pub op: LedgerOp,
    pub up_delta: i32,
    pub down_delta: i32,
    /// The caller's vote after the cast.
    pub resulting: Option<VoteType>,
}

/// Same direction twice toggles the vote off; the opposite direction flips it.
pub fn plan_vote(existing: Option<VoteType>, requested: VoteType) -> VotePlan {
    let delta = |vote: VoteType, amount: i32| match vote {
        VoteType::Up => (amount, 0),
        VoteType::Down => (0, amount),
    };
    match existing {
        None => {
            let (up_delta, down_delta) = delta(requested, 1);
            VotePlan {
                op: LedgerOp::Insert,
                up_delta,
                down_delta,
                resulting: Some(requested),
            }
        }
        Some(current) if current == requested => {
            let (up_delta, down_delta) = delta(requested, -1);
            VotePlan {
                op: LedgerOp::Delete,
                up_delta,
                down_delta,
                resulting: None,
            }
        }
        Some(current) => {
            let (old_up, old_down) = delta(current, -1);
            let (new_up, new_down) = delta(requested, 1);
            VotePlan {
                op: LedgerOp::Update,
                up_delta: old_up + new_up,
                down_delta: old_down + new_down,
                resulting: Some(requested),
            }
        }
    }
}

/// Returned to the client so it can refresh its local vote cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub item_id: String,
    pub item_type: EntityKind,
    pub vote: Option<VoteType>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub rating: f64,
}

pub async fn cast_vote(
    pool: &PgPool,
    user_id: Uuid,
    kind: EntityKind,
    item_id: i64,
    requested: VoteType,
) -> Result<VoteOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let locked: Option<i64> =
        sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", kind.table()))
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;
    if locked.is_none() {
        return Err(kind.not_found(item_id));
    }

    let existing: Option<String> = sqlx::query_scalar(
        "SELECT vote_type FROM votes WHERE user_id = $1 AND item_id = $2 AND item_type = $3",
    )
    .bind(user_id)
    .bind(item_id)
    .bind(kind.as_str())
    .fetch_optional(&mut *tx)
    .await?;
    let existing = existing.as_deref().and_then(VoteType::parse);

    let plan = plan_vote(existing, requested);
    match plan.op {
        LedgerOp::Insert => {
            sqlx::query(
                "INSERT INTO votes (user_id, item_id, item_type, vote_type) VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(item_id)
            .bind(kind.as_str())
            .bind(requested.as_str())
            .execute(&mut *tx)
            .await?;
        }
        LedgerOp::Delete => {
            sqlx::query("DELETE FROM votes WHERE user_id = $1 AND item_id = $2 AND item_type = $3")
                .bind(user_id)
                .bind(item_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await?;
        }
        LedgerOp::Update => {
            sqlx::query(
                r#"
                UPDATE votes SET vote_type = $4, updated_at = now()
                WHERE user_id = $1 AND item_id = $2 AND item_type = $3
                "#,
            )
            .bind(user_id)
            .bind(item_id)
            .bind(kind.as_str())
            .bind(requested.as_str())
            .execute(&mut *tx)
            .await?;
        }
    }

    let (upvotes, downvotes): (i32, i32) = sqlx::query_as(&format!(
        r#"
        UPDATE {} SET
            upvotes = GREATEST(upvotes + $2, 0),
            downvotes = GREATEST(downvotes + $3, 0)
        WHERE id = $1
        RETURNING upvotes, downvotes
        "#,
        kind.table()
    ))
    .bind(item_id)
    .bind(plan.up_delta)
    .bind(plan.down_delta)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        kind = kind.as_str(),
        item_id,
        %user_id,
        vote = ?plan.resulting,
        upvotes,
        downvotes,
        "Vote cast"
    );

    let (upvotes, downvotes) = (i64::from(upvotes), i64::from(downvotes));
    Ok(VoteOutcome {
        item_id: item_id.to_string(),
        item_type: kind,
        vote: plan.resulting,
        upvotes,
        downvotes,
        rating: compute_rating(upvotes, downvotes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Applies plans the same way `cast_vote` does, without a database.
    #[derive(Default)]
    struct MemoryLedger {
        rows: HashMap<Uuid, VoteType>,
        upvotes: i32,
        downvotes: i32,
    }

    impl MemoryLedger {
        fn cast(&mut self, user: Uuid, requested: VoteType) -> VotePlan {
            let plan = plan_vote(self.rows.get(&user).copied(), requested);
            match plan.resulting {
                Some(vote) => self.rows.insert(user, vote),
                None => self.rows.remove(&user),
            };
            self.upvotes = (self.upvotes + plan.up_delta).max(0);
            self.downvotes = (self.downvotes + plan.down_delta).max(0);
            plan
        }

        fn counted(&self, vote: VoteType) -> i32 {
            self.rows.values().filter(|v| **v == vote).count() as i32
        }
    }

    #[test]
    fn test_fresh_vote_inserts() {
        let plan = plan_vote(None, VoteType::Down);
        assert_eq!(plan.op, LedgerOp::Insert);
        assert_eq!((plan.up_delta, plan.down_delta), (0, 1));
        assert_eq!(plan.resulting, Some(VoteType::Down));
    }

    #[test]
    fn test_same_direction_toggles_off() {
        let plan = plan_vote(Some(VoteType::Up), VoteType::Up);
        assert_eq!(plan.op, LedgerOp::Delete);
        assert_eq!((plan.up_delta, plan.down_delta), (-1, 0));
        assert_eq!(plan.resulting, None);
    }

    #[test]
    fn test_opposite_direction_flips() {
        let plan = plan_vote(Some(VoteType::Up), VoteType::Down);
        assert_eq!(plan.op, LedgerOp::Update);
        assert_eq!((plan.up_delta, plan.down_delta), (-1, 1));
        assert_eq!(plan.resulting, Some(VoteType::Down));
    }

    #[test]
    fn test_up_twice_restores_baseline() {
        let mut ledger = MemoryLedger {
            upvotes: 7,
            downvotes: 3,
            ..Default::default()
        };
        let user = Uuid::new_v4();
        ledger.cast(user, VoteType::Up);
        ledger.cast(user, VoteType::Up);
        assert!(ledger.rows.is_empty());
        assert_eq!((ledger.upvotes, ledger.downvotes), (7, 3));
    }

    #[test]
    fn test_up_then_down_leaves_one_down_row() {
        let mut ledger = MemoryLedger {
            upvotes: 7,
            downvotes: 3,
            ..Default::default()
        };
        let user = Uuid::new_v4();
        ledger.cast(user, VoteType::Up);
        ledger.cast(user, VoteType::Down);
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows.get(&user), Some(&VoteType::Down));
        assert_eq!((ledger.upvotes, ledger.downvotes), (7, 4));
    }

    #[test]
    fn test_counters_track_ledger_across_many_users() {
        let mut ledger = MemoryLedger::default();
        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let script = [
            (0, VoteType::Up),
            (1, VoteType::Down),
            (2, VoteType::Up),
            (0, VoteType::Down),
            (1, VoteType::Down),
            (3, VoteType::Up),
            (2, VoteType::Up),
            (4, VoteType::Down),
            (3, VoteType::Down),
        ];
        for (user, vote) in script {
            ledger.cast(users[user], vote);
            assert_eq!(ledger.upvotes, ledger.counted(VoteType::Up));
            assert_eq!(ledger.downvotes, ledger.counted(VoteType::Down));
        }
    }

    #[test]
    fn test_counters_never_negative_after_drift() {
        // Row exists but the cached counter was already zero.
        let user = Uuid::new_v4();
        let mut ledger = MemoryLedger::default();
        ledger.rows.insert(user, VoteType::Up);
        ledger.cast(user, VoteType::Down);
        assert_eq!((ledger.upvotes, ledger.downvotes), (0, 1));
    }

    #[test]
    fn test_vote_type_wire_format() {
        assert_eq!(serde_json::to_string(&VoteType::Up).unwrap(), "\"up\"");
        assert_eq!(VoteType::parse("down"), Some(VoteType::Down));
        assert_eq!(VoteType::parse("sideways"), None);
    }
}
