use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::auth::Caller;
use crate::entities::fetcher::fetch_entity;
use crate::entities::input::EntityDraft;
use crate::entities::views::EntityView;
use crate::entities::writes::{insert_draft, update_draft};
use crate::entities::EntityKind;
use crate::errors::AppError;
use crate::models::suggestion::SuggestionRow;
use crate::suggestions::workflow::{lock_suggestion, set_resolution};
use crate::suggestions::SuggestionStatus;

#[derive(Debug, Clone, Serialize)]
pub struct ModerationOutcome {
    pub suggestion: SuggestionRow,
    /// The created or updated entity, for approvals.
    pub entity: Option<EntityView>,
}

/// The write an approval performs: the stored payload re-validated against
/// the current rules, and the row to update (`None` creates a new item).
#[derive(Debug)]
pub struct ApprovalPlan {
    pub draft: EntityDraft,
    pub target: Option<i64>,
}

impl ApprovalPlan {
    pub fn from_row(row: &SuggestionRow) -> Result<Self, AppError> {
        SuggestionStatus::parse(&row.status)?.ensure_pending(row.id)?;
        let kind: EntityKind = row.entity_type.parse()?;
        Ok(ApprovalPlan {
            draft: EntityDraft::parse(kind, &row.suggested_data)?,
            target: row.entity_id,
        })
    }
}

/// Applies `suggested_data` as stored and marks the suggestion approved,
/// in one transaction.
pub async fn approve_suggestion(
    pool: &PgPool,
    id: i64,
    reviewer: Caller,
    note: Option<&str>,
) -> Result<ModerationOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let row = lock_suggestion(&mut tx, id).await?;
    let plan = ApprovalPlan::from_row(&row)?;
    let kind = plan.draft.kind();
    let entity_id = match plan.target {
        Some(entity_id) => {
            update_draft(&mut tx, entity_id, &plan.draft).await?;
            entity_id
        }
        None => insert_draft(&mut tx, &plan.draft).await?,
    };

    let suggestion = set_resolution(
        &mut tx,
        id,
        SuggestionStatus::Approved,
        reviewer.user_id,
        note,
    )
    .await?;
    tx.commit().await?;

    info!(
        suggestion_id = id,
        kind = kind.as_str(),
        entity_id,
        reviewer = %reviewer.user_id,
        "Suggestion approved"
    );

    let entity = fetch_entity(pool, kind, entity_id).await?;
    Ok(ModerationOutcome {
        suggestion,
        entity: Some(entity),
    })
}

pub async fn reject_suggestion(
    pool: &PgPool,
    id: i64,
    reviewer: Caller,
    note: Option<&str>,
) -> Result<ModerationOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let row = lock_suggestion(&mut tx, id).await?;
    SuggestionStatus::parse(&row.status)?.ensure_pending(id)?;

    let suggestion = set_resolution(
        &mut tx,
        id,
        SuggestionStatus::Rejected,
        reviewer.user_id,
        note,
    )
    .await?;
    tx.commit().await?;

    info!(suggestion_id = id, reviewer = %reviewer.user_id, "Suggestion rejected");
    Ok(ModerationOutcome {
        suggestion,
        entity: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn suggestion(entity_type: &str, entity_id: Option<i64>, data: Value, status: &str) -> SuggestionRow {
        let now = Utc::now();
        SuggestionRow {
            id: 21,
            entity_type: entity_type.to_string(),
            entity_id,
            suggested_data: data,
            is_new_item_suggestion: entity_id.is_none(),
            submitter_id: Uuid::new_v4(),
            status: status.to_string(),
            reviewer_id: None,
            review_note: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_new_item_suggestion_plans_insert() {
        let row = suggestion("promise", None, json!({ "title": "Free transit", "tags": "Transport" }), "pending");
        let plan = ApprovalPlan::from_row(&row).unwrap();
        assert_eq!(plan.target, None);
        assert_eq!(plan.draft.kind(), EntityKind::Promise);
    }

    #[test]
    fn test_edit_suggestion_plans_update_of_target() {
        let row = suggestion("party", Some(9), json!({ "name": "Green Alliance" }), "pending");
        let plan = ApprovalPlan::from_row(&row).unwrap();
        assert_eq!(plan.target, Some(9));
        assert_eq!(plan.draft.kind(), EntityKind::Party);
    }

    #[test]
    fn test_resolved_suggestions_cannot_be_approved_again() {
        for status in ["approved", "rejected"] {
            let row = suggestion("party", Some(9), json!({ "name": "Green Alliance" }), status);
            assert!(matches!(ApprovalPlan::from_row(&row), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_stored_payload_is_revalidated() {
        let row = suggestion(
            "bill",
            None,
            json!({ "title": "Budget act", "sponsorPoliticianId": "1", "sponsorPartyId": "2" }),
            "pending",
        );
        assert!(matches!(ApprovalPlan::from_row(&row), Err(AppError::BadRequest(_))));

        let row = suggestion("news", None, json!({ "title": "x" }), "pending");
        assert!(ApprovalPlan::from_row(&row).is_err());
    }
}
