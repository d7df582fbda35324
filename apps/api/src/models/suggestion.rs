use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SuggestionRow {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub suggested_data: Value,
    pub is_new_item_suggestion: bool,
    pub submitter_id: Uuid,
    pub status: String,
    pub reviewer_id: Option<Uuid>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
