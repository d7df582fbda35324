use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::joins::{PartyRefJoin, SponsorPoliticianJoin, TagJoin};

#[derive(Debug, Clone, FromRow)]
pub struct PromiseRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub updates: Option<String>,
    pub evidence_url: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Json<Vec<TagJoin>>,
    pub sponsor_politician: Option<Json<SponsorPoliticianJoin>>,
    pub sponsor_party: Option<Json<PartyRefJoin>>,
}
