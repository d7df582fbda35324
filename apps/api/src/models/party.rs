use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::joins::TagJoin;

#[derive(Debug, Clone, Deserialize)]
pub struct ElectionJoin {
    pub id: i64,
    pub election_year: i32,
    pub election_type: Option<String>,
    pub seats_won: Option<i32>,
    pub total_seats: Option<i32>,
    pub vote_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceJoin {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControversyJoin {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    #[serde(default)]
    pub sources: Vec<SourceJoin>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PartyRow {
    pub id: i64,
    pub name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub founded_date: Option<NaiveDate>,
    /// Delimited list, split at read time.
    pub ideology: Option<String>,
    pub headquarters: Option<String>,
    pub website: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Json<Vec<TagJoin>>,
    pub election_history: Json<Vec<ElectionJoin>>,
    pub controversies: Json<Vec<ControversyJoin>>,
}
