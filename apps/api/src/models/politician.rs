use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::joins::{MembershipJoin, TagJoin};

#[derive(Debug, Clone, Deserialize)]
pub struct CareerJoin {
    pub id: i64,
    pub title: String,
    pub organization: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetJoin {
    pub id: i64,
    pub declaration_year: Option<i32>,
    pub description: String,
    pub estimated_value: Option<f64>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CriminalRecordJoin {
    pub id: i64,
    pub case_title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status: String,
    pub filed_on: Option<NaiveDate>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialLinkJoin {
    pub id: i64,
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PoliticianRow {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub province: Option<String>,
    pub position: Option<String>,
    pub education: Option<String>,
    pub contact_email: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub memberships: Json<Vec<MembershipJoin>>,
    pub tags: Json<Vec<TagJoin>>,
    pub career: Json<Vec<CareerJoin>>,
    pub assets: Json<Vec<AssetJoin>>,
    pub criminal_records: Json<Vec<CriminalRecordJoin>>,
    pub social_links: Json<Vec<SocialLinkJoin>>,
}
