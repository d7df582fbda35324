//! Nested relation shapes aggregated by the store as JSON alongside a base row.

use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TagJoin {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyRefJoin {
    pub id: i64,
    pub name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembershipJoin {
    pub role: Option<String>,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub party: Option<PartyRefJoin>,
}

/// A politician referenced as a promise/bill sponsor, with enough membership
/// data to resolve their active party.
#[derive(Debug, Clone, Deserialize)]
pub struct SponsorPoliticianJoin {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub memberships: Vec<MembershipJoin>,
}
