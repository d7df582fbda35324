//! Stable view models returned to callers. Every id is string-typed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PromiseStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Fulfilled,
    Broken,
    Overdue,
}

impl PromiseStatus {
    pub const ALL: [PromiseStatus; 5] = [
        PromiseStatus::Pending,
        PromiseStatus::InProgress,
        PromiseStatus::Fulfilled,
        PromiseStatus::Broken,
        PromiseStatus::Overdue,
    ];

    /// Label as stored in `promises.status`.
    pub fn label(&self) -> &'static str {
        match self {
            PromiseStatus::Pending => "Pending",
            PromiseStatus::InProgress => "In Progress",
            PromiseStatus::Fulfilled => "Fulfilled",
            PromiseStatus::Broken => "Broken",
            PromiseStatus::Overdue => "Overdue",
        }
    }

    /// Accepts the label in any case, with spaces, dashes or underscores.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize_label(raw);
        Self::ALL
            .into_iter()
            .find(|s| normalize_label(s.label()) == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BillStatus {
    #[default]
    Proposed,
    #[serde(rename = "In Committee")]
    InCommittee,
    #[serde(rename = "Passed House")]
    PassedHouse,
    #[serde(rename = "Passed Senate")]
    PassedSenate,
    Enacted,
    Failed,
    Withdrawn,
}

impl BillStatus {
    pub const ALL: [BillStatus; 7] = [
        BillStatus::Proposed,
        BillStatus::InCommittee,
        BillStatus::PassedHouse,
        BillStatus::PassedSenate,
        BillStatus::Enacted,
        BillStatus::Failed,
        BillStatus::Withdrawn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BillStatus::Proposed => "Proposed",
            BillStatus::InCommittee => "In Committee",
            BillStatus::PassedHouse => "Passed House",
            BillStatus::PassedSenate => "Passed Senate",
            BillStatus::Enacted => "Enacted",
            BillStatus::Failed => "Failed",
            BillStatus::Withdrawn => "Withdrawn",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize_label(raw);
        Self::ALL
            .into_iter()
            .find(|s| normalize_label(s.label()) == wanted)
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolves a status filter or input value for the given kind's enumeration.
pub fn status_label(kind: super::EntityKind, raw: &str) -> Result<&'static str, AppError> {
    let parsed = match kind {
        super::EntityKind::Promise => PromiseStatus::parse(raw).map(|s| s.label()),
        super::EntityKind::Bill => BillStatus::parse(raw).map(|s| s.label()),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::invalid("status", format!("Unknown {kind} status '{raw}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSeverity {
    Minor,
    Moderate,
    Serious,
}

impl RecordSeverity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(RecordSeverity::Minor),
            "moderate" => Some(RecordSeverity::Moderate),
            "serious" => Some(RecordSeverity::Serious),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSeverity::Minor => "minor",
            RecordSeverity::Moderate => "moderate",
            RecordSeverity::Serious => "serious",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Alleged,
    Charged,
    Convicted,
    Acquitted,
    Dismissed,
}

impl RecordStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "alleged" => Some(RecordStatus::Alleged),
            "charged" => Some(RecordStatus::Charged),
            "convicted" => Some(RecordStatus::Convicted),
            "acquitted" => Some(RecordStatus::Acquitted),
            "dismissed" => Some(RecordStatus::Dismissed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Alleged => "alleged",
            RecordStatus::Charged => "charged",
            RecordStatus::Convicted => "convicted",
            RecordStatus::Acquitted => "acquitted",
            RecordStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagView {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBadge {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePartyView {
    #[serde(flatten)]
    pub party: PartyBadge,
    pub role: Option<String>,
    pub since: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliticianBadge {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorKind {
    Politician,
    Party,
}

/// Sponsor of a promise or bill. When the sponsor is a politician, `party`
/// is that politician's active party.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SponsorView {
    pub kind: SponsorKind,
    pub politician: Option<PoliticianBadge>,
    pub party: Option<PartyBadge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerView {
    pub id: String,
    pub title: String,
    pub organization: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    pub id: String,
    pub declaration_year: Option<i32>,
    pub description: String,
    pub estimated_value: Option<f64>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriminalRecordView {
    pub id: String,
    pub case_title: String,
    pub description: Option<String>,
    pub severity: Option<RecordSeverity>,
    pub status: Option<RecordStatus>,
    pub filed_on: Option<NaiveDate>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLinkView {
    pub id: String,
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliticianView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub province: Option<String>,
    pub position: Option<String>,
    pub education: Option<String>,
    pub contact_email: Option<String>,
    pub active_party: Option<ActivePartyView>,
    pub tags: Vec<TagView>,
    pub career: Vec<CareerView>,
    pub assets: Vec<AssetView>,
    pub criminal_records: Vec<CriminalRecordView>,
    pub social_links: Vec<SocialLinkView>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: f64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionView {
    pub id: String,
    pub election_year: i32,
    pub election_type: Option<String>,
    pub seats_won: Option<i32>,
    pub total_seats: Option<i32>,
    pub vote_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceView {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControversyView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub sources: Vec<SourceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyView {
    pub id: String,
    pub name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub ideology: Vec<String>,
    pub headquarters: Option<String>,
    pub website: Option<String>,
    pub tags: Vec<TagView>,
    pub election_history: Vec<ElectionView>,
    pub controversies: Vec<ControversyView>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: f64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: PromiseStatus,
    pub due_date: Option<NaiveDate>,
    pub sponsor: Option<SponsorView>,
    pub updates: Option<String>,
    pub evidence_url: Option<String>,
    pub tags: Vec<TagView>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: f64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub bill_number: Option<String>,
    pub status: BillStatus,
    pub ministry: Option<String>,
    pub category: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub proposed_date: Option<NaiveDate>,
    pub sponsor: Option<SponsorView>,
    pub tags: Vec<TagView>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: f64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityView {
    Politician(PoliticianView),
    Party(PartyView),
    Promise(PromiseView),
    Bill(BillView),
}

impl EntityView {
    pub fn id(&self) -> &str {
        match self {
            EntityView::Politician(v) => &v.id,
            EntityView::Party(v) => &v.id,
            EntityView::Promise(v) => &v.id,
            EntityView::Bill(v) => &v.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;

    #[test]
    fn test_promise_status_parsing_is_lenient() {
        assert_eq!(PromiseStatus::parse("in progress"), Some(PromiseStatus::InProgress));
        assert_eq!(PromiseStatus::parse("In_Progress"), Some(PromiseStatus::InProgress));
        assert_eq!(PromiseStatus::parse("BROKEN"), Some(PromiseStatus::Broken));
        assert_eq!(PromiseStatus::parse("done"), None);
    }

    #[test]
    fn test_bill_status_serializes_to_label() {
        let json = serde_json::to_string(&BillStatus::PassedSenate).unwrap();
        assert_eq!(json, "\"Passed Senate\"");
        for status in BillStatus::ALL {
            assert_eq!(BillStatus::parse(status.label()), Some(status));
        }
    }

    #[test]
    fn test_status_label_rejects_unknown() {
        assert_eq!(status_label(EntityKind::Bill, "enacted").unwrap(), "Enacted");
        assert!(status_label(EntityKind::Promise, "Enacted").is_err());
        assert!(status_label(EntityKind::Party, "Pending").is_err());
    }

    #[test]
    fn test_active_party_flattens_badge() {
        let view = ActivePartyView {
            party: PartyBadge {
                id: "3".into(),
                name: "Green".into(),
                abbreviation: Some("GRN".into()),
                logo_url: None,
            },
            role: Some("Chair".into()),
            since: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["logoUrl"], serde_json::Value::Null);
        assert_eq!(json["role"], "Chair");
    }
}
