//! Create/update payloads and their validation. Validation runs before any
//! write, whether the write is direct or queued as a suggestion.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::entities::tags::TagList;
use crate::entities::views::{status_label, RecordSeverity, RecordStatus};
use crate::entities::EntityKind;
use crate::errors::AppError;

/// An id sent either as a JSON number or as a (possibly empty) string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(i64),
    Text(String),
}

impl IdInput {
    fn resolve(&self, field: &str) -> Result<Option<i64>, AppError> {
        match self {
            IdInput::Number(n) if *n > 0 => Ok(Some(*n)),
            IdInput::Number(_) => Err(AppError::invalid(field, format!("{field} must be positive"))),
            IdInput::Text(s) if s.trim().is_empty() => Ok(None),
            IdInput::Text(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .map(Some)
                .ok_or_else(|| AppError::invalid(field, format!("{field} must be a numeric id"))),
        }
    }
}

fn resolve_id(value: &Option<IdInput>, field: &str) -> Result<Option<i64>, AppError> {
    value.as_ref().map_or(Ok(None), |id| id.resolve(field))
}

/// Keeps an explicit `null` apart from an absent field: absent stays `None`
/// through `#[serde(default)]`, `null` becomes `Some(None)`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Dates arrive as `YYYY-MM-DD`; blank strings mean "no date".
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

// ── Politician ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerInput {
    pub title: String,
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInput {
    pub declaration_year: Option<i32>,
    pub description: String,
    pub estimated_value: Option<f64>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriminalRecordInput {
    pub case_title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub filed_on: Option<NaiveDate>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialLinkInput {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliticianInput {
    #[serde(default)]
    pub name: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub province: Option<String>,
    pub position: Option<String>,
    pub education: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub party_id: Option<Option<IdInput>>,
    pub party_role: Option<String>,
    pub tags: Option<TagList>,
    pub career: Option<Vec<CareerInput>>,
    pub assets: Option<Vec<AssetInput>>,
    pub criminal_records: Option<Vec<CriminalRecordInput>>,
    pub social_links: Option<Vec<SocialLinkInput>>,
}

#[derive(Debug, Clone)]
pub struct CriminalRecordDraft {
    pub case_title: String,
    pub description: Option<String>,
    pub severity: RecordSeverity,
    pub status: RecordStatus,
    pub filed_on: Option<NaiveDate>,
    pub source_url: Option<String>,
}

/// What a politician write does to party memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyChange {
    /// `partyId` absent or blank: memberships untouched.
    Keep,
    /// `partyId: null`: the active membership is ended.
    Leave,
    Join(i64),
}

impl PartyChange {
    fn resolve(value: &Option<Option<IdInput>>) -> Result<Self, AppError> {
        match value {
            None => Ok(PartyChange::Keep),
            Some(None) => Ok(PartyChange::Leave),
            Some(Some(id)) => Ok(id
                .resolve("partyId")?
                .map_or(PartyChange::Keep, PartyChange::Join)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoliticianDraft {
    pub name: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub province: Option<String>,
    pub position: Option<String>,
    pub education: Option<String>,
    pub contact_email: Option<String>,
    pub party: PartyChange,
    pub party_role: Option<String>,
    pub tags: Option<Vec<String>>,
    pub career: Option<Vec<CareerInput>>,
    pub assets: Option<Vec<AssetInput>>,
    pub criminal_records: Option<Vec<CriminalRecordDraft>>,
    pub social_links: Option<Vec<SocialLinkInput>>,
}

impl PoliticianInput {
    pub fn validate(self) -> Result<PoliticianDraft, AppError> {
        let name = required(&self.name, "name")?;
        if let Some(email) = clean(&self.contact_email) {
            if !email.contains('@') {
                return Err(AppError::invalid("contactEmail", "contactEmail must be an email address"));
            }
        }
        if let Some(career) = &self.career {
            for entry in career {
                required(&entry.title, "career.title")?;
            }
        }
        if let Some(assets) = &self.assets {
            for asset in assets {
                required(&asset.description, "assets.description")?;
            }
        }
        if let Some(links) = &self.social_links {
            for link in links {
                required(&link.platform, "socialLinks.platform")?;
                required(&link.url, "socialLinks.url")?;
            }
        }
        let criminal_records = self
            .criminal_records
            .map(|records| {
                records
                    .into_iter()
                    .map(|r| -> Result<CriminalRecordDraft, AppError> {
                        Ok(CriminalRecordDraft {
                            case_title: required(&r.case_title, "criminalRecords.caseTitle")?,
                            severity: RecordSeverity::parse(&r.severity).ok_or_else(|| {
                                AppError::invalid(
                                    "criminalRecords.severity",
                                    format!("Unknown severity '{}'", r.severity),
                                )
                            })?,
                            status: RecordStatus::parse(&r.status).ok_or_else(|| {
                                AppError::invalid(
                                    "criminalRecords.status",
                                    format!("Unknown status '{}'", r.status),
                                )
                            })?,
                            description: clean(&r.description),
                            filed_on: r.filed_on,
                            source_url: clean(&r.source_url),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(PoliticianDraft {
            name,
            image_url: clean(&self.image_url),
            bio: clean(&self.bio),
            date_of_birth: self.date_of_birth,
            province: clean(&self.province),
            position: clean(&self.position),
            education: clean(&self.education),
            contact_email: clean(&self.contact_email),
            party: PartyChange::resolve(&self.party_id)?,
            party_role: clean(&self.party_role),
            tags: self.tags.map(|t| t.0),
            career: self.career,
            assets: self.assets,
            criminal_records,
            social_links: self.social_links,
        })
    }
}

// ── Party ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdeologyInput {
    Delimited(String),
    Values(Vec<String>),
}

impl IdeologyInput {
    /// Joined form stored in `parties.ideology`.
    fn joined(&self) -> Option<String> {
        let values: Vec<String> = match self {
            IdeologyInput::Delimited(s) => s.split(',').map(str::to_string).collect(),
            IdeologyInput::Values(v) => v.clone(),
        };
        let values: Vec<&str> = values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionInput {
    pub election_year: i32,
    pub election_type: Option<String>,
    pub seats_won: Option<i32>,
    pub total_seats: Option<i32>,
    pub vote_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControversyInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInput {
    #[serde(default)]
    pub name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub founded_date: Option<NaiveDate>,
    pub ideology: Option<IdeologyInput>,
    pub headquarters: Option<String>,
    pub website: Option<String>,
    pub tags: Option<TagList>,
    pub election_history: Option<Vec<ElectionInput>>,
    pub controversies: Option<Vec<ControversyInput>>,
}

#[derive(Debug, Clone)]
pub struct PartyDraft {
    pub name: String,
    pub abbreviation: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub ideology: Option<String>,
    pub headquarters: Option<String>,
    pub website: Option<String>,
    pub tags: Option<Vec<String>>,
    pub election_history: Option<Vec<ElectionInput>>,
    pub controversies: Option<Vec<ControversyInput>>,
}

impl PartyInput {
    pub fn validate(self) -> Result<PartyDraft, AppError> {
        let name = required(&self.name, "name")?;
        if let Some(history) = &self.election_history {
            for entry in history {
                if let (Some(won), Some(total)) = (entry.seats_won, entry.total_seats) {
                    if won > total {
                        return Err(AppError::invalid(
                            "electionHistory.seatsWon",
                            "seatsWon cannot exceed totalSeats",
                        ));
                    }
                }
                if let Some(pct) = entry.vote_percentage {
                    if !(0.0..=100.0).contains(&pct) {
                        return Err(AppError::invalid(
                            "electionHistory.votePercentage",
                            "votePercentage must be between 0 and 100",
                        ));
                    }
                }
            }
        }
        let controversies = self
            .controversies
            .map(|list| {
                list.into_iter()
                    .map(|c| -> Result<ControversyInput, AppError> {
                        Ok(ControversyInput {
                            title: required(&c.title, "controversies.title")?,
                            description: clean(&c.description),
                            date: c.date,
                            sources: c
                                .sources
                                .iter()
                                .map(|s| s.trim().to_string())
                                .filter(|s| !s.is_empty())
                                .collect(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(PartyDraft {
            name,
            abbreviation: clean(&self.abbreviation),
            logo_url: clean(&self.logo_url),
            description: clean(&self.description),
            founded_date: self.founded_date,
            ideology: self.ideology.as_ref().and_then(IdeologyInput::joined),
            headquarters: clean(&self.headquarters),
            website: clean(&self.website),
            tags: self.tags.map(|t| t.0),
            election_history: self.election_history,
            controversies,
        })
    }
}

// ── Promise / Bill ──────────────────────────────────────────────────────────

/// Sponsor of a promise or bill: a politician or a party, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sponsor {
    #[default]
    None,
    Politician(i64),
    Party(i64),
}

impl Sponsor {
    pub fn resolve(
        politician: &Option<IdInput>,
        party: &Option<IdInput>,
    ) -> Result<Sponsor, AppError> {
        let politician = resolve_id(politician, "sponsorPoliticianId")?;
        let party = resolve_id(party, "sponsorPartyId")?;
        match (politician, party) {
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "A sponsor must be either a politician or a party, not both".to_string(),
            )),
            (Some(id), None) => Ok(Sponsor::Politician(id)),
            (None, Some(id)) => Ok(Sponsor::Party(id)),
            (None, None) => Ok(Sponsor::None),
        }
    }

    pub fn politician_id(&self) -> Option<i64> {
        match self {
            Sponsor::Politician(id) => Some(*id),
            _ => None,
        }
    }

    pub fn party_id(&self) -> Option<i64> {
        match self {
            Sponsor::Party(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseInput {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    pub sponsor_politician_id: Option<IdInput>,
    pub sponsor_party_id: Option<IdInput>,
    pub updates: Option<String>,
    pub evidence_url: Option<String>,
    pub tags: Option<TagList>,
}

#[derive(Debug, Clone)]
pub struct PromiseDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: &'static str,
    pub due_date: Option<NaiveDate>,
    pub sponsor: Sponsor,
    pub updates: Option<String>,
    pub evidence_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PromiseInput {
    pub fn validate(self) -> Result<PromiseDraft, AppError> {
        let sponsor = Sponsor::resolve(&self.sponsor_politician_id, &self.sponsor_party_id)?;
        let title = required(&self.title, "title")?;
        let status = match clean(&self.status) {
            Some(raw) => status_label(EntityKind::Promise, &raw)?,
            None => "Pending",
        };
        Ok(PromiseDraft {
            title,
            description: clean(&self.description),
            status,
            due_date: self.due_date,
            sponsor,
            updates: clean(&self.updates),
            evidence_url: clean(&self.evidence_url),
            tags: self.tags.map(|t| t.0),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillInput {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub bill_number: Option<String>,
    pub status: Option<String>,
    pub ministry: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub registration_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub proposed_date: Option<NaiveDate>,
    pub sponsor_politician_id: Option<IdInput>,
    pub sponsor_party_id: Option<IdInput>,
    pub tags: Option<TagList>,
}

#[derive(Debug, Clone)]
pub struct BillDraft {
    pub title: String,
    pub description: Option<String>,
    pub bill_number: Option<String>,
    pub status: &'static str,
    pub ministry: Option<String>,
    pub category: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub proposed_date: Option<NaiveDate>,
    pub sponsor: Sponsor,
    pub tags: Option<Vec<String>>,
}

impl BillInput {
    pub fn validate(self) -> Result<BillDraft, AppError> {
        let sponsor = Sponsor::resolve(&self.sponsor_politician_id, &self.sponsor_party_id)?;
        let title = required(&self.title, "title")?;
        let status = match clean(&self.status) {
            Some(raw) => status_label(EntityKind::Bill, &raw)?,
            None => "Proposed",
        };
        if let (Some(registered), Some(proposed)) = (self.registration_date, self.proposed_date) {
            if proposed < registered {
                return Err(AppError::invalid(
                    "proposedDate",
                    "proposedDate cannot precede registrationDate",
                ));
            }
        }
        Ok(BillDraft {
            title,
            description: clean(&self.description),
            bill_number: clean(&self.bill_number),
            status,
            ministry: clean(&self.ministry),
            category: clean(&self.category),
            registration_date: self.registration_date,
            proposed_date: self.proposed_date,
            sponsor,
            tags: self.tags.map(|t| t.0),
        })
    }
}

// ── Dispatch ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum EntityDraft {
    Politician(PoliticianDraft),
    Party(PartyDraft),
    Promise(PromiseDraft),
    Bill(BillDraft),
}

impl EntityDraft {
    /// Deserializes and validates a payload for `kind`.
    pub fn parse(kind: EntityKind, payload: &Value) -> Result<EntityDraft, AppError> {
        if !payload.is_object() {
            return Err(AppError::BadRequest(format!(
                "{} payload must be a JSON object",
                kind.label()
            )));
        }
        let malformed =
            |e: serde_json::Error| AppError::BadRequest(format!("Invalid {kind} payload: {e}"));
        Ok(match kind {
            EntityKind::Politician => EntityDraft::Politician(
                serde_json::from_value::<PoliticianInput>(payload.clone())
                    .map_err(malformed)?
                    .validate()?,
            ),
            EntityKind::Party => EntityDraft::Party(
                serde_json::from_value::<PartyInput>(payload.clone())
                    .map_err(malformed)?
                    .validate()?,
            ),
            EntityKind::Promise => EntityDraft::Promise(
                serde_json::from_value::<PromiseInput>(payload.clone())
                    .map_err(malformed)?
                    .validate()?,
            ),
            EntityKind::Bill => EntityDraft::Bill(
                serde_json::from_value::<BillInput>(payload.clone())
                    .map_err(malformed)?
                    .validate()?,
            ),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDraft::Politician(_) => EntityKind::Politician,
            EntityDraft::Party(_) => EntityKind::Party,
            EntityDraft::Promise(_) => EntityKind::Promise,
            EntityDraft::Bill(_) => EntityKind::Bill,
        }
    }

    pub fn tags(&self) -> Option<&[String]> {
        match self {
            EntityDraft::Politician(d) => d.tags.as_deref(),
            EntityDraft::Party(d) => d.tags.as_deref(),
            EntityDraft::Promise(d) => d.tags.as_deref(),
            EntityDraft::Bill(d) => d.tags.as_deref(),
        }
    }
}
