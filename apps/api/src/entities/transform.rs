//! Pure projections from store rows (with their aggregated joins) to view models.

use crate::entities::rating::compute_rating;
use crate::entities::tags::dedupe_tag_joins;
use crate::entities::views::{
    ActivePartyView, AssetView, BillStatus, BillView, CareerView, ControversyView,
    CriminalRecordView, ElectionView, PartyBadge, PartyView, PoliticianBadge, PoliticianView,
    PromiseStatus, PromiseView, RecordSeverity, RecordStatus, SocialLinkView, SourceView,
    SponsorKind, SponsorView,
};
use crate::models::bill::BillRow;
use crate::models::joins::{MembershipJoin, PartyRefJoin, SponsorPoliticianJoin};
use crate::models::party::PartyRow;
use crate::models::politician::PoliticianRow;
use crate::models::promise::PromiseRow;

/// First membership flagged active that still references a party.
/// The write path keeps at most one active membership per politician.
pub fn resolve_active_party(memberships: &[MembershipJoin]) -> Option<&MembershipJoin> {
    memberships
        .iter()
        .find(|m| m.is_active && m.party.is_some())
}

fn party_badge(party: &PartyRefJoin) -> PartyBadge {
    PartyBadge {
        id: party.id.to_string(),
        name: party.name.clone(),
        abbreviation: party.abbreviation.clone(),
        logo_url: party.logo_url.clone(),
    }
}

fn active_party_view(memberships: &[MembershipJoin]) -> Option<ActivePartyView> {
    let membership = resolve_active_party(memberships)?;
    let party = membership.party.as_ref()?;
    Some(ActivePartyView {
        party: party_badge(party),
        role: membership.role.clone(),
        since: membership.start_date,
    })
}

/// Splits the stored ideology string into discrete values.
pub fn split_ideology(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(|c: char| matches!(c, ',' | ';' | '|'))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// A politician sponsor takes precedence; its party fields come from the
/// politician's active party, never from a directly stored party sponsor.
pub fn resolve_sponsor(
    politician: Option<&SponsorPoliticianJoin>,
    party: Option<&PartyRefJoin>,
) -> Option<SponsorView> {
    if let Some(politician) = politician {
        let party = resolve_active_party(&politician.memberships)
            .and_then(|m| m.party.as_ref())
            .map(party_badge);
        return Some(SponsorView {
            kind: SponsorKind::Politician,
            politician: Some(PoliticianBadge {
                id: politician.id.to_string(),
                name: politician.name.clone(),
                image_url: politician.image_url.clone(),
            }),
            party,
        });
    }
    party.map(|p| SponsorView {
        kind: SponsorKind::Party,
        politician: None,
        party: Some(party_badge(p)),
    })
}

pub fn transform_politician(row: PoliticianRow) -> PoliticianView {
    let active_party = active_party_view(&row.memberships);
    let tags = dedupe_tag_joins(&row.tags);
    let rating = compute_rating(row.upvotes.into(), row.downvotes.into());

    PoliticianView {
        id: row.id.to_string(),
        name: row.name,
        image_url: row.image_url,
        bio: row.bio,
        date_of_birth: row.date_of_birth,
        age: row.age,
        province: row.province,
        position: row.position,
        education: row.education,
        contact_email: row.contact_email,
        active_party,
        tags,
        career: row
            .career
            .0
            .into_iter()
            .map(|c| CareerView {
                id: c.id.to_string(),
                title: c.title,
                organization: c.organization,
                start_date: c.start_date,
                end_date: c.end_date,
                description: c.description,
            })
            .collect(),
        assets: row
            .assets
            .0
            .into_iter()
            .map(|a| AssetView {
                id: a.id.to_string(),
                declaration_year: a.declaration_year,
                description: a.description,
                estimated_value: a.estimated_value,
                source_url: a.source_url,
            })
            .collect(),
        criminal_records: row
            .criminal_records
            .0
            .into_iter()
            .map(|r| CriminalRecordView {
                id: r.id.to_string(),
                case_title: r.case_title,
                description: r.description,
                severity: RecordSeverity::parse(&r.severity),
                status: RecordStatus::parse(&r.status),
                filed_on: r.filed_on,
                source_url: r.source_url,
            })
            .collect(),
        social_links: row
            .social_links
            .0
            .into_iter()
            .map(|l| SocialLinkView {
                id: l.id.to_string(),
                platform: l.platform,
                url: l.url,
            })
            .collect(),
        upvotes: row.upvotes,
        downvotes: row.downvotes,
        rating,
        is_featured: row.is_featured,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub fn transform_party(row: PartyRow) -> PartyView {
    PartyView {
        id: row.id.to_string(),
        ideology: split_ideology(row.ideology.as_deref()),
        tags: dedupe_tag_joins(&row.tags),
        rating: compute_rating(row.upvotes.into(), row.downvotes.into()),
        name: row.name,
        abbreviation: row.abbreviation,
        logo_url: row.logo_url,
        description: row.description,
        founded_date: row.founded_date,
        headquarters: row.headquarters,
        website: row.website,
        election_history: row
            .election_history
            .0
            .into_iter()
            .map(|e| ElectionView {
                id: e.id.to_string(),
                election_year: e.election_year,
                election_type: e.election_type,
                seats_won: e.seats_won,
                total_seats: e.total_seats,
                vote_percentage: e.vote_percentage,
            })
            .collect(),
        controversies: row
            .controversies
            .0
            .into_iter()
            .map(|c| ControversyView {
                id: c.id.to_string(),
                title: c.title,
                description: c.description,
                date: c.occurred_on,
                sources: c
                    .sources
                    .into_iter()
                    .map(|s| SourceView {
                        id: s.id.to_string(),
                        url: s.url,
                    })
                    .collect(),
            })
            .collect(),
        upvotes: row.upvotes,
        downvotes: row.downvotes,
        is_featured: row.is_featured,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub fn transform_promise(row: PromiseRow) -> PromiseView {
    let sponsor = resolve_sponsor(
        row.sponsor_politician.as_ref().map(|j| &j.0),
        row.sponsor_party.as_ref().map(|j| &j.0),
    );
    PromiseView {
        id: row.id.to_string(),
        status: PromiseStatus::parse(&row.status).unwrap_or_default(),
        tags: dedupe_tag_joins(&row.tags),
        rating: compute_rating(row.upvotes.into(), row.downvotes.into()),
        sponsor,
        title: row.title,
        description: row.description,
        due_date: row.due_date,
        updates: row.updates,
        evidence_url: row.evidence_url,
        upvotes: row.upvotes,
        downvotes: row.downvotes,
        is_featured: row.is_featured,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub fn transform_bill(row: BillRow) -> BillView {
    let sponsor = resolve_sponsor(
        row.sponsor_politician.as_ref().map(|j| &j.0),
        row.sponsor_party.as_ref().map(|j| &j.0),
    );
    BillView {
        id: row.id.to_string(),
        status: BillStatus::parse(&row.status).unwrap_or_default(),
        tags: dedupe_tag_joins(&row.tags),
        rating: compute_rating(row.upvotes.into(), row.downvotes.into()),
        sponsor,
        title: row.title,
        description: row.description,
        bill_number: row.bill_number,
        ministry: row.ministry,
        category: row.category,
        registration_date: row.registration_date,
        proposed_date: row.proposed_date,
        upvotes: row.upvotes,
        downvotes: row.downvotes,
        is_featured: row.is_featured,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
