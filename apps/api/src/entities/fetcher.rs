//! Parametrized reads for every entity kind: single lookup or filtered,
//! sorted, paginated lists. Rows always leave through a transformer.

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::entities::filters::{push_predicates, ListOptions};
use crate::entities::transform::{
    transform_bill, transform_party, transform_politician, transform_promise,
};
use crate::entities::views::EntityView;
use crate::entities::EntityKind;
use crate::errors::AppError;
use crate::models::bill::BillRow;
use crate::models::party::PartyRow;
use crate::models::politician::PoliticianRow;
use crate::models::promise::PromiseRow;

#[derive(Debug, Clone)]
pub enum FetchOptions {
    ById { id: i64, include_relations: bool },
    List(ListOptions),
}

/// `count` is the number of rows matching the filters before pagination.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub data: Vec<EntityView>,
    pub count: i64,
}

/// List response body of `GET /api/{kind}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage {
    pub items: Vec<EntityView>,
    pub total_count: i64,
}

impl From<FetchResult> for EntityPage {
    fn from(result: FetchResult) -> Self {
        EntityPage {
            items: result.data,
            total_count: result.count,
        }
    }
}

pub async fn fetch_entity_data(
    pool: &PgPool,
    kind: EntityKind,
    options: &FetchOptions,
) -> Result<FetchResult, AppError> {
    match kind {
        EntityKind::Politician => {
            run::<PoliticianRow>(pool, kind, options, |r| {
                EntityView::Politician(transform_politician(r))
            })
            .await
        }
        EntityKind::Party => {
            run::<PartyRow>(pool, kind, options, |r| EntityView::Party(transform_party(r))).await
        }
        EntityKind::Promise => {
            run::<PromiseRow>(pool, kind, options, |r| {
                EntityView::Promise(transform_promise(r))
            })
            .await
        }
        EntityKind::Bill => {
            run::<BillRow>(pool, kind, options, |r| EntityView::Bill(transform_bill(r))).await
        }
    }
}

/// Single entity with all relations, `NotFound` when absent.
pub async fn fetch_entity(pool: &PgPool, kind: EntityKind, id: i64) -> Result<EntityView, AppError> {
    let options = FetchOptions::ById {
        id,
        include_relations: true,
    };
    fetch_entity_data(pool, kind, &options)
        .await?
        .data
        .into_iter()
        .next()
        .ok_or_else(|| kind.not_found(id))
}

async fn run<R>(
    pool: &PgPool,
    kind: EntityKind,
    options: &FetchOptions,
    transform: fn(R) -> EntityView,
) -> Result<FetchResult, AppError>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    match options {
        FetchOptions::ById {
            id,
            include_relations,
        } => {
            let mut qb = select_query(kind, *include_relations);
            qb.push(" WHERE e.id = ");
            qb.push_bind(*id);

            let row = qb
                .build_query_as::<R>()
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| kind.not_found(id))?;

            Ok(FetchResult {
                data: vec![transform(row)],
                count: 1,
            })
        }
        FetchOptions::List(list) => {
            let mut count_qb = count_query(kind, list);
            let count: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

            let mut page_qb = list_query(kind, list);
            let rows = page_qb.build_query_as::<R>().fetch_all(pool).await?;
            debug!(
                kind = kind.as_str(),
                page = list.page,
                returned = rows.len(),
                total = count,
                "Fetched entity page"
            );

            Ok(FetchResult {
                data: rows.into_iter().map(transform).collect(),
                count,
            })
        }
    }
}

/// Total matching rows; never paginated.
pub fn count_query(kind: EntityKind, list: &ListOptions) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} e", kind.table()));
    push_predicates(&mut qb, kind, &list.filters);
    qb
}

pub fn list_query(kind: EntityKind, list: &ListOptions) -> QueryBuilder<'static, Postgres> {
    let mut qb = select_query(kind, list.include_relations);
    push_predicates(&mut qb, kind, &list.filters);
    qb.push(list.sort.order_by_sql());
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(list.limit));
    qb.push(" OFFSET ");
    qb.push_bind(list.offset());
    qb
}

fn select_query(kind: EntityKind, include_relations: bool) -> QueryBuilder<'static, Postgres> {
    let columns = match kind {
        EntityKind::Politician => politician_columns(include_relations),
        EntityKind::Party => party_columns(include_relations),
        EntityKind::Promise | EntityKind::Bill => sponsored_columns(kind, include_relations),
    };
    QueryBuilder::new(format!("SELECT {columns} FROM {} e", kind.table()))
}

// ── Column sets ─────────────────────────────────────────────────────────────
// Nested relations are aggregated as JSON so one row carries the whole shape.

const EMPTY: &str = "'[]'::json";

fn tags_column(kind: EntityKind) -> String {
    format!(
        "COALESCE((SELECT json_agg(json_build_object('id', t.id, 'name', t.name) ORDER BY t.name) \
         FROM entity_tags et JOIN tags t ON t.id = et.tag_id \
         WHERE et.entity_type = '{}' AND et.entity_id = e.id), {EMPTY}) AS tags",
        kind.as_str()
    )
}

/// Memberships of the politician whose id is `politician_expr`, active first.
fn memberships_subquery(politician_expr: &str) -> String {
    format!(
        "COALESCE((SELECT json_agg(json_build_object(\
         'role', m.role, 'is_active', m.is_active, 'start_date', m.start_date, \
         'party', json_build_object('id', p.id, 'name', p.name, \
         'abbreviation', p.abbreviation, 'logo_url', p.logo_url)) \
         ORDER BY m.is_active DESC, m.start_date DESC NULLS LAST, m.id) \
         FROM party_memberships m JOIN parties p ON p.id = m.party_id \
         WHERE m.politician_id = {politician_expr}), {EMPTY})"
    )
}

fn politician_columns(include_relations: bool) -> String {
    let base = "e.id, e.name, e.image_url, e.bio, e.date_of_birth, \
                date_part('year', age(e.date_of_birth))::int AS age, \
                e.province, e.position, e.education, e.contact_email, \
                e.upvotes, e.downvotes, e.is_featured, e.created_at, e.updated_at";
    if !include_relations {
        return format!(
            "{base}, {EMPTY} AS memberships, {EMPTY} AS tags, {EMPTY} AS career, \
             {EMPTY} AS assets, {EMPTY} AS criminal_records, {EMPTY} AS social_links"
        );
    }
    format!(
        "{base}, {memberships} AS memberships, {tags}, \
         COALESCE((SELECT json_agg(json_build_object('id', c.id, 'title', c.title, \
           'organization', c.organization, 'start_date', c.start_date, 'end_date', c.end_date, \
           'description', c.description) ORDER BY c.start_date DESC NULLS LAST, c.id) \
           FROM politician_career c WHERE c.politician_id = e.id), {EMPTY}) AS career, \
         COALESCE((SELECT json_agg(json_build_object('id', a.id, 'declaration_year', a.declaration_year, \
           'description', a.description, 'estimated_value', a.estimated_value, \
           'source_url', a.source_url) ORDER BY a.declaration_year DESC NULLS LAST, a.id) \
           FROM politician_assets a WHERE a.politician_id = e.id), {EMPTY}) AS assets, \
         COALESCE((SELECT json_agg(json_build_object('id', r.id, 'case_title', r.case_title, \
           'description', r.description, 'severity', r.severity, 'status', r.status, \
           'filed_on', r.filed_on, 'source_url', r.source_url) ORDER BY r.filed_on DESC NULLS LAST, r.id) \
           FROM politician_criminal_records r WHERE r.politician_id = e.id), {EMPTY}) AS criminal_records, \
         COALESCE((SELECT json_agg(json_build_object('id', s.id, 'platform', s.platform, 'url', s.url) \
           ORDER BY s.id) FROM politician_social_links s WHERE s.politician_id = e.id), {EMPTY}) AS social_links",
        memberships = memberships_subquery("e.id"),
        tags = tags_column(EntityKind::Politician),
    )
}

fn party_columns(include_relations: bool) -> String {
    let base = "e.id, e.name, e.abbreviation, e.logo_url, e.description, e.founded_date, \
                e.ideology, e.headquarters, e.website, \
                e.upvotes, e.downvotes, e.is_featured, e.created_at, e.updated_at";
    if !include_relations {
        return format!("{base}, {EMPTY} AS tags, {EMPTY} AS election_history, {EMPTY} AS controversies");
    }
    format!(
        "{base}, {tags}, \
         COALESCE((SELECT json_agg(json_build_object('id', h.id, 'election_year', h.election_year, \
           'election_type', h.election_type, 'seats_won', h.seats_won, 'total_seats', h.total_seats, \
           'vote_percentage', h.vote_percentage) ORDER BY h.election_year DESC, h.id) \
           FROM party_election_history h WHERE h.party_id = e.id), {EMPTY}) AS election_history, \
         COALESCE((SELECT json_agg(json_build_object('id', c.id, 'title', c.title, \
           'description', c.description, 'occurred_on', c.occurred_on, \
           'sources', COALESCE((SELECT json_agg(json_build_object('id', src.id, 'url', src.url) ORDER BY src.id) \
             FROM party_controversy_sources src WHERE src.controversy_id = c.id), {EMPTY})) \
           ORDER BY c.occurred_on DESC NULLS LAST, c.id) \
           FROM party_controversies c WHERE c.party_id = e.id), {EMPTY}) AS controversies",
        tags = tags_column(EntityKind::Party),
    )
}

fn sponsored_columns(kind: EntityKind, include_relations: bool) -> String {
    let base = match kind {
        EntityKind::Promise => {
            "e.id, e.title, e.description, e.status, e.due_date, \
             e.updates, e.evidence_url, \
             e.upvotes, e.downvotes, e.is_featured, e.created_at, e.updated_at"
        }
        _ => {
            "e.id, e.title, e.description, e.bill_number, e.status, e.ministry, e.category, \
             e.registration_date, e.proposed_date, \
             e.upvotes, e.downvotes, e.is_featured, e.created_at, e.updated_at"
        }
    };
    if !include_relations {
        return format!(
            "{base}, {EMPTY} AS tags, NULL::json AS sponsor_politician, NULL::json AS sponsor_party"
        );
    }
    format!(
        "{base}, {tags}, \
         (SELECT json_build_object('id', sp.id, 'name', sp.name, 'image_url', sp.image_url, \
           'memberships', {memberships}) \
           FROM politicians sp WHERE sp.id = e.politician_id) AS sponsor_politician, \
         (SELECT json_build_object('id', pp.id, 'name', pp.name, 'abbreviation', pp.abbreviation, \
           'logo_url', pp.logo_url) \
           FROM parties pp WHERE pp.id = e.party_id) AS sponsor_party",
        tags = tags_column(kind),
        memberships = memberships_subquery("sp.id"),
    )
}
