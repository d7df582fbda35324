//! List parameters: opt-in filters, whitelisted sorting and 1-indexed pagination.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::entities::rating::RATING_SQL;
use crate::entities::views::status_label;
use crate::entities::EntityKind;
use crate::errors::AppError;

/// Raw query string of `GET /api/{kind}`. Every field is optional; empty
/// strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub party: Option<String>,
    pub politician: Option<String>,
    pub tag: Option<String>,
    pub province: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub ministry: Option<String>,
    pub category: Option<String>,
    pub ideology: Option<String>,
    pub featured: Option<String>,
    pub include_relations: Option<String>,
    pub sort_by: Option<String>,
}

/// Filters that apply to the requested kind. `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFilters {
    pub search: Option<String>,
    pub status: Option<&'static str>,
    pub party_id: Option<i64>,
    pub politician_id: Option<i64>,
    pub tag: Option<String>,
    pub province: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub ministry: Option<String>,
    pub category: Option<String>,
    pub ideology: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A resolved sort: a whitelisted SQL expression over alias `e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub expr: &'static str,
    pub order: SortOrder,
}

impl SortSpec {
    pub const DEFAULT: SortSpec = SortSpec {
        expr: "e.created_at",
        order: SortOrder::Desc,
    };

    /// Parses `<field>_<asc|desc>`. Unknown fields fall back to the default.
    pub fn parse(kind: EntityKind, raw: Option<&str>) -> SortSpec {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::DEFAULT;
        };
        let (field, order) = match raw.rsplit_once('_') {
            Some((field, suffix)) => match SortOrder::parse(suffix) {
                Some(order) => (field, order),
                None => (raw, SortOrder::Asc),
            },
            None => (raw, SortOrder::Asc),
        };
        match sort_expr(kind, field) {
            Some(expr) => SortSpec { expr, order },
            None => Self::DEFAULT,
        }
    }

    pub fn order_by_sql(&self) -> String {
        let order = self.order.sql();
        format!(" ORDER BY {} {order} NULLS LAST, e.id {order}", self.expr)
    }
}

fn sort_expr(kind: EntityKind, field: &str) -> Option<&'static str> {
    let common = match field {
        "created_at" | "createdAt" => Some("e.created_at"),
        "updated_at" | "updatedAt" => Some("e.updated_at"),
        "upvotes" => Some("e.upvotes"),
        "downvotes" => Some("e.downvotes"),
        "votes" => Some("(e.upvotes + e.downvotes)"),
        "rating" => Some(RATING_SQL),
        _ => None,
    };
    if common.is_some() {
        return common;
    }
    match (kind, field) {
        (EntityKind::Politician | EntityKind::Party, "name") => Some("e.name"),
        (EntityKind::Politician, "date_of_birth" | "dateOfBirth") => Some("e.date_of_birth"),
        (EntityKind::Politician, "age") => Some("age(e.date_of_birth)"),
        (EntityKind::Politician, "province") => Some("e.province"),
        (EntityKind::Party, "founded_date" | "foundedDate") => Some("e.founded_date"),
        (EntityKind::Promise | EntityKind::Bill, "title") => Some("e.title"),
        (EntityKind::Promise | EntityKind::Bill, "status") => Some("e.status"),
        (EntityKind::Promise, "due_date" | "dueDate") => Some("e.due_date"),
        (EntityKind::Bill, "registration_date" | "registrationDate") => {
            Some("e.registration_date")
        }
        (EntityKind::Bill, "proposed_date" | "proposedDate") => Some("e.proposed_date"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub filters: EntityFilters,
    /// 1-indexed.
    pub page: u32,
    pub limit: u32,
    pub sort: SortSpec,
    pub include_relations: bool,
}

impl ListOptions {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Builds options from the raw query, keeping only the filters the kind supports.
    pub fn from_query(
        kind: EntityKind,
        query: &ListQuery,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, AppError> {
        let page = parse_opt::<u32>("page", &query.page)?.unwrap_or(1).max(1);
        let limit = parse_opt::<u32>("limit", &query.limit)?
            .unwrap_or(default_limit)
            .clamp(1, max_limit.max(1));

        let mut filters = EntityFilters {
            search: present(&query.search),
            tag: present(&query.tag),
            featured: parse_opt::<bool>("featured", &query.featured)?,
            ..EntityFilters::default()
        };

        match kind {
            EntityKind::Politician => {
                filters.party_id = parse_opt("party", &query.party)?;
                filters.province = present(&query.province);
                filters.min_age = parse_opt("minAge", &query.min_age)?;
                filters.max_age = parse_opt("maxAge", &query.max_age)?;
                if let (Some(min), Some(max)) = (filters.min_age, filters.max_age) {
                    if min > max {
                        return Err(AppError::invalid("minAge", "minAge cannot exceed maxAge"));
                    }
                }
            }
            EntityKind::Party => {
                filters.ideology = present(&query.ideology);
            }
            EntityKind::Promise | EntityKind::Bill => {
                filters.status = present(&query.status)
                    .map(|s| status_label(kind, &s))
                    .transpose()?;
                filters.party_id = parse_opt("party", &query.party)?;
                filters.politician_id = parse_opt("politician", &query.politician)?;
                if kind == EntityKind::Bill {
                    filters.ministry = present(&query.ministry);
                    filters.category = present(&query.category);
                }
            }
        }

        Ok(ListOptions {
            filters,
            page,
            limit,
            sort: SortSpec::parse(kind, query.sort_by.as_deref()),
            include_relations: parse_opt::<bool>("includeRelations", &query.include_relations)?
                .unwrap_or(true),
        })
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_opt<T: std::str::FromStr>(field: &str, value: &Option<String>) -> Result<Option<T>, AppError> {
    present(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| AppError::invalid(field, format!("Invalid value '{v}' for {field}")))
        })
        .transpose()
}

/// Escapes LIKE metacharacters so a search term matches literally.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Appends the conjunction of the present filters. Absent filters add nothing.
pub fn push_predicates(qb: &mut QueryBuilder<'_, Postgres>, kind: EntityKind, filters: &EntityFilters) {
    qb.push(" WHERE TRUE");

    if let Some(search) = &filters.search {
        let column = match kind {
            EntityKind::Politician | EntityKind::Party => "e.name",
            EntityKind::Promise | EntityKind::Bill => "e.title",
        };
        qb.push(format!(" AND ({column} ILIKE "));
        qb.push_bind(like_pattern(search));
        if kind == EntityKind::Party {
            qb.push(" OR e.abbreviation ILIKE ");
            qb.push_bind(like_pattern(search));
        }
        qb.push(")");
    }

    if let Some(tag) = &filters.tag {
        qb.push(
            " AND EXISTS (SELECT 1 FROM entity_tags et JOIN tags t ON t.id = et.tag_id \
             WHERE et.entity_type = ",
        );
        qb.push_bind(kind.as_str());
        qb.push(" AND et.entity_id = e.id AND lower(t.name) = lower(");
        qb.push_bind(tag.clone());
        qb.push("))");
    }

    if let Some(featured) = filters.featured {
        qb.push(" AND e.is_featured = ");
        qb.push_bind(featured);
    }

    if let Some(status) = filters.status {
        qb.push(" AND e.status = ");
        qb.push_bind(status);
    }

    if let Some(party_id) = filters.party_id {
        match kind {
            EntityKind::Politician => {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM party_memberships m \
                     WHERE m.politician_id = e.id AND m.is_active AND m.party_id = ",
                );
                qb.push_bind(party_id);
                qb.push(")");
            }
            _ => {
                // Direct party sponsor, or a politician sponsor whose active party matches.
                qb.push(" AND (e.party_id = ");
                qb.push_bind(party_id);
                qb.push(
                    " OR EXISTS (SELECT 1 FROM party_memberships m \
                     WHERE m.politician_id = e.politician_id AND m.is_active AND m.party_id = ",
                );
                qb.push_bind(party_id);
                qb.push("))");
            }
        }
    }

    if let Some(politician_id) = filters.politician_id {
        qb.push(" AND e.politician_id = ");
        qb.push_bind(politician_id);
    }

    if let Some(province) = &filters.province {
        qb.push(" AND lower(e.province) = lower(");
        qb.push_bind(province.clone());
        qb.push(")");
    }

    if let Some(min_age) = filters.min_age {
        qb.push(" AND e.date_of_birth <= (CURRENT_DATE - make_interval(years => ");
        qb.push_bind(min_age);
        qb.push("))");
    }

    if let Some(max_age) = filters.max_age {
        qb.push(" AND e.date_of_birth > (CURRENT_DATE - make_interval(years => ");
        qb.push_bind(max_age.saturating_add(1));
        qb.push("))");
    }

    if let Some(ministry) = &filters.ministry {
        qb.push(" AND lower(e.ministry) = lower(");
        qb.push_bind(ministry.clone());
        qb.push(")");
    }

    if let Some(category) = &filters.category {
        qb.push(" AND lower(e.category) = lower(");
        qb.push_bind(category.clone());
        qb.push(")");
    }

    if let Some(ideology) = &filters.ideology {
        qb.push(" AND e.ideology ILIKE ");
        qb.push_bind(like_pattern(ideology));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    fn sql_for(kind: EntityKind, filters: &EntityFilters) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM t e");
        push_predicates(&mut qb, kind, filters);
        qb.sql().to_string()
    }

    #[test]
    fn test_no_filters_adds_no_predicates() {
        for kind in EntityKind::ALL {
            let sql = sql_for(kind, &EntityFilters::default());
            assert!(sql.ends_with(" WHERE TRUE"), "{sql}");
            assert!(!sql.contains(" AND "));
        }
    }

    #[test]
    fn test_single_filter_narrows_alone() {
        let filters = EntityFilters {
            province: Some("Bagmati".into()),
            ..Default::default()
        };
        let sql = sql_for(EntityKind::Politician, &filters);
        assert_eq!(sql.matches(" AND ").count(), 1);
        assert!(sql.contains("lower(e.province) = lower($1)"));
    }

    #[test]
    fn test_tag_filter_uses_shared_join_relation() {
        let filters = EntityFilters {
            tag: Some("Economy".into()),
            ..Default::default()
        };
        for kind in EntityKind::ALL {
            let sql = sql_for(kind, &filters);
            assert!(sql.contains("FROM entity_tags et"), "{sql}");
            assert!(sql.contains("et.entity_type = $1"));
        }
    }

    #[test]
    fn test_empty_query_values_are_absent() {
        let q = query(&[("status", ""), ("province", "  "), ("tag", "")]);
        let opts = ListOptions::from_query(EntityKind::Bill, &q, 12, 100).unwrap();
        assert_eq!(opts.filters, EntityFilters::default());
        assert_eq!(opts.page, 1);
        assert_eq!(opts.limit, 12);
        assert!(opts.include_relations);
    }

    #[test]
    fn test_filters_outside_kind_are_ignored() {
        let q = query(&[("province", "Koshi"), ("minAge", "30"), ("status", "Enacted")]);
        let opts = ListOptions::from_query(EntityKind::Party, &q, 12, 100).unwrap();
        assert_eq!(opts.filters, EntityFilters::default());

        let opts = ListOptions::from_query(EntityKind::Politician, &q, 12, 100).unwrap();
        assert_eq!(opts.filters.province.as_deref(), Some("Koshi"));
        assert_eq!(opts.filters.min_age, Some(30));
        assert_eq!(opts.filters.status, None);
    }

    #[test]
    fn test_status_filter_normalized_to_label() {
        let q = query(&[("status", "in_committee")]);
        let opts = ListOptions::from_query(EntityKind::Bill, &q, 12, 100).unwrap();
        assert_eq!(opts.filters.status, Some("In Committee"));

        let q = query(&[("status", "nonsense")]);
        assert!(ListOptions::from_query(EntityKind::Bill, &q, 12, 100).is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let q = query(&[("party", "abc")]);
        assert!(ListOptions::from_query(EntityKind::Promise, &q, 12, 100).is_err());
        let q = query(&[("minAge", "60"), ("maxAge", "30")]);
        assert!(ListOptions::from_query(EntityKind::Politician, &q, 12, 100).is_err());
    }

    #[test]
    fn test_pagination_bounds() {
        let q = query(&[("page", "0"), ("limit", "1000")]);
        let opts = ListOptions::from_query(EntityKind::Bill, &q, 12, 100).unwrap();
        assert_eq!(opts.page, 1);
        assert_eq!(opts.limit, 100);
        assert_eq!(opts.offset(), 0);

        let q = query(&[("page", "3"), ("limit", "20")]);
        let opts = ListOptions::from_query(EntityKind::Bill, &q, 12, 100).unwrap();
        assert_eq!(opts.offset(), 40);
    }

    #[test]
    fn test_sort_parsing() {
        let spec = SortSpec::parse(EntityKind::Politician, Some("name_asc"));
        assert_eq!(spec.expr, "e.name");
        assert_eq!(spec.order, SortOrder::Asc);

        let spec = SortSpec::parse(EntityKind::Bill, Some("registration_date_desc"));
        assert_eq!(spec.expr, "e.registration_date");
        assert_eq!(spec.order, SortOrder::Desc);

        let spec = SortSpec::parse(EntityKind::Promise, Some("dueDate_asc"));
        assert_eq!(spec.expr, "e.due_date");
    }

    #[test]
    fn test_unknown_sort_falls_back_to_default() {
        assert_eq!(SortSpec::parse(EntityKind::Party, Some("title_asc")), SortSpec::DEFAULT);
        assert_eq!(SortSpec::parse(EntityKind::Bill, Some("drop table_desc")), SortSpec::DEFAULT);
        assert_eq!(SortSpec::parse(EntityKind::Bill, None), SortSpec::DEFAULT);
    }

    #[test]
    fn test_order_by_has_stable_tiebreak() {
        let sql = SortSpec::DEFAULT.order_by_sql();
        assert_eq!(sql, " ORDER BY e.created_at DESC NULLS LAST, e.id DESC");
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
