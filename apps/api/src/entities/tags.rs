//! Tags shared by every entity kind through the polymorphic `entity_tags`
//! relation keyed by `(entity_type, entity_id, tag_id)`.

use std::collections::HashSet;

use serde::Deserialize;
use sqlx::PgConnection;

use crate::entities::views::TagView;
use crate::entities::EntityKind;
use crate::models::joins::TagJoin;

/// Tag names as submitted by a form: either an array or one comma-delimited string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawTags")]
pub struct TagList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Delimited(String),
    Names(Vec<String>),
}

impl From<RawTags> for TagList {
    fn from(raw: RawTags) -> Self {
        match raw {
            RawTags::Delimited(s) => TagList(normalize_tag_names(s.split(','))),
            RawTags::Names(names) => TagList(normalize_tag_names(names)),
        }
    }
}

/// Trims names, drops empties and removes case-insensitive duplicates.
/// The first spelling of a name wins.
pub fn normalize_tag_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter_map(|name| {
            let trimmed = name.as_ref().trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Flattens joined tag rows into view tags, dropping repeated names.
pub fn dedupe_tag_joins(joins: &[TagJoin]) -> Vec<TagView> {
    let mut seen = HashSet::new();
    joins
        .iter()
        .filter(|t| !t.name.trim().is_empty() && seen.insert(t.name.trim().to_lowercase()))
        .map(|t| TagView {
            id: t.id.to_string(),
            name: t.name.trim().to_string(),
        })
        .collect()
}

/// Replaces the tag links of one entity. Missing tags are created.
pub async fn sync_tags(
    conn: &mut PgConnection,
    kind: EntityKind,
    entity_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    clear_tags(conn, kind, entity_id).await?;

    let names = normalize_tag_names(names);
    if names.is_empty() {
        return Ok(());
    }
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();

    sqlx::query("INSERT INTO tags (name) SELECT UNNEST($1::text[]) ON CONFLICT ((lower(name))) DO NOTHING")
        .bind(&names)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO entity_tags (entity_type, entity_id, tag_id)
        SELECT $1, $2, t.id FROM tags t WHERE lower(t.name) = ANY($3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(kind.as_str())
    .bind(entity_id)
    .bind(&lowered)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn clear_tags(
    conn: &mut PgConnection,
    kind: EntityKind,
    entity_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM entity_tags WHERE entity_type = $1 AND entity_id = $2")
        .bind(kind.as_str())
        .bind(entity_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_duplicates_case_insensitively() {
        let names = normalize_tag_names(["Economy", " Reform ", "economy", "", "REFORM"]);
        assert_eq!(names, vec!["Economy".to_string(), "Reform".to_string()]);
    }

    #[test]
    fn test_tag_list_from_delimited_string() {
        let tags: TagList = serde_json::from_str("\"Economy, Reform,,economy\"").unwrap();
        assert_eq!(tags.0, ["Economy", "Reform"]);
    }

    #[test]
    fn test_tag_list_from_array() {
        let tags: TagList = serde_json::from_str(r#"["Health", "health", "Education"]"#).unwrap();
        assert_eq!(tags.0, ["Health", "Education"]);
    }

    #[test]
    fn test_dedupe_joins_keeps_one_per_name() {
        let joins = vec![
            TagJoin { id: 1, name: "Economy".into() },
            TagJoin { id: 2, name: "Reform".into() },
            TagJoin { id: 1, name: "Economy".into() },
        ];
        let tags = dedupe_tag_joins(&joins);
        let mut names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Economy", "Reform"]);
        assert_eq!(tags[0].id, "1");
    }
}
