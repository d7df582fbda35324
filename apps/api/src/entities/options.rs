//! Read-only label lists that populate filter controls and forms.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::entities::EntityKind;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OptionItem {
    pub id: String,
    pub label: String,
    pub abbreviation: Option<String>,
}

/// Existing tag names, optionally restricted to tags attached to one kind.
pub async fn list_tags(pool: &PgPool, kind: Option<EntityKind>) -> Result<Vec<String>, sqlx::Error> {
    let names: Vec<String> = match kind {
        Some(kind) => {
            sqlx::query_scalar(
                r#"
                SELECT DISTINCT t.name FROM tags t
                JOIN entity_tags et ON et.tag_id = t.id
                WHERE et.entity_type = $1
                ORDER BY t.name
                "#,
            )
            .bind(kind.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT name FROM tags ORDER BY name")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(dedupe_labels(names))
}

pub async fn list_ministries(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let values: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT btrim(ministry) FROM bills WHERE ministry IS NOT NULL ORDER BY 1",
    )
    .fetch_all(pool)
    .await?;
    Ok(dedupe_labels(values))
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let values: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT btrim(category) FROM bills WHERE category IS NOT NULL ORDER BY 1",
    )
    .fetch_all(pool)
    .await?;
    Ok(dedupe_labels(values))
}

pub async fn party_options(pool: &PgPool) -> Result<Vec<OptionItem>, sqlx::Error> {
    sqlx::query_as::<_, OptionItem>(
        "SELECT id::text AS id, name AS label, abbreviation FROM parties ORDER BY name, id",
    )
    .fetch_all(pool)
    .await
}

pub async fn politician_options(pool: &PgPool) -> Result<Vec<OptionItem>, sqlx::Error> {
    sqlx::query_as::<_, OptionItem>(
        "SELECT id::text AS id, name AS label, NULL::text AS abbreviation FROM politicians ORDER BY name, id",
    )
    .fetch_all(pool)
    .await
}

/// Drops blanks and case-insensitive repeats, keeping the first spelling.
pub fn dedupe_labels(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_labels() {
        let labels = dedupe_labels(vec![
            "Finance".into(),
            " finance".into(),
            "".into(),
            "Health".into(),
        ]);
        assert_eq!(labels, vec!["Finance".to_string(), "Health".to_string()]);
    }
}
