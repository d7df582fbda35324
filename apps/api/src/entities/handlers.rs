use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::RequestContext;
use crate::entities::fetcher::{fetch_entity, fetch_entity_data, EntityPage, FetchOptions};
use crate::entities::filters::{ListOptions, ListQuery};
use crate::entities::options::{
    list_categories, list_ministries, list_tags, party_options, politician_options, OptionItem,
};
use crate::entities::views::EntityView;
use crate::entities::writes::delete_entity;
use crate::entities::{parse_entity_id, EntityKind};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;
use crate::suggestions::workflow::{create_or_suggest, WriteOutcome};
use crate::votes::featured::{set_featured, FeatureOutcome};
use crate::votes::ledger::{cast_vote, VoteOutcome, VoteType};

/// Body of `PATCH /api/{kind}/{id}`, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum EntityPatch {
    Vote { vote_type: VoteType },
    Feature { is_featured: bool },
}

impl EntityPatch {
    pub fn parse(body: Value) -> Result<Self, AppError> {
        serde_json::from_value(body).map_err(|e| {
            AppError::BadRequest(format!(
                "Expected {{\"action\":\"vote\",\"vote_type\":\"up\"|\"down\"}} or \
                 {{\"action\":\"feature\",\"is_featured\":bool}}: {e}"
            ))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PatchOutcome {
    Vote(VoteOutcome),
    Feature(FeatureOutcome),
}

#[derive(Deserialize)]
pub struct TagQuery {
    pub kind: Option<String>,
}

fn write_response(outcome: WriteOutcome, created: bool) -> Response {
    let status = match (outcome.entity(), created) {
        (None, _) => StatusCode::ACCEPTED,
        (Some(_), true) => StatusCode::CREATED,
        (Some(_), false) => StatusCode::OK,
    };
    match outcome {
        WriteOutcome::Applied(view) => (status, Json(view)).into_response(),
        WriteOutcome::Queued(suggestion) => (
            status,
            Json(json!({ "queued": true, "suggestion": suggestion })),
        )
            .into_response(),
    }
}

/// GET /api/:kind
pub async fn handle_list_entities(
    State(state): State<AppState>,
    AppPath(kind): AppPath<String>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<EntityPage>, AppError> {
    let kind: EntityKind = kind.parse()?;
    let options = ListOptions::from_query(
        kind,
        &query,
        state.config.default_page_size,
        state.config.max_page_size,
    )?;
    let result = fetch_entity_data(&state.db, kind, &FetchOptions::List(options)).await?;
    Ok(Json(result.into()))
}

/// GET /api/:kind/:id
pub async fn handle_get_entity(
    State(state): State<AppState>,
    AppPath((kind, raw_id)): AppPath<(String, String)>,
) -> Result<Json<EntityView>, AppError> {
    let kind: EntityKind = kind.parse()?;
    let id = parse_entity_id(kind, &raw_id)?;
    Ok(Json(fetch_entity(&state.db, kind, id).await?))
}

/// POST /api/:kind
/// 201 with the entity for admins, 202 with the queued suggestion otherwise.
pub async fn handle_create_entity(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath(kind): AppPath<String>,
    AppJson(payload): AppJson<Value>,
) -> Result<Response, AppError> {
    let kind: EntityKind = kind.parse()?;
    let caller = if kind.admin_only_writes() {
        ctx.require_admin()?
    } else {
        ctx.require_user()?
    };
    let outcome = create_or_suggest(&state.db, kind, &payload, None, caller).await?;
    Ok(write_response(outcome, true))
}

/// PUT /api/:kind/:id
pub async fn handle_update_entity(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath((kind, raw_id)): AppPath<(String, String)>,
    AppJson(payload): AppJson<Value>,
) -> Result<Response, AppError> {
    let kind: EntityKind = kind.parse()?;
    let id = parse_entity_id(kind, &raw_id)?;
    let caller = if kind.admin_only_writes() {
        ctx.require_admin()?
    } else {
        ctx.require_user()?
    };
    let outcome = create_or_suggest(&state.db, kind, &payload, Some(id), caller).await?;
    Ok(write_response(outcome, false))
}

/// DELETE /api/:kind/:id
pub async fn handle_delete_entity(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath((kind, raw_id)): AppPath<(String, String)>,
) -> Result<StatusCode, AppError> {
    let kind: EntityKind = kind.parse()?;
    let id = parse_entity_id(kind, &raw_id)?;
    ctx.require_admin()?;
    delete_entity(&state.db, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/:kind/:id
pub async fn handle_patch_entity(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath((kind, raw_id)): AppPath<(String, String)>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<PatchOutcome>, AppError> {
    let kind: EntityKind = kind.parse()?;
    let id = parse_entity_id(kind, &raw_id)?;

    match EntityPatch::parse(body)? {
        EntityPatch::Vote { vote_type } => {
            let caller = ctx.require_user()?;
            let outcome = cast_vote(&state.db, caller.user_id, kind, id, vote_type).await?;
            Ok(Json(PatchOutcome::Vote(outcome)))
        }
        EntityPatch::Feature { is_featured } => {
            ctx.require_admin()?;
            let outcome =
                set_featured(&state.db, kind, id, is_featured, state.config.featured_cap).await?;
            Ok(Json(PatchOutcome::Feature(outcome)))
        }
    }
}

/// GET /api/tags
pub async fn handle_list_tags(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TagQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let kind = params
        .kind
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::parse::<EntityKind>)
        .transpose()?;
    Ok(Json(list_tags(&state.db, kind).await?))
}

/// GET /api/options/ministries
pub async fn handle_ministry_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(list_ministries(&state.db).await?))
}

/// GET /api/options/categories
pub async fn handle_category_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(list_categories(&state.db).await?))
}

/// GET /api/options/parties
pub async fn handle_party_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<OptionItem>>, AppError> {
    Ok(Json(party_options(&state.db).await?))
}

/// GET /api/options/politicians
pub async fn handle_politician_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<OptionItem>>, AppError> {
    Ok(Json(politician_options(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::entities::views::PartyView;
    use crate::models::suggestion::SuggestionRow;

    fn party_view() -> EntityView {
        let now = Utc::now();
        EntityView::Party(PartyView {
            id: "4".to_string(),
            name: "Civic Union".to_string(),
            abbreviation: Some("CU".to_string()),
            logo_url: None,
            description: None,
            founded_date: None,
            ideology: vec!["Centrism".to_string()],
            headquarters: None,
            website: None,
            tags: Vec::new(),
            election_history: Vec::new(),
            controversies: Vec::new(),
            upvotes: 0,
            downvotes: 0,
            rating: 2.5,
            is_featured: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn pending_suggestion() -> SuggestionRow {
        let now = Utc::now();
        SuggestionRow {
            id: 11,
            entity_type: "party".to_string(),
            entity_id: None,
            suggested_data: json!({ "name": "Civic Union" }),
            is_new_item_suggestion: true,
            submitter_id: Uuid::new_v4(),
            status: "pending".to_string(),
            reviewer_id: None,
            review_note: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_queued_write_has_no_entity_and_answers_202() {
        let outcome = WriteOutcome::Queued(pending_suggestion());
        assert!(outcome.entity().is_none());

        for created in [true, false] {
            let (status, body) =
                response_json(write_response(outcome.clone(), created)).await;
            assert_eq!(status, StatusCode::ACCEPTED);
            assert_eq!(body["queued"], true);
            assert_eq!(body["suggestion"]["status"], "pending");
            assert_eq!(body["suggestion"]["is_new_item_suggestion"], true);
            assert_eq!(body["suggestion"]["suggested_data"]["name"], "Civic Union");
        }
    }

    #[tokio::test]
    async fn test_applied_write_returns_entity() {
        let outcome = WriteOutcome::Applied(party_view());
        assert_eq!(outcome.entity().map(EntityView::id), Some("4"));

        let (status, body) = response_json(write_response(outcome.clone(), true)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "4");
        assert!(body.get("queued").is_none());

        let (status, body) = response_json(write_response(outcome, false)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Civic Union");
    }

    #[test]
    fn test_patch_vote_body() {
        let patch = EntityPatch::parse(json!({ "action": "vote", "vote_type": "down" })).unwrap();
        assert_eq!(patch, EntityPatch::Vote { vote_type: VoteType::Down });
    }

    #[test]
    fn test_patch_feature_body() {
        let patch = EntityPatch::parse(json!({ "action": "feature", "is_featured": true })).unwrap();
        assert_eq!(patch, EntityPatch::Feature { is_featured: true });
    }

    #[test]
    fn test_patch_rejects_untagged_and_mixed_bodies() {
        // Shape-sniffed bodies without a discriminant are not accepted.
        assert!(EntityPatch::parse(json!({ "vote_type": "up" })).is_err());
        assert!(EntityPatch::parse(json!({})).is_err());
        assert!(EntityPatch::parse(json!({
            "action": "vote",
            "vote_type": "up",
            "is_featured": true
        }))
        .is_err());
        assert!(EntityPatch::parse(json!({ "action": "vote", "vote_type": "sideways" })).is_err());
        assert!(EntityPatch::parse(json!({ "action": "delete" })).is_err());
    }
}
