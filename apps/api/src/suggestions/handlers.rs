use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::RequestContext;
use crate::entities::input::IdInput;
use crate::entities::{parse_entity_id, EntityKind};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::suggestion::SuggestionRow;
use crate::state::AppState;
use crate::suggestions::moderation::{approve_suggestion, reject_suggestion, ModerationOutcome};
use crate::suggestions::workflow::{
    ensure_visible, get_suggestion, list_suggestions, submit_suggestion, update_pending_suggestion,
};
use crate::suggestions::SuggestionStatus;

#[derive(Deserialize)]
pub struct SuggestionListQuery {
    pub status: Option<String>,
    pub entity_type: Option<String>,
}

#[derive(Deserialize)]
pub struct NewSuggestion {
    pub entity_type: String,
    pub entity_id: Option<IdInput>,
    pub suggested_data: Value,
}

#[derive(Deserialize)]
pub struct SuggestionEdit {
    pub suggested_data: Value,
}

#[derive(Deserialize, Default)]
pub struct ReviewRequest {
    pub note: Option<String>,
}

fn parse_suggestion_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::NotFound(format!("Suggestion {raw} not found")))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/suggestions
pub async fn handle_list_suggestions(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppQuery(params): AppQuery<SuggestionListQuery>,
) -> Result<Json<Vec<SuggestionRow>>, AppError> {
    let caller = ctx.require_user()?;
    let status = non_blank(&params.status).map(SuggestionStatus::parse).transpose()?;
    let kind = non_blank(&params.entity_type)
        .map(str::parse::<EntityKind>)
        .transpose()?;
    Ok(Json(list_suggestions(&state.db, caller, status, kind).await?))
}

/// POST /api/suggestions
pub async fn handle_submit_suggestion(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(req): AppJson<NewSuggestion>,
) -> Result<(StatusCode, Json<SuggestionRow>), AppError> {
    let caller = ctx.require_user()?;
    let kind: EntityKind = req
        .entity_type
        .parse()
        .map_err(|_| AppError::invalid("entity_type", format!("Unknown entity type '{}'", req.entity_type)))?;
    let target = match &req.entity_id {
        None => None,
        Some(IdInput::Number(n)) => Some(parse_entity_id(kind, &n.to_string())?),
        Some(IdInput::Text(s)) if s.trim().is_empty() => None,
        Some(IdInput::Text(s)) => Some(parse_entity_id(kind, s)?),
    };
    let row = submit_suggestion(&state.db, kind, &req.suggested_data, target, caller).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/suggestions/:id
pub async fn handle_get_suggestion(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath(raw_id): AppPath<String>,
) -> Result<Json<SuggestionRow>, AppError> {
    let caller = ctx.require_user()?;
    let id = parse_suggestion_id(&raw_id)?;
    let row = get_suggestion(&state.db, id).await?;
    ensure_visible(&row, caller)?;
    Ok(Json(row))
}

/// PUT /api/suggestions/:id
pub async fn handle_update_suggestion(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath(raw_id): AppPath<String>,
    AppJson(req): AppJson<SuggestionEdit>,
) -> Result<Json<SuggestionRow>, AppError> {
    let caller = ctx.require_user()?;
    let id = parse_suggestion_id(&raw_id)?;
    let row = update_pending_suggestion(&state.db, id, &req.suggested_data, caller).await?;
    Ok(Json(row))
}

/// POST /api/suggestions/:id/approve
pub async fn handle_approve_suggestion(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath(raw_id): AppPath<String>,
    body: Option<AppJson<ReviewRequest>>,
) -> Result<Json<ModerationOutcome>, AppError> {
    let reviewer = ctx.require_admin()?;
    let id = parse_suggestion_id(&raw_id)?;
    let review = body.map(|AppJson(r)| r).unwrap_or_default();
    let outcome = approve_suggestion(&state.db, id, reviewer, non_blank(&review.note)).await?;
    Ok(Json(outcome))
}

/// POST /api/suggestions/:id/reject
pub async fn handle_reject_suggestion(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppPath(raw_id): AppPath<String>,
    body: Option<AppJson<ReviewRequest>>,
) -> Result<Json<ModerationOutcome>, AppError> {
    let reviewer = ctx.require_admin()?;
    let id = parse_suggestion_id(&raw_id)?;
    let review = body.map(|AppJson(r)| r).unwrap_or_default();
    let outcome = reject_suggestion(&state.db, id, reviewer, non_blank(&review.note)).await?;
    Ok(Json(outcome))
}
