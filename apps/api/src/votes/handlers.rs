use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use crate::auth::RequestContext;
use crate::entities::EntityKind;
use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::models::vote::VoteRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MyVotesQuery {
    pub item_type: Option<String>,
}

/// GET /api/votes/mine
/// The caller's ledger rows, used by clients to rebuild their vote cache.
pub async fn handle_my_votes(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppQuery(params): AppQuery<MyVotesQuery>,
) -> Result<Json<Vec<VoteRow>>, AppError> {
    let caller = ctx.require_user()?;
    let kind = params
        .item_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.parse::<EntityKind>())
        .transpose()?;

    let votes: Vec<VoteRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, item_id, item_type, vote_type, created_at, updated_at
        FROM votes
        WHERE user_id = $1 AND ($2::text IS NULL OR item_type = $2)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(caller.user_id)
    .bind(kind.map(|k| k.as_str()))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(votes))
}
