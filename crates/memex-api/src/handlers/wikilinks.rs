//! Wiki-link suggestion and resolution handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use memex_core::{TitleSuggestion, WikiLinkResolution};

use crate::error::ApiError;
use crate::owner::OwnerId;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SuggestQuery {
    pub q: String,
}

/// `GET /api/wikilinks/suggest?q=` — titles matching the fragment the
/// user has typed inside `[[...]]`. Callers debounce keystrokes
/// ([`memex_core::defaults::SUGGEST_DEBOUNCE_MS`]); the server answers
/// every request it actually receives.
pub async fn suggest(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<Vec<TitleSuggestion>>, ApiError> {
    let suggestions = state.wikilinks.suggest(owner_id, &query.q).await?;
    Ok(Json(suggestions))
}

#[derive(Deserialize)]
pub struct ResolveBody {
    pub title: String,
}

/// `POST /api/wikilinks/resolve` — navigate to the titled note,
/// creating it first when no exact match exists.
pub async fn resolve(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<ResolveBody>,
) -> Result<Json<WikiLinkResolution>, ApiError> {
    let resolution = state.wikilinks.resolve_or_create(owner_id, &body.title).await?;
    Ok(Json(resolution))
}
