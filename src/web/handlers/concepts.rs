// GET /api/concepts — the knowledge base, optionally one theory's concepts.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::knowledge::theory::Theory;
use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct ConceptsQuery {
    /// Theory code, e.g. TCE or PlatformStrategy
    pub theory: Option<String>,
}

pub async fn list_concepts(
    State(state): State<AppState>,
    Query(params): Query<ConceptsQuery>,
) -> Response {
    let kb = state.pipeline.knowledge_base();

    let concepts: Vec<_> = match params.theory.as_deref() {
        Some(code) => match code.parse::<Theory>() {
            Ok(theory) => kb.by_theory(theory),
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.to_string()),
        },
        None => kb.concepts().iter().collect(),
    };

    Json(serde_json::json!({
        "total": concepts.len(),
        "concepts": concepts,
    }))
    .into_response()
}
