// POST /api/analyze — run the pipeline on the submitted texts.
//
// The body is an AnswerRequest; missing fields default to empty. Extraction
// and mapping are CPU-bound, so the pipeline runs on the blocking pool.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::assemble::answer::AnswerRequest;
use crate::web::{api_error, AppState};

pub const MISSING_INPUT: &str = "Please provide both case text and question(s)";

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Response {
    if request.case_text.trim().is_empty() || request.question_text.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, MISSING_INPUT);
    }

    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.analyze(&request)).await;

    match result {
        Ok(Ok(analysis)) => {
            let answer = analysis.answer;
            Json(serde_json::json!({
                "answer": answer.text,
                "theories": answer.theories,
                "matches": answer.matches,
                "word_count": answer.word_count,
                "truncated": answer.truncated,
                "key_terms": analysis.key_terms,
            }))
            .into_response()
        }
        Ok(Err(e)) => {
            error!(error = %e, "Analysis failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("Analysis failed: {e}"))
        }
        Err(e) => {
            error!(error = %e, "Analysis task panicked");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed")
        }
    }
}
