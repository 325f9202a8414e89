// POST /api/export — the answer as a .docx attachment.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::export::docx_bytes;
use crate::web::{api_error, AppState};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Deserialize)]
pub struct ExportRequest {
    pub answer: String,
    /// Overrides the configured document heading
    #[serde(default)]
    pub heading: Option<String>,
}

pub async fn export_docx(
    State(state): State<AppState>,
    Json(body): Json<ExportRequest>,
) -> Response {
    if body.answer.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "Nothing to export");
    }

    let mut options = state.pipeline.config().export_options(true);
    if let Some(heading) = body.heading {
        options.heading = Some(heading).filter(|h| !h.trim().is_empty());
    }

    match docx_bytes(&body.answer, &options) {
        Ok(bytes) => {
            let filename = format!(
                "case_analysis_{}.docx",
                chrono::Local::now().format("%Y%m%d_%H%M")
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, DOCX_MIME.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                Body::from(bytes),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Word export failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build Word document")
        }
    }
}
