use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentProfessor;
use crate::core::state::AppState;
use crate::schemas::snapshot::ExamSnapshot;
use crate::services::snapshot::{self, ImportSummary};

pub(in crate::api::exams) async fn export_exam(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<ExamSnapshot>, ApiError> {
    let document = snapshot::export_exam(state.db(), &actor, &exam_id).await?;

    Ok(Json(document))
}

pub(in crate::api::exams) async fn import_exam(
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
    Json(document): Json<ExamSnapshot>,
) -> Result<(StatusCode, Json<ImportSummary>), ApiError> {
    let summary = snapshot::import_exam(state.db(), &actor, document).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}
