use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentProfessor;
use crate::core::state::AppState;
use crate::schemas::exam::{
    ExamCreate, ExamResponse, ExamStatusResponse, ExamSummaryResponse, ExamUpdate,
};
use crate::services::lifecycle;

pub(in crate::api::exams) async fn create_exam(
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam = lifecycle::create_exam(state.db(), &actor, payload.into()).await?;

    Ok((StatusCode::CREATED, Json(exam.into())))
}

pub(in crate::api::exams) async fn list_exams(
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummaryResponse>>, ApiError> {
    let exams = lifecycle::list_exams(state.db(), &actor).await?;

    Ok(Json(exams.into_iter().map(ExamSummaryResponse::from).collect()))
}

pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = lifecycle::get_exam(state.db(), &actor, &exam_id).await?;

    Ok(Json(exam.into()))
}

pub(in crate::api::exams) async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam = lifecycle::update_exam(state.db(), &actor, &exam_id, payload.into()).await?;

    Ok(Json(exam.into()))
}

pub(in crate::api::exams) async fn exam_status(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<ExamStatusResponse>, ApiError> {
    let status = lifecycle::exam_status(state.db(), &actor, &exam_id).await?;

    Ok(Json(ExamStatusResponse { exam_id, status }))
}

pub(in crate::api::exams) async fn start_exam(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = lifecycle::start_exam(state.db(), &actor, &exam_id, state.exam_now()).await?;

    Ok(Json(exam.into()))
}

pub(in crate::api::exams) async fn end_exam(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = lifecycle::end_exam(state.db(), &actor, &exam_id, state.exam_now()).await?;

    Ok(Json(exam.into()))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    lifecycle::delete_exam(state.db(), &actor, &exam_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
