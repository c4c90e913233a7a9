use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentProfessor;
use crate::core::state::AppState;
use crate::schemas::exam::ExamLogResponse;
use crate::services::grading::{self, ExamStats, GradeWithAnswers, StudentDetail, StudentGrade};

use super::super::queries::ExamLogsQuery;

pub(in crate::api::exams) async fn exam_grades(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentGrade>>, ApiError> {
    Ok(Json(grading::exam_grades(state.db(), &actor, &exam_id).await?))
}

pub(in crate::api::exams) async fn exam_stats(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<ExamStats>, ApiError> {
    Ok(Json(grading::exam_stats(state.db(), &actor, &exam_id).await?))
}

pub(in crate::api::exams) async fn exam_logs(
    Path(exam_id): Path<String>,
    Query(query): Query<ExamLogsQuery>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamLogResponse>>, ApiError> {
    let logs = grading::exam_logs(state.db(), &actor, &exam_id, query.limit).await?;

    Ok(Json(logs.into_iter().map(ExamLogResponse::from).collect()))
}

pub(in crate::api::exams) async fn students_answers(
    Path(exam_id): Path<String>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<Vec<GradeWithAnswers>>, ApiError> {
    Ok(Json(grading::exam_grades_with_answers(state.db(), &actor, &exam_id).await?))
}

pub(in crate::api::exams) async fn student_answers(
    Path((exam_id, student_id)): Path<(String, String)>,
    CurrentProfessor(actor): CurrentProfessor,
    State(state): State<AppState>,
) -> Result<Json<StudentDetail>, ApiError> {
    Ok(Json(grading::student_detail(state.db(), &actor, &exam_id, &student_id).await?))
}
