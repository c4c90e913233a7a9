mod engine;

use sqlx::PgPool;

use crate::db::models::{ExamLog, QuestionChoice, SectionQuestion, Student, StudentAnswer};
use crate::repositories;
use crate::services::access::Actor;
use crate::services::errors::ServiceError;

pub(crate) use engine::{ExamStats, GradeWithAnswers, StudentDetail, StudentGrade};
use engine::AnswerKey;

/// Rows the grading reports are computed from.
struct GradingInput {
    questions: Vec<SectionQuestion>,
    choices: Vec<QuestionChoice>,
    students: Vec<Student>,
    answers: Vec<StudentAnswer>,
}

impl GradingInput {
    fn key(&self) -> AnswerKey {
        AnswerKey::new(&self.questions, &self.choices)
    }
}

async fn authorize_exam(pool: &PgPool, actor: &Actor, exam_id: &str) -> Result<(), ServiceError> {
    let (owner_id, _) = repositories::exams::find_status(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&owner_id)
}

async fn load(pool: &PgPool, actor: &Actor, exam_id: &str) -> Result<GradingInput, ServiceError> {
    authorize_exam(pool, actor, exam_id).await?;

    let questions = repositories::questions::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load questions"))?;
    let choices = repositories::choices::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load choices"))?;
    let students = repositories::students::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load students"))?;
    let answers = repositories::answers::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load answers"))?;

    Ok(GradingInput { questions, choices, students, answers })
}

pub(crate) async fn exam_grades(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<Vec<StudentGrade>, ServiceError> {
    let input = load(pool, actor, exam_id).await?;
    Ok(engine::grades(&input.key(), &input.students, &input.answers))
}

pub(crate) async fn exam_grades_with_answers(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<Vec<GradeWithAnswers>, ServiceError> {
    let input = load(pool, actor, exam_id).await?;
    Ok(engine::grades_with_answers(&input.key(), &input.students, &input.answers))
}

pub(crate) async fn exam_stats(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<ExamStats, ServiceError> {
    let input = load(pool, actor, exam_id).await?;
    let stats = engine::exam_stats(&input.key(), &input.students, &input.answers);

    tracing::debug!(
        exam_id = %exam_id,
        students = stats.number_of_students,
        avg_score = stats.avg_score,
        "Computed exam stats"
    );

    Ok(stats)
}

pub(crate) async fn student_detail(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
    student_id: &str,
) -> Result<StudentDetail, ServiceError> {
    authorize_exam(pool, actor, exam_id).await?;

    let student = repositories::students::find(pool, exam_id, student_id)
        .await
        .map_err(ServiceError::storage("Failed to load student"))?
        .ok_or(ServiceError::NotFound("Student"))?;
    let questions = repositories::questions::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load questions"))?;
    let choices = repositories::choices::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load choices"))?;
    let answers = repositories::answers::list_by_student(pool, exam_id, student_id)
        .await
        .map_err(ServiceError::storage("Failed to load answers"))?;

    let key = AnswerKey::new(&questions, &choices);
    Ok(engine::student_detail(&key, &questions, &choices, &student, &answers))
}

/// Most recent entries first; `limit` must be positive when given.
pub(crate) async fn exam_logs(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
    limit: Option<i64>,
) -> Result<Vec<ExamLog>, ServiceError> {
    if matches!(limit, Some(value) if value <= 0) {
        return Err(ServiceError::validation("limit must be a positive integer"));
    }
    authorize_exam(pool, actor, exam_id).await?;

    repositories::exam_logs::list_recent(pool, exam_id, limit)
        .await
        .map_err(ServiceError::storage("Failed to load exam logs"))
}
