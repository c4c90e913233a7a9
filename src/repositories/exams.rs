use time::{Date, PrimitiveDateTime, Time};

use crate::db::models::{Exam, ExamSummary};
use crate::db::types::ExamStatus;

pub(crate) const COLUMNS: &str = "\
    id, name, course_id, professor_id, start_date, start_time, end_time, min_submit_time, \
    max_attempts, exam_instructions, exam_password, status, created_at, updated_at";

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) professor_id: &'a str,
    pub(crate) start_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) min_submit_time: Time,
    pub(crate) max_attempts: i32,
    pub(crate) exam_instructions: &'a str,
    pub(crate) exam_password: &'a str,
    pub(crate) status: ExamStatus,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Editable metadata of an exam that has not run yet.
pub(crate) struct UpdateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) start_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) min_submit_time: Time,
    pub(crate) max_attempts: i32,
    pub(crate) exam_instructions: &'a str,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Status change guarded by the status the caller read.
pub(crate) struct ApplyTransition<'a> {
    pub(crate) id: &'a str,
    pub(crate) expected: ExamStatus,
    pub(crate) next: ExamStatus,
    pub(crate) start_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) min_submit_time: Time,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams ({COLUMNS})
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.course_id)
    .bind(params.professor_id)
    .bind(params.start_date)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.min_submit_time)
    .bind(params.max_attempts)
    .bind(params.exam_instructions)
    .bind(params.exam_password)
    .bind(params.status)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Reads the exam and holds its row lock until the surrounding transaction ends.
pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Exams with their question count and total weight. Running exams come first,
/// then upcoming, then finished; newest first within each group. `None` lists
/// every professor's exams.
pub(crate) async fn list_summaries(
    executor: impl sqlx::PgExecutor<'_>,
    professor_id: Option<&str>,
) -> Result<Vec<ExamSummary>, sqlx::Error> {
    sqlx::query_as::<_, ExamSummary>(
        "SELECT e.id, e.name, e.course_id, e.professor_id, e.start_date, e.start_time,
                e.end_time, e.min_submit_time, e.max_attempts, e.exam_instructions,
                e.exam_password, e.status, e.created_at, e.updated_at,
                COUNT(q.question_id)::int AS questions_count,
                COALESCE(SUM(q.weight), 0)::float8 AS total_weight
         FROM exams e
         LEFT JOIN section_questions q ON q.exam_id = e.id
         WHERE $1::text IS NULL OR e.professor_id = $1
         GROUP BY e.id
         ORDER BY CASE e.status
                      WHEN 'ONGOING' THEN 0
                      WHEN 'NOT_STARTED' THEN 1
                      ELSE 2
                  END,
                  e.created_at DESC,
                  e.id",
    )
    .bind(professor_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find_status(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<(String, ExamStatus)>, sqlx::Error> {
    sqlx::query_as::<_, (String, ExamStatus)>("SELECT professor_id, status FROM exams WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Returns `None` when the stored status no longer matches `expected`.
pub(crate) async fn apply_transition(
    executor: impl sqlx::PgExecutor<'_>,
    params: ApplyTransition<'_>,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            status = $1,
            start_date = $2,
            start_time = $3,
            end_time = $4,
            min_submit_time = $5,
            updated_at = $6
         WHERE id = $7 AND status = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.next)
    .bind(params.start_date)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.min_submit_time)
    .bind(params.updated_at)
    .bind(params.id)
    .bind(params.expected)
    .fetch_optional(executor)
    .await
}

/// Returns `None` when the exam is missing or has left NOT_STARTED.
pub(crate) async fn update_not_started(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpdateExam<'_>,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            name = $1,
            course_id = $2,
            start_date = $3,
            start_time = $4,
            end_time = $5,
            min_submit_time = $6,
            max_attempts = $7,
            exam_instructions = $8,
            updated_at = $9
         WHERE id = $10 AND status = $11
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.course_id)
    .bind(params.start_date)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.min_submit_time)
    .bind(params.max_attempts)
    .bind(params.exam_instructions)
    .bind(params.updated_at)
    .bind(params.id)
    .bind(ExamStatus::NotStarted)
    .fetch_optional(executor)
    .await
}

/// Children go with the exam through `ON DELETE CASCADE`.
pub(crate) async fn delete_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected())
}
