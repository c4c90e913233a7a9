use sqlx::PgConnection;

use crate::db::models::Student;
use crate::db::types::StudentStatus;
use crate::repositories::batch::BatchInsert;

const COLUMNS: &str = "exam_id, id, name, email, national_id, remaining_attempts, status";

const INSERT: BatchInsert = BatchInsert::new(
    "students",
    &["exam_id", "id", "name", "email", "national_id", "remaining_attempts", "status"],
);

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE exam_id = $1 ORDER BY id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE exam_id = $1 AND id = $2"
    ))
    .bind(exam_id)
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

/// Every ACTIVE student of the exam becomes SUBMITTED_BY_PROFESSOR.
pub(crate) async fn submit_active(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE students SET status = $1 WHERE exam_id = $2 AND status = $3")
        .bind(StudentStatus::SubmittedByProfessor)
        .bind(exam_id)
        .bind(StudentStatus::Active)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    rows: &[Student],
) -> Result<u64, sqlx::Error> {
    INSERT
        .execute(conn, rows, |mut b, row| {
            b.push_bind(row.exam_id.as_str())
                .push_bind(row.id.as_str())
                .push_bind(row.name.as_str())
                .push_bind(row.email.as_deref())
                .push_bind(row.national_id.as_deref())
                .push_bind(row.remaining_attempts)
                .push_bind(row.status);
        })
        .await
}
