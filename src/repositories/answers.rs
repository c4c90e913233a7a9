use sqlx::PgConnection;

use crate::db::models::StudentAnswer;
use crate::repositories::batch::BatchInsert;

const COLUMNS: &str = "exam_id, student_id, section_id, question_id, student_choice, \
    question_order, section_order";

const INSERT: BatchInsert = BatchInsert::new(
    "student_answers",
    &[
        "exam_id",
        "student_id",
        "section_id",
        "question_id",
        "student_choice",
        "question_order",
        "section_order",
    ],
);

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "SELECT {COLUMNS} FROM student_answers
         WHERE exam_id = $1
         ORDER BY student_id, section_id, question_id",
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_student(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "SELECT {COLUMNS} FROM student_answers
         WHERE exam_id = $1 AND student_id = $2
         ORDER BY section_id, question_id",
    ))
    .bind(exam_id)
    .bind(student_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    rows: &[StudentAnswer],
) -> Result<u64, sqlx::Error> {
    INSERT
        .execute(conn, rows, |mut b, row| {
            b.push_bind(row.exam_id.as_str())
                .push_bind(row.student_id.as_str())
                .push_bind(row.section_id)
                .push_bind(row.question_id)
                .push_bind(row.student_choice)
                .push_bind(row.question_order)
                .push_bind(row.section_order);
        })
        .await
}
