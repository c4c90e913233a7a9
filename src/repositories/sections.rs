use sqlx::PgConnection;

use crate::db::models::ExamSection;
use crate::repositories::batch::BatchInsert;

const INSERT: BatchInsert =
    BatchInsert::new("exam_sections", &["exam_id", "section_id", "section_title", "random_shuffle"]);

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<ExamSection>, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(
        "SELECT exam_id, section_id, section_title, random_shuffle
         FROM exam_sections
         WHERE exam_id = $1
         ORDER BY section_id",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    rows: &[ExamSection],
) -> Result<u64, sqlx::Error> {
    INSERT
        .execute(conn, rows, |mut b, row| {
            b.push_bind(row.exam_id.as_str())
                .push_bind(row.section_id)
                .push_bind(row.section_title.as_str())
                .push_bind(row.random_shuffle);
        })
        .await
}
