use sqlx::PgConnection;

use crate::db::models::SectionQuestion;
use crate::repositories::batch::BatchInsert;

const COLUMNS: &str =
    "exam_id, section_id, question_id, professor_id, question_text, diagram, weight, difficulty";

const INSERT: BatchInsert = BatchInsert::new(
    "section_questions",
    &[
        "exam_id",
        "section_id",
        "question_id",
        "professor_id",
        "question_text",
        "diagram",
        "weight",
        "difficulty",
    ],
);

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<SectionQuestion>, sqlx::Error> {
    sqlx::query_as::<_, SectionQuestion>(&format!(
        "SELECT {COLUMNS} FROM section_questions
         WHERE exam_id = $1
         ORDER BY section_id, question_id",
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    rows: &[SectionQuestion],
) -> Result<u64, sqlx::Error> {
    INSERT
        .execute(conn, rows, |mut b, row| {
            b.push_bind(row.exam_id.as_str())
                .push_bind(row.section_id)
                .push_bind(row.question_id)
                .push_bind(row.professor_id.as_str())
                .push_bind(row.question_text.as_str())
                .push_bind(row.diagram.as_deref())
                .push_bind(row.weight)
                .push_bind(row.difficulty);
        })
        .await
}
