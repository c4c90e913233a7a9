use sqlx::PgConnection;

use crate::db::models::QuestionChoice;
use crate::repositories::batch::BatchInsert;

const INSERT: BatchInsert = BatchInsert::new(
    "section_question_choices",
    &["exam_id", "section_id", "question_id", "choice_id", "choice_text", "is_correct"],
);

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<QuestionChoice>, sqlx::Error> {
    sqlx::query_as::<_, QuestionChoice>(
        "SELECT exam_id, section_id, question_id, choice_id, choice_text, is_correct
         FROM section_question_choices
         WHERE exam_id = $1
         ORDER BY section_id, question_id, choice_id",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    rows: &[QuestionChoice],
) -> Result<u64, sqlx::Error> {
    INSERT
        .execute(conn, rows, |mut b, row| {
            b.push_bind(row.exam_id.as_str())
                .push_bind(row.section_id)
                .push_bind(row.question_id)
                .push_bind(row.choice_id)
                .push_bind(row.choice_text.as_str())
                .push_bind(row.is_correct);
        })
        .await
}
