use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::db::models::ExamLog;
use crate::repositories::batch::BatchInsert;

const COLUMNS: &str =
    "id, exam_id, student_id, ip_addr, user_agent, action, section_id, question_id, time_stamp";

// `id` is left to the sequence.
const INSERT: BatchInsert = BatchInsert::new(
    "exam_logs",
    &[
        "exam_id",
        "student_id",
        "ip_addr",
        "user_agent",
        "action",
        "section_id",
        "question_id",
        "time_stamp",
    ],
);

/// Oldest first.
pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<ExamLog>, sqlx::Error> {
    sqlx::query_as::<_, ExamLog>(&format!(
        "SELECT {COLUMNS} FROM exam_logs WHERE exam_id = $1 ORDER BY time_stamp, id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

/// Newest first, optionally capped.
pub(crate) async fn list_recent(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    limit: Option<i64>,
) -> Result<Vec<ExamLog>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exam_logs WHERE exam_id = "));
    builder.push_bind(exam_id);
    builder.push(" ORDER BY time_stamp DESC, id DESC");

    if let Some(limit) = limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    builder.build_query_as::<ExamLog>().fetch_all(executor).await
}

pub(crate) async fn insert_many(
    conn: &mut PgConnection,
    rows: &[ExamLog],
) -> Result<u64, sqlx::Error> {
    INSERT
        .execute(conn, rows, |mut b, row| {
            b.push_bind(row.exam_id.as_str())
                .push_bind(row.student_id.as_str())
                .push_bind(row.ip_addr.as_str())
                .push_bind(row.user_agent.as_str())
                .push_bind(row.action.as_str())
                .push_bind(row.section_id)
                .push_bind(row.question_id)
                .push_bind(row.time_stamp);
        })
        .await
}
