use crate::db::models::Course;

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT course_id, course_name FROM courses WHERE course_id = $1")
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

/// Inserts the course unless one with the same id exists. Returns whether a row was written.
pub(crate) async fn insert_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    course_name: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO courses (course_id, course_name) VALUES ($1, $2)
         ON CONFLICT (course_id) DO NOTHING",
    )
    .bind(course_id)
    .bind(course_name)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
