mod handlers;
mod queries;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router(snapshot_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_exams).post(handlers::create_exam))
        .route(
            "/import",
            post(handlers::import_exam).layer(DefaultBodyLimit::max(snapshot_max_bytes)),
        )
        .route(
            "/:exam_id",
            get(handlers::get_exam).put(handlers::update_exam).delete(handlers::delete_exam),
        )
        .route("/:exam_id/status", get(handlers::exam_status))
        .route("/:exam_id/start", put(handlers::start_exam))
        .route("/:exam_id/end", put(handlers::end_exam))
        .route("/:exam_id/export", get(handlers::export_exam))
        .route("/:exam_id/grades", get(handlers::exam_grades))
        .route("/:exam_id/stats", get(handlers::exam_stats))
        .route("/:exam_id/logs", get(handlers::exam_logs))
        .route("/:exam_id/students/answers", get(handlers::students_answers))
        .route("/:exam_id/students/:student_id/answers", get(handlers::student_answers))
}
