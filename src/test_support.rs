use std::sync::{Mutex, MutexGuard};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use time::macros::{date, datetime, time};
use uuid::Uuid;

use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::db::models::{
    Exam, ExamLog, ExamSection, QuestionChoice, SectionQuestion, Student, StudentAnswer,
};
use crate::db::types::{DifficultyLevel, ExamStatus, StudentStatus};
use crate::repositories;

const TEST_DATABASE_URL_ENV: &str = "LANEXAM_TEST_DATABASE_URL";

/// Serializes tests that read or write process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets (or removes, for `None`) variables and puts the old values back on drop.
pub(crate) struct EnvRestore {
    previous: Vec<(&'static str, Option<String>)>,
}

impl EnvRestore {
    pub(crate) fn apply(vars: &[(&'static str, Option<&str>)]) -> Self {
        let previous = vars.iter().map(|(key, _)| (*key, std::env::var(key).ok())).collect();
        for (key, value) in vars {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
        Self { previous }
    }
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Migrated pool on the test database, or `None` when no database is configured.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let url = std::env::var(TEST_DATABASE_URL_ENV).ok().filter(|url| !url.trim().is_empty())?;

    let pool =
        PgPoolOptions::new().max_connections(5).connect(&url).await.expect("connect test db");
    crate::db::run_migrations(&pool).await.expect("migrations");
    Some(pool)
}

pub(crate) fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub(crate) fn lazy_state(settings: Settings) -> AppState {
    let db = sqlx::PgPool::connect_lazy(&settings.database().database_url()).expect("lazy pool");
    AppState::new(settings, db)
}

/// State whose exam clock reads early afternoon, so a window started from an
/// HTTP test never runs past midnight.
pub(crate) fn test_state(pool: PgPool) -> AppState {
    let hour = i8::try_from(time::OffsetDateTime::now_utc().hour()).unwrap_or(0);
    let offset = time::UtcOffset::from_hms(12 - hour, 0, 0).unwrap_or(time::UtcOffset::UTC);
    AppState::new(Settings::for_tests().with_utc_offset(offset), pool)
}

pub(crate) fn bearer_token(professor_id: &str, is_admin: bool, settings: &Settings) -> String {
    security::create_access_token(professor_id, is_admin, settings, time::Duration::minutes(30))
        .expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(crate) async fn read_json(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&body).expect("json body")
}

pub(crate) async fn seed_course(pool: &PgPool) -> String {
    let course_id = unique_id("course");
    repositories::courses::insert_if_absent(pool, &course_id, "Seeded course")
        .await
        .expect("insert course");
    course_id
}

async fn insert_exam(pool: &PgPool, professor_id: &str, status: ExamStatus) -> Exam {
    let course_id = seed_course(pool).await;
    let id = unique_id("exam");

    repositories::exams::create(
        pool,
        repositories::exams::CreateExam {
            id: &id,
            name: "Seeded exam",
            course_id: &course_id,
            professor_id,
            start_date: date!(2024 - 05 - 01),
            start_time: time!(9:00),
            end_time: time!(11:00),
            min_submit_time: time!(10:00),
            max_attempts: 1,
            exam_instructions: "",
            exam_password: "pw",
            status,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert exam")
}

/// NOT_STARTED exam on 2024-05-01, 09:00 to 11:00, submissions from 10:00.
pub(crate) async fn seed_exam(pool: &PgPool, professor_id: &str) -> Exam {
    insert_exam(pool, professor_id, ExamStatus::NotStarted).await
}

pub(crate) async fn seed_students(
    pool: &PgPool,
    exam_id: &str,
    students: &[(&str, StudentStatus)],
) {
    let rows: Vec<Student> = students
        .iter()
        .map(|(id, status)| Student {
            exam_id: exam_id.to_string(),
            id: id.to_string(),
            name: format!("Student {id}"),
            email: Some(format!("{id}@example.com")),
            national_id: None,
            remaining_attempts: 1,
            status: *status,
        })
        .collect();

    let mut conn = pool.acquire().await.expect("connection");
    repositories::students::insert_many(&mut conn, &rows).await.expect("insert students");
}

/// COMPLETED exam with two sections and three questions: (1,1) weight 2,
/// (1,2) weight 3, (2,1) weight 5, choice 1 correct on each. Students s1..s5
/// score 10, 5, 0 (wrong answer), and s4, s5 answered nothing; s4 never started.
pub(crate) async fn seed_full_exam(pool: &PgPool, professor_id: &str) -> Exam {
    let exam = insert_exam(pool, professor_id, ExamStatus::Completed).await;
    let exam_id = exam.id.clone();

    let sections: Vec<ExamSection> = [(1, "Part A"), (2, "Part B")]
        .into_iter()
        .map(|(section_id, title)| ExamSection {
            exam_id: exam_id.clone(),
            section_id,
            section_title: title.to_string(),
            random_shuffle: section_id == 2,
        })
        .collect();

    let questions: Vec<SectionQuestion> = [(1, 1, 2.0), (1, 2, 3.0), (2, 1, 5.0)]
        .into_iter()
        .map(|(section_id, question_id, weight)| SectionQuestion {
            exam_id: exam_id.clone(),
            section_id,
            question_id,
            professor_id: professor_id.to_string(),
            question_text: format!("Question {section_id}.{question_id}"),
            diagram: (question_id == 2).then(|| vec![1, 2, 3, 4]),
            weight,
            difficulty: DifficultyLevel::Easy,
        })
        .collect();

    let mut choices = Vec::new();
    for question in &questions {
        for choice_id in [1, 2] {
            choices.push(QuestionChoice {
                exam_id: exam_id.clone(),
                section_id: question.section_id,
                question_id: question.question_id,
                choice_id,
                choice_text: format!("Choice {choice_id}"),
                is_correct: choice_id == 1,
            });
        }
    }

    let answer = |student_id: &str, section_id, question_id, student_choice| StudentAnswer {
        exam_id: exam_id.clone(),
        student_id: student_id.to_string(),
        section_id,
        question_id,
        student_choice,
        question_order: question_id,
        section_order: section_id,
    };
    let answers = vec![
        answer("s1", 1, 1, 1),
        answer("s1", 1, 2, 1),
        answer("s1", 2, 1, 1),
        answer("s2", 1, 1, 2),
        answer("s2", 2, 1, 1),
        answer("s3", 1, 2, 2),
    ];

    let log = |id, action: &str, time_stamp| ExamLog {
        id,
        exam_id: exam_id.clone(),
        student_id: "s1".to_string(),
        ip_addr: "192.168.1.20".to_string(),
        user_agent: "exam-client".to_string(),
        action: action.to_string(),
        section_id: None,
        question_id: None,
        time_stamp,
    };
    let logs = vec![
        log(0, "login", datetime!(2024-05-01 9:01)),
        log(0, "submit", datetime!(2024-05-01 10:30)),
    ];

    seed_students(
        pool,
        &exam_id,
        &[
            ("s1", StudentStatus::SubmittedByHimself),
            ("s2", StudentStatus::SubmittedByProfessor),
            ("s3", StudentStatus::Active),
            ("s4", StudentStatus::NotStarted),
            ("s5", StudentStatus::Disconnected),
        ],
    )
    .await;

    let mut conn = pool.acquire().await.expect("connection");
    repositories::sections::insert_many(&mut conn, &sections).await.expect("sections");
    repositories::questions::insert_many(&mut conn, &questions).await.expect("questions");
    repositories::choices::insert_many(&mut conn, &choices).await.expect("choices");
    repositories::answers::insert_many(&mut conn, &answers).await.expect("answers");
    repositories::exam_logs::insert_many(&mut conn, &logs).await.expect("logs");

    exam
}
