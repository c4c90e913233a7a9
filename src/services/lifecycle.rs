use sqlx::PgPool;
use thiserror::Error;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, ExamSummary};
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::services::access::Actor;
use crate::services::errors::ServiceError;
use crate::services::schedule::ExamSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Start,
    End,
}

impl Transition {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Every legal move. Anything absent is refused.
const TRANSITIONS: &[(ExamStatus, Transition, ExamStatus)] = &[
    (ExamStatus::NotStarted, Transition::Start, ExamStatus::Ongoing),
    (ExamStatus::Ongoing, Transition::End, ExamStatus::Completed),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum TransitionError {
    #[error("Exam has already started")]
    AlreadyStarted,
    #[error("Exam has already ended")]
    AlreadyCompleted,
    #[error("Exam has not started yet")]
    NotStarted,
    #[error("Exam is in progress")]
    InProgress,
    #[error("Exam status changed concurrently")]
    Concurrent,
}

pub(crate) fn next_status(
    current: ExamStatus,
    transition: Transition,
) -> Result<ExamStatus, TransitionError> {
    if let Some((_, _, next)) =
        TRANSITIONS.iter().find(|(from, via, _)| *from == current && *via == transition)
    {
        return Ok(*next);
    }

    Err(match current {
        ExamStatus::NotStarted => TransitionError::NotStarted,
        ExamStatus::Ongoing => TransitionError::AlreadyStarted,
        ExamStatus::Completed => TransitionError::AlreadyCompleted,
    })
}

/// Metadata a professor sets when creating or editing an exam.
#[derive(Debug, Clone)]
pub(crate) struct ExamDetails {
    pub(crate) name: String,
    pub(crate) course_id: String,
    pub(crate) start_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) min_submit_time: Time,
    pub(crate) max_attempts: i32,
    pub(crate) exam_instructions: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewExam {
    pub(crate) details: ExamDetails,
    pub(crate) exam_password: String,
}

async fn check_details(
    executor: impl sqlx::PgExecutor<'_>,
    details: &ExamDetails,
) -> Result<ExamSchedule, ServiceError> {
    if details.name.trim().is_empty() {
        return Err(ServiceError::validation("Exam name must not be empty"));
    }
    if details.max_attempts < 1 {
        return Err(ServiceError::validation("max_attempts must be at least 1"));
    }
    let schedule = ExamSchedule::planned(
        details.start_date,
        details.start_time,
        details.end_time,
        details.min_submit_time,
    )?;

    let course = repositories::courses::find_by_id(executor, &details.course_id)
        .await
        .map_err(ServiceError::storage("Failed to load course"))?;
    if course.is_none() {
        return Err(ServiceError::NotFound("Course"));
    }

    Ok(schedule)
}

pub(crate) async fn create_exam(
    pool: &PgPool,
    actor: &Actor,
    input: NewExam,
) -> Result<Exam, ServiceError> {
    let schedule = check_details(pool, &input.details).await?;
    let details = &input.details;

    let id = Uuid::new_v4().to_string();
    let exam = repositories::exams::create(
        pool,
        repositories::exams::CreateExam {
            id: &id,
            name: details.name.trim(),
            course_id: &details.course_id,
            professor_id: &actor.professor_id,
            start_date: schedule.start_date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            min_submit_time: schedule.min_submit_time,
            max_attempts: details.max_attempts,
            exam_instructions: &details.exam_instructions,
            exam_password: &input.exam_password,
            status: ExamStatus::NotStarted,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(ServiceError::storage("Failed to create exam"))?;

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %exam.id,
        course_id = %exam.course_id,
        action = "exam_create",
        "Exam created"
    );

    Ok(exam)
}

/// The caller's exams, or every exam for an admin.
pub(crate) async fn list_exams(
    pool: &PgPool,
    actor: &Actor,
) -> Result<Vec<ExamSummary>, ServiceError> {
    let owner = (!actor.is_admin).then_some(actor.professor_id.as_str());

    repositories::exams::list_summaries(pool, owner)
        .await
        .map_err(ServiceError::storage("Failed to list exams"))
}

pub(crate) async fn get_exam(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<Exam, ServiceError> {
    let exam = repositories::exams::find_by_id(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&exam.professor_id)?;

    Ok(exam)
}

/// Rewrites the exam metadata. Only exams that have not started may change;
/// the password and owner stay as they are.
pub(crate) async fn update_exam(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
    details: ExamDetails,
) -> Result<Exam, ServiceError> {
    let mut tx =
        pool.begin().await.map_err(ServiceError::storage("Failed to begin transaction"))?;

    let exam = repositories::exams::lock_by_id(&mut *tx, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&exam.professor_id)?;

    match exam.status {
        ExamStatus::NotStarted => {}
        ExamStatus::Ongoing => return Err(TransitionError::InProgress.into()),
        ExamStatus::Completed => return Err(TransitionError::AlreadyCompleted.into()),
    }

    let schedule = check_details(&mut *tx, &details).await?;
    let updated = repositories::exams::update_not_started(
        &mut *tx,
        repositories::exams::UpdateExam {
            id: exam_id,
            name: details.name.trim(),
            course_id: &details.course_id,
            start_date: schedule.start_date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            min_submit_time: schedule.min_submit_time,
            max_attempts: details.max_attempts,
            exam_instructions: &details.exam_instructions,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(ServiceError::storage("Failed to update exam"))?
    .ok_or(TransitionError::Concurrent)?;

    tx.commit().await.map_err(ServiceError::storage("Failed to commit transaction"))?;

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %exam_id,
        course_id = %updated.course_id,
        action = "exam_update",
        "Exam updated"
    );

    Ok(updated)
}

pub(crate) async fn exam_status(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<ExamStatus, ServiceError> {
    let (owner_id, status) = repositories::exams::find_status(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&owner_id)?;

    Ok(status)
}

/// Starts the exam now: the planned window is moved to begin at `now`.
pub(crate) async fn start_exam(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, ServiceError> {
    let result = transition(pool, actor, exam_id, Transition::Start, now).await;
    record_transition(Transition::Start, &result);
    let (exam, _) = result?;

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %exam.id,
        start_time = %exam.start_time,
        end_time = %exam.end_time,
        action = "exam_start",
        "Exam started"
    );

    Ok(exam)
}

/// Ends the exam now and force-submits every student still sitting it.
pub(crate) async fn end_exam(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, ServiceError> {
    let result = transition(pool, actor, exam_id, Transition::End, now).await;
    record_transition(Transition::End, &result);
    let (exam, submitted) = result?;

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %exam.id,
        end_time = %exam.end_time,
        submitted_students = submitted,
        action = "exam_end",
        "Exam ended"
    );

    Ok(exam)
}

async fn transition(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
    transition: Transition,
    now: PrimitiveDateTime,
) -> Result<(Exam, u64), ServiceError> {
    let mut tx =
        pool.begin().await.map_err(ServiceError::storage("Failed to begin transaction"))?;

    let exam = repositories::exams::lock_by_id(&mut *tx, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&exam.professor_id)?;

    let next = next_status(exam.status, transition)?;
    let current = ExamSchedule::from(&exam);
    let schedule = match transition {
        Transition::Start => current.reanchor(now)?,
        Transition::End => current.close(now),
    };

    let updated = repositories::exams::apply_transition(
        &mut *tx,
        repositories::exams::ApplyTransition {
            id: exam_id,
            expected: exam.status,
            next,
            start_date: schedule.start_date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            min_submit_time: schedule.min_submit_time,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(ServiceError::storage("Failed to update exam status"))?
    .ok_or(TransitionError::Concurrent)?;

    let submitted = match transition {
        Transition::End => repositories::students::submit_active(&mut *tx, exam_id)
            .await
            .map_err(ServiceError::storage("Failed to submit active students"))?,
        Transition::Start => 0,
    };

    tx.commit().await.map_err(ServiceError::storage("Failed to commit transaction"))?;

    Ok((updated, submitted))
}

fn record_transition<T>(transition: Transition, result: &Result<T, ServiceError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(ServiceError::Conflict(_)) => "conflict",
        Err(ServiceError::Storage { .. }) => "error",
        Err(_) => "rejected",
    };
    metrics::counter!(
        "exam_transitions_total",
        "action" => transition.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Removes the exam with all of its children. Refused while the exam runs.
pub(crate) async fn delete_exam(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<(), ServiceError> {
    let mut tx =
        pool.begin().await.map_err(ServiceError::storage("Failed to begin transaction"))?;

    let exam = repositories::exams::lock_by_id(&mut *tx, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&exam.professor_id)?;

    if exam.status == ExamStatus::Ongoing {
        return Err(TransitionError::InProgress.into());
    }

    repositories::exams::delete_by_id(&mut *tx, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to delete exam"))?;
    tx.commit().await.map_err(ServiceError::storage("Failed to commit transaction"))?;

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %exam_id,
        action = "exam_delete",
        "Exam deleted"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime, time};

    use super::*;
    use crate::db::types::StudentStatus;
    use crate::test_support;

    #[test]
    fn transition_table_moves_forward_only() {
        assert_eq!(
            next_status(ExamStatus::NotStarted, Transition::Start),
            Ok(ExamStatus::Ongoing)
        );
        assert_eq!(next_status(ExamStatus::Ongoing, Transition::End), Ok(ExamStatus::Completed));

        assert_eq!(
            next_status(ExamStatus::Ongoing, Transition::Start),
            Err(TransitionError::AlreadyStarted)
        );
        assert_eq!(
            next_status(ExamStatus::Completed, Transition::Start),
            Err(TransitionError::AlreadyCompleted)
        );
        assert_eq!(
            next_status(ExamStatus::Completed, Transition::End),
            Err(TransitionError::AlreadyCompleted)
        );
        assert_eq!(
            next_status(ExamStatus::NotStarted, Transition::End),
            Err(TransitionError::NotStarted)
        );
    }

    #[test]
    fn lost_race_message_states_only_what_happened() {
        assert_eq!(TransitionError::Concurrent.to_string(), "Exam status changed concurrently");
    }

    #[tokio::test]
    async fn start_reanchors_and_end_submits_active_students() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;
        test_support::seed_students(
            &pool,
            &exam.id,
            &[
                ("s1", StudentStatus::Active),
                ("s2", StudentStatus::SubmittedByHimself),
                ("s3", StudentStatus::NotStarted),
            ],
        )
        .await;

        let started = start_exam(&pool, &owner, &exam.id, datetime!(2024-05-03 14:00))
            .await
            .expect("start");
        assert_eq!(started.status, ExamStatus::Ongoing);
        assert_eq!(started.start_date, date!(2024 - 05 - 03));
        assert_eq!(started.start_time, time!(14:00));
        assert_eq!(started.end_time, time!(16:00));
        assert_eq!(started.min_submit_time, time!(15:00));

        let ended = end_exam(&pool, &owner, &exam.id, datetime!(2024-05-03 14:30))
            .await
            .expect("end");
        assert_eq!(ended.status, ExamStatus::Completed);
        assert_eq!(ended.end_time, time!(14:30));
        assert_eq!(ended.min_submit_time, time!(14:30));

        let students = repositories::students::list_by_exam(&pool, &exam.id).await.unwrap();
        let statuses: Vec<_> = students.iter().map(|s| (s.id.as_str(), s.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("s1", StudentStatus::SubmittedByProfessor),
                ("s2", StudentStatus::SubmittedByHimself),
                ("s3", StudentStatus::NotStarted),
            ]
        );
    }

    #[tokio::test]
    async fn illegal_transitions_leave_status_unchanged() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;

        let err = end_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 10:00)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(TransitionError::NotStarted)));
        assert_eq!(
            exam_status(&pool, &owner, &exam.id).await.unwrap(),
            ExamStatus::NotStarted
        );

        start_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 09:00)).await.unwrap();
        let err =
            start_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 09:05)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(TransitionError::AlreadyStarted)));

        end_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 12:00)).await.unwrap();
        let err = end_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 12:05)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(TransitionError::AlreadyCompleted)));

        let stored = repositories::exams::find_by_id(&pool, &exam.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ExamStatus::Completed);
        // Past min-submit (10:00) is kept; end is the real close time.
        assert_eq!(stored.end_time, time!(12:00));
        assert_eq!(stored.min_submit_time, time!(10:00));
    }

    #[tokio::test]
    async fn start_past_midnight_is_rejected_without_changes() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;

        let err =
            start_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 23:30)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stored = repositories::exams::find_by_id(&pool, &exam.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ExamStatus::NotStarted);
        assert_eq!(stored.start_time, exam.start_time);
    }

    #[tokio::test]
    async fn other_professor_cannot_transition_but_admin_can() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = test_support::unique_id("prof");
        let exam = test_support::seed_exam(&pool, &owner).await;

        let stranger = Actor::professor(test_support::unique_id("prof"));
        let err =
            start_exam(&pool, &stranger, &exam.id, datetime!(2024-05-01 09:00)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let admin = Actor::admin("root");
        let started =
            start_exam(&pool, &admin, &exam.id, datetime!(2024-05-01 09:00)).await.unwrap();
        assert_eq!(started.status, ExamStatus::Ongoing);
    }

    #[tokio::test]
    async fn missing_exam_is_not_found() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let actor = Actor::admin("root");

        let err = exam_status(&pool, &actor, "no-such-exam").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Exam")));
    }

    #[tokio::test]
    async fn delete_is_refused_while_ongoing() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;
        test_support::seed_students(&pool, &exam.id, &[("s1", StudentStatus::Active)]).await;

        start_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 09:00)).await.unwrap();
        let err = delete_exam(&pool, &owner, &exam.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(TransitionError::InProgress)));

        end_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 10:30)).await.unwrap();
        delete_exam(&pool, &owner, &exam.id).await.expect("delete");

        assert!(repositories::exams::find_by_id(&pool, &exam.id).await.unwrap().is_none());
        assert!(repositories::students::list_by_exam(&pool, &exam.id).await.unwrap().is_empty());
    }

    fn details(course_id: &str) -> ExamDetails {
        ExamDetails {
            name: "Midterm".to_string(),
            course_id: course_id.to_string(),
            start_date: date!(2024 - 05 - 01),
            start_time: time!(9:00),
            end_time: time!(11:00),
            min_submit_time: time!(10:00),
            max_attempts: 1,
            exam_instructions: String::new(),
        }
    }

    #[tokio::test]
    async fn create_requires_existing_course_and_valid_schedule() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let course_id = test_support::seed_course(&pool).await;
        let input = NewExam { details: details(&course_id), exam_password: "pw".to_string() };

        let exam = create_exam(&pool, &owner, input.clone()).await.unwrap();
        assert_eq!(exam.status, ExamStatus::NotStarted);
        assert_eq!(exam.professor_id, owner.professor_id);
        assert_eq!(exam.exam_password, "pw");

        let missing_course = ExamDetails {
            course_id: test_support::unique_id("missing"),
            ..details(&course_id)
        };
        let err = create_exam(&pool, &owner, NewExam { details: missing_course, ..input.clone() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Course")));

        let early_submit = ExamDetails { min_submit_time: time!(8:00), ..details(&course_id) };
        let err = create_exam(&pool, &owner, NewExam { details: early_submit, ..input })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn list_shows_own_exams_with_totals_and_admin_sees_all() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let full = test_support::seed_full_exam(&pool, &owner.professor_id).await;
        let upcoming = test_support::seed_exam(&pool, &owner.professor_id).await;
        let other = test_support::seed_exam(&pool, &test_support::unique_id("prof")).await;

        let listed = list_exams(&pool, &owner).await.expect("list");
        let ids: Vec<_> = listed.iter().map(|summary| summary.exam.id.as_str()).collect();
        // Upcoming before finished.
        assert_eq!(ids, vec![upcoming.id.as_str(), full.id.as_str()]);
        assert_eq!(listed[0].questions_count, 0);
        assert_eq!(listed[0].total_weight, 0.0);
        assert_eq!(listed[1].questions_count, 3);
        assert_eq!(listed[1].total_weight, 10.0);

        let everything = list_exams(&pool, &Actor::admin("root")).await.expect("admin list");
        for id in [&full.id, &upcoming.id, &other.id] {
            assert!(everything.iter().any(|summary| &summary.exam.id == id));
        }
    }

    #[tokio::test]
    async fn get_checks_ownership() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;

        let loaded = get_exam(&pool, &owner, &exam.id).await.expect("get");
        assert_eq!(loaded.name, exam.name);

        let stranger = Actor::professor(test_support::unique_id("prof"));
        let err = get_exam(&pool, &stranger, &exam.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = get_exam(&pool, &owner, "no-such-exam").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Exam")));
    }

    #[tokio::test]
    async fn update_rewrites_metadata_of_upcoming_exam() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;
        let new_course = test_support::seed_course(&pool).await;

        let changes = ExamDetails {
            name: "  Retake  ".to_string(),
            start_date: date!(2024 - 06 - 10),
            start_time: time!(13:00),
            end_time: time!(14:30),
            min_submit_time: time!(14:00),
            max_attempts: 3,
            exam_instructions: "Closed book".to_string(),
            ..details(&new_course)
        };
        let updated = update_exam(&pool, &owner, &exam.id, changes).await.expect("update");

        assert_eq!(updated.name, "Retake");
        assert_eq!(updated.course_id, new_course);
        assert_eq!(updated.start_date, date!(2024 - 06 - 10));
        assert_eq!(updated.end_time, time!(14:30));
        assert_eq!(updated.max_attempts, 3);
        assert_eq!(updated.exam_instructions, "Closed book");
        assert_eq!(updated.exam_password, exam.exam_password);
        assert_eq!(updated.professor_id, owner.professor_id);
        assert_eq!(updated.status, ExamStatus::NotStarted);
    }

    #[tokio::test]
    async fn update_rejects_bad_schedule_and_unknown_course() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;

        let inverted = ExamDetails { end_time: time!(9:30), ..details(&exam.course_id) };
        let err = update_exam(&pool, &owner, &exam.id, inverted).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let missing = details(&test_support::unique_id("missing"));
        let err = update_exam(&pool, &owner, &exam.id, missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Course")));

        let stored = repositories::exams::find_by_id(&pool, &exam.id).await.unwrap().unwrap();
        assert_eq!(stored.end_time, exam.end_time);
        assert_eq!(stored.course_id, exam.course_id);
    }

    #[tokio::test]
    async fn update_is_refused_once_the_exam_has_started() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_exam(&pool, &owner.professor_id).await;
        let started =
            start_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 09:00)).await.unwrap();

        let err = update_exam(&pool, &owner, &exam.id, details(&exam.course_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(TransitionError::InProgress)));

        end_exam(&pool, &owner, &exam.id, datetime!(2024-05-01 10:30)).await.unwrap();
        let err = update_exam(&pool, &owner, &exam.id, details(&exam.course_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(TransitionError::AlreadyCompleted)));

        let stored = repositories::exams::find_by_id(&pool, &exam.id).await.unwrap().unwrap();
        assert_eq!(stored.name, started.name);
        assert_eq!(stored.start_time, started.start_time);
    }

    #[tokio::test]
    async fn concurrent_starts_let_exactly_one_through() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));

        for _ in 0..5 {
            let exam = test_support::seed_exam(&pool, &owner.professor_id).await;
            let attempts: Vec<_> = (0..8)
                .map(|_| {
                    let pool = pool.clone();
                    let owner = owner.clone();
                    let exam_id = exam.id.clone();
                    tokio::spawn(async move {
                        start_exam(&pool, &owner, &exam_id, datetime!(2024-05-01 09:00)).await
                    })
                })
                .collect();

            let (mut started, mut conflicts) = (0, 0);
            for attempt in attempts {
                match attempt.await.expect("join") {
                    Ok(_) => started += 1,
                    Err(ServiceError::Conflict(_)) => conflicts += 1,
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            assert_eq!((started, conflicts), (1, 7));

            let stored = repositories::exams::find_by_id(&pool, &exam.id).await.unwrap().unwrap();
            assert_eq!(stored.status, ExamStatus::Ongoing);
            assert_eq!(stored.end_time, time!(11:00));
        }
    }
}
