use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::core::time::primitive_now_utc;
use crate::db::models::{
    Course, Exam, ExamLog, ExamSection, QuestionChoice, SectionQuestion, Student, StudentAnswer,
};
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::schemas::snapshot::ExamSnapshot;
use crate::services::access::Actor;
use crate::services::errors::ServiceError;
use crate::services::schedule::ExamSchedule;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct ImportSummary {
    pub(crate) exam_id: String,
    pub(crate) course_created: bool,
    pub(crate) sections: u64,
    pub(crate) questions: u64,
    pub(crate) choices: u64,
    pub(crate) students: u64,
    pub(crate) student_answers: u64,
    pub(crate) exam_logs: u64,
}

/// A validated document flattened into rows for the new exam.
#[derive(Debug)]
struct ImportRows {
    course: Course,
    exam: Exam,
    sections: Vec<ExamSection>,
    questions: Vec<SectionQuestion>,
    choices: Vec<QuestionChoice>,
    students: Vec<Student>,
    answers: Vec<StudentAnswer>,
    logs: Vec<ExamLog>,
}

/// Rebuilds the document as a new exam owned by `actor`. All rows are
/// written in one transaction; on any error nothing is kept.
pub(crate) async fn import_exam(
    pool: &PgPool,
    actor: &Actor,
    document: ExamSnapshot,
) -> Result<ImportSummary, ServiceError> {
    let exam_id = Uuid::new_v4().to_string();
    let source_id = document.id.clone();

    let rows = match prepare(document, &actor.professor_id, exam_id, primitive_now_utc()) {
        Ok(rows) => rows,
        Err(err) => {
            metrics::counter!("exam_imports_total", "outcome" => "invalid").increment(1);
            return Err(err);
        }
    };

    let summary = match write(pool, &rows).await {
        Ok(summary) => summary,
        Err(err) => {
            metrics::counter!("exam_imports_total", "outcome" => "error").increment(1);
            return Err(err);
        }
    };

    metrics::counter!("exam_imports_total", "outcome" => "ok").increment(1);
    for (table, count) in [
        ("sections", summary.sections),
        ("questions", summary.questions),
        ("choices", summary.choices),
        ("students", summary.students),
        ("student_answers", summary.student_answers),
        ("exam_logs", summary.exam_logs),
    ] {
        metrics::counter!("exam_import_rows_total", "table" => table).increment(count);
    }

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %summary.exam_id,
        source_exam_id = source_id.as_deref().unwrap_or("-"),
        course_id = %rows.course.course_id,
        course_created = summary.course_created,
        questions = summary.questions,
        students = summary.students,
        action = "exam_import",
        "Exam imported"
    );

    Ok(summary)
}

async fn write(pool: &PgPool, rows: &ImportRows) -> Result<ImportSummary, ServiceError> {
    let mut tx =
        pool.begin().await.map_err(ServiceError::storage("Failed to begin import transaction"))?;

    let course_created = repositories::courses::insert_if_absent(
        &mut *tx,
        &rows.course.course_id,
        &rows.course.course_name,
    )
    .await
    .map_err(ServiceError::storage("Failed to insert course"))?;

    let exam = &rows.exam;
    repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            id: &exam.id,
            name: &exam.name,
            course_id: &exam.course_id,
            professor_id: &exam.professor_id,
            start_date: exam.start_date,
            start_time: exam.start_time,
            end_time: exam.end_time,
            min_submit_time: exam.min_submit_time,
            max_attempts: exam.max_attempts,
            exam_instructions: &exam.exam_instructions,
            exam_password: &exam.exam_password,
            status: exam.status,
            created_at: exam.created_at,
        },
    )
    .await
    .map_err(ServiceError::storage("Failed to insert exam"))?;

    let sections = repositories::sections::insert_many(&mut *tx, &rows.sections)
        .await
        .map_err(ServiceError::storage("Failed to insert sections"))?;
    let questions = repositories::questions::insert_many(&mut *tx, &rows.questions)
        .await
        .map_err(ServiceError::storage("Failed to insert questions"))?;
    let choices = repositories::choices::insert_many(&mut *tx, &rows.choices)
        .await
        .map_err(ServiceError::storage("Failed to insert choices"))?;
    let students = repositories::students::insert_many(&mut *tx, &rows.students)
        .await
        .map_err(ServiceError::storage("Failed to insert students"))?;
    let student_answers = repositories::answers::insert_many(&mut *tx, &rows.answers)
        .await
        .map_err(ServiceError::storage("Failed to insert student answers"))?;
    let exam_logs = repositories::exam_logs::insert_many(&mut *tx, &rows.logs)
        .await
        .map_err(ServiceError::storage("Failed to insert exam logs"))?;

    tx.commit().await.map_err(ServiceError::storage("Failed to commit import"))?;

    Ok(ImportSummary {
        exam_id: exam.id.clone(),
        course_created,
        sections,
        questions,
        choices,
        students,
        student_answers,
        exam_logs,
    })
}

/// Checks the document and re-keys every row onto `exam_id`. Local ids are kept.
fn prepare(
    document: ExamSnapshot,
    professor_id: &str,
    exam_id: String,
    now: PrimitiveDateTime,
) -> Result<ImportRows, ServiceError> {
    document.validate().map_err(|err| ServiceError::validation(err.to_string()))?;

    if let Some(course_id) = document.course_id.as_deref() {
        if course_id != document.course.course_id {
            return Err(ServiceError::validation(format!(
                "course_id {course_id} does not match course {}",
                document.course.course_id
            )));
        }
    }

    let schedule = match document.status {
        ExamStatus::NotStarted => ExamSchedule::planned(
            document.start_date,
            document.start_time,
            document.end_time,
            document.min_submit_time,
        )?,
        ExamStatus::Ongoing | ExamStatus::Completed => ExamSchedule::recorded(
            document.start_date,
            document.start_time,
            document.end_time,
            document.min_submit_time,
        )?,
    };

    let mut sections = Vec::with_capacity(document.sections.len());
    let mut questions = Vec::new();
    let mut choices = Vec::new();
    let mut section_ids = HashSet::new();
    let mut question_keys = HashSet::new();

    for section in document.sections {
        if !section_ids.insert(section.section_id) {
            return Err(ServiceError::validation(format!(
                "duplicate section_id {}",
                section.section_id
            )));
        }

        for question in section.questions {
            let key = (section.section_id, question.question_id);
            if !question_keys.insert(key) {
                return Err(ServiceError::validation(format!(
                    "duplicate question_id {} in section {}",
                    question.question_id, section.section_id
                )));
            }

            let diagram = question
                .diagram
                .as_deref()
                .filter(|encoded| !encoded.is_empty())
                .map(|encoded| STANDARD.decode(encoded))
                .transpose()
                .map_err(|_| {
                    ServiceError::validation(format!(
                        "diagram of question {} in section {} is not valid base64",
                        question.question_id, section.section_id
                    ))
                })?;

            let mut choice_ids = HashSet::new();
            for choice in question.choices {
                if !choice_ids.insert(choice.choice_id) {
                    return Err(ServiceError::validation(format!(
                        "duplicate choice_id {} in question {} of section {}",
                        choice.choice_id, question.question_id, section.section_id
                    )));
                }
                choices.push(QuestionChoice {
                    exam_id: exam_id.clone(),
                    section_id: section.section_id,
                    question_id: question.question_id,
                    choice_id: choice.choice_id,
                    choice_text: choice.choice_text,
                    is_correct: choice.is_correct,
                });
            }

            questions.push(SectionQuestion {
                exam_id: exam_id.clone(),
                section_id: section.section_id,
                question_id: question.question_id,
                professor_id: professor_id.to_string(),
                question_text: question.question_text,
                diagram,
                weight: question.weight,
                difficulty: question.difficulty,
            });
        }

        sections.push(ExamSection {
            exam_id: exam_id.clone(),
            section_id: section.section_id,
            section_title: section.section_title,
            random_shuffle: section.random_shuffle,
        });
    }

    let mut student_ids = HashSet::new();
    let mut students = Vec::with_capacity(document.students.len());
    for student in document.students {
        if !student_ids.insert(student.id.clone()) {
            return Err(ServiceError::validation(format!("duplicate student id {}", student.id)));
        }
        students.push(Student {
            exam_id: exam_id.clone(),
            id: student.id,
            name: student.name,
            email: student.email,
            national_id: student.national_id,
            remaining_attempts: student.remaining_attempts,
            status: student.status,
        });
    }

    let mut answer_keys = HashSet::new();
    let mut answers = Vec::with_capacity(document.student_answers.len());
    for answer in document.student_answers {
        if !student_ids.contains(&answer.student_id) {
            return Err(ServiceError::validation(format!(
                "answer references unknown student {}",
                answer.student_id
            )));
        }
        if !question_keys.contains(&(answer.section_id, answer.question_id)) {
            return Err(ServiceError::validation(format!(
                "answer of student {} references unknown question {} in section {}",
                answer.student_id, answer.question_id, answer.section_id
            )));
        }
        if !answer_keys.insert((answer.student_id.clone(), answer.section_id, answer.question_id)) {
            return Err(ServiceError::validation(format!(
                "student {} answers question {} in section {} more than once",
                answer.student_id, answer.question_id, answer.section_id
            )));
        }
        answers.push(StudentAnswer {
            exam_id: exam_id.clone(),
            student_id: answer.student_id,
            section_id: answer.section_id,
            question_id: answer.question_id,
            student_choice: answer.student_choice,
            question_order: answer.question_order,
            section_order: answer.section_order,
        });
    }

    let logs = document
        .exam_log
        .into_iter()
        .map(|log| ExamLog {
            id: 0,
            exam_id: exam_id.clone(),
            student_id: log.student_id,
            ip_addr: log.ip_addr,
            user_agent: log.user_agent,
            action: log.action,
            section_id: log.section_id,
            question_id: log.question_id,
            time_stamp: log.time_stamp,
        })
        .collect();

    let course = Course {
        course_id: document.course.course_id,
        course_name: document.course.course_name,
    };

    let exam = Exam {
        id: exam_id,
        name: document.name,
        course_id: course.course_id.clone(),
        professor_id: professor_id.to_string(),
        start_date: schedule.start_date,
        start_time: schedule.start_time,
        end_time: schedule.end_time,
        min_submit_time: schedule.min_submit_time,
        max_attempts: document.max_attempts,
        exam_instructions: document.exam_instructions,
        exam_password: document.exam_password,
        status: document.status,
        created_at: now,
        updated_at: now,
    };

    Ok(ImportRows { course, exam, sections, questions, choices, students, answers, logs })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::{datetime, time};

    use super::*;
    use crate::services::snapshot::export::{assemble, tests::sample_rows};
    use crate::services::snapshot::export_exam;
    use crate::test_support;

    fn document() -> ExamSnapshot {
        assemble(sample_rows())
    }

    fn prepare_for(document: ExamSnapshot) -> Result<ImportRows, ServiceError> {
        prepare(document, "prof-9", "new-exam".to_string(), datetime!(2024-06-01 12:00))
    }

    fn expect_validation(result: Result<ImportRows, ServiceError>, needle: &str) {
        match result {
            Err(ServiceError::Validation(message)) => {
                assert!(message.contains(needle), "unexpected message: {message}")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn prepare_rekeys_rows_and_keeps_local_ids() {
        let rows = prepare_for(document()).expect("rows");

        assert_eq!(rows.exam.id, "new-exam");
        assert_eq!(rows.exam.professor_id, "prof-9");
        assert_eq!(rows.exam.status, ExamStatus::Completed);
        assert_eq!(rows.sections.len(), 2);
        assert_eq!(rows.questions.len(), 3);
        assert_eq!(rows.choices.len(), 6);
        assert_eq!(rows.students.len(), 2);
        assert_eq!(rows.answers.len(), 3);
        assert_eq!(rows.logs.len(), 2);

        assert!(rows.sections.iter().all(|row| row.exam_id == "new-exam"));
        assert!(rows.answers.iter().all(|row| row.exam_id == "new-exam"));
        assert!(rows.questions.iter().all(|row| row.professor_id == "prof-9"));

        let mut section_ids: Vec<_> = rows.sections.iter().map(|s| s.section_id).collect();
        section_ids.sort_unstable();
        assert_eq!(section_ids, vec![1, 2]);
    }

    #[test]
    fn prepare_decodes_diagrams() {
        let rows = prepare_for(document()).expect("rows");
        let with_diagram =
            rows.questions.iter().find(|q| q.section_id == 1 && q.question_id == 2).unwrap();

        assert_eq!(with_diagram.diagram.as_deref(), Some(&[0x89, b'P', b'N', b'G'][..]));
    }

    #[test]
    fn prepare_rejects_invalid_base64() {
        let mut snapshot = document();
        snapshot.sections[0].questions[0].diagram = Some("***".to_string());

        expect_validation(prepare_for(snapshot), "not valid base64");
    }

    #[test]
    fn prepare_rejects_duplicate_local_ids() {
        let mut snapshot = document();
        let copy = snapshot.sections[0].clone();
        snapshot.sections.push(copy);
        expect_validation(prepare_for(snapshot), "duplicate section_id 1");

        let mut snapshot = document();
        let copy = snapshot.sections[0].questions[0].choices[0].clone();
        snapshot.sections[0].questions[0].choices.push(copy);
        expect_validation(prepare_for(snapshot), "duplicate choice_id");

        let mut snapshot = document();
        let copy = snapshot.students[0].clone();
        snapshot.students.push(copy);
        expect_validation(prepare_for(snapshot), "duplicate student id s1");
    }

    #[test]
    fn prepare_rejects_dangling_answers() {
        let mut snapshot = document();
        snapshot.student_answers[0].student_id = "ghost".to_string();
        expect_validation(prepare_for(snapshot), "unknown student ghost");

        let mut snapshot = document();
        snapshot.student_answers[0].question_id = 99;
        expect_validation(prepare_for(snapshot), "unknown question 99");
    }

    #[test]
    fn prepare_keeps_out_of_scope_choice_on_answer() {
        let mut snapshot = document();
        snapshot.student_answers[0].student_choice = 42;

        let rows = prepare_for(snapshot).expect("rows");
        assert!(rows.answers.iter().any(|answer| answer.student_choice == 42));
    }

    #[test]
    fn prepare_checks_schedule_by_status() {
        let mut snapshot = document();
        snapshot.min_submit_time = snapshot.start_time;
        assert!(prepare_for(snapshot.clone()).is_ok());

        snapshot.status = ExamStatus::NotStarted;
        expect_validation(prepare_for(snapshot), "min_submit_time must be after start_time");
    }

    #[test]
    fn prepare_rejects_mismatched_course_reference() {
        let mut snapshot = document();
        snapshot.course_id = Some("OTHER".to_string());

        expect_validation(prepare_for(snapshot), "does not match course");
    }

    #[test]
    fn prepare_accepts_bare_document() {
        let snapshot: ExamSnapshot = serde_json::from_value(json!({
            "name": "Empty",
            "start_date": "2024-05-01",
            "start_time": "09:00",
            "end_time": "10:00",
            "min_submit_time": "09:30",
            "max_attempts": 2,
            "course": { "course_id": "C1", "course_name": "Course" }
        }))
        .unwrap();

        let rows = prepare_for(snapshot).expect("rows");
        assert!(rows.sections.is_empty());
        assert!(rows.students.is_empty());
        assert!(rows.logs.is_empty());
        assert_eq!(rows.exam.min_submit_time, time!(9:30));
    }

    #[tokio::test]
    async fn export_then_import_round_trips_under_new_id() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let owner = Actor::professor(test_support::unique_id("prof"));
        let exam = test_support::seed_full_exam(&pool, &owner.professor_id).await;

        let exported = export_exam(&pool, &owner, &exam.id).await.expect("export");
        let importer = Actor::professor(test_support::unique_id("prof"));
        let summary = import_exam(&pool, &importer, exported.clone()).await.expect("import");

        assert_ne!(summary.exam_id, exam.id);
        assert!(!summary.course_created);
        assert_eq!(summary.sections, 2);
        assert_eq!(summary.questions, 3);
        assert_eq!(summary.choices, 6);
        assert_eq!(summary.students, 5);

        let reexported =
            export_exam(&pool, &importer, &summary.exam_id).await.expect("export imported");
        assert_eq!(reexported.professor_id.as_deref(), Some(importer.professor_id.as_str()));
        assert_eq!(reexported.status, exported.status);

        let ids = |snapshot: &ExamSnapshot| {
            snapshot
                .sections
                .iter()
                .flat_map(|s| {
                    s.questions.iter().flat_map(move |q| {
                        q.choices.iter().map(move |c| (s.section_id, q.question_id, c.choice_id))
                    })
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&reexported), ids(&exported));
        let students = |snapshot: &ExamSnapshot| {
            snapshot.students.iter().map(|s| s.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(students(&reexported), students(&exported));
        assert_eq!(reexported.student_answers.len(), exported.student_answers.len());
        assert_eq!(reexported.exam_log.len(), exported.exam_log.len());

        let courses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE course_id = $1")
            .bind(&exported.course.course_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(courses, 1);
    }

    #[tokio::test]
    async fn import_without_students_or_logs_succeeds() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let importer = Actor::professor(test_support::unique_id("prof"));
        let course_id = test_support::unique_id("course");
        let snapshot: ExamSnapshot = serde_json::from_value(json!({
            "name": "Quiz",
            "start_date": "2024-05-01",
            "start_time": "09:00:00",
            "end_time": "10:00:00",
            "min_submit_time": "09:30:00",
            "max_attempts": 1,
            "course": { "course_id": course_id, "course_name": "Fresh course" },
            "sections": [{
                "section_id": 1,
                "section_title": "Only",
                "questions": [{
                    "question_id": 1,
                    "question_text": "2 + 2?",
                    "weight": 1.0,
                    "choices": [
                        { "choice_id": 1, "choice_text": "4", "is_correct": true },
                        { "choice_id": 2, "choice_text": "5" }
                    ]
                }]
            }]
        }))
        .unwrap();

        let summary = import_exam(&pool, &importer, snapshot).await.expect("import");

        assert!(summary.course_created);
        assert_eq!(summary.students, 0);
        assert_eq!(summary.student_answers, 0);
        assert_eq!(summary.exam_logs, 0);
        assert_eq!(summary.choices, 2);
    }

    #[tokio::test]
    async fn failed_import_leaves_nothing_behind() {
        let Some(pool) = test_support::test_pool().await else {
            return;
        };
        let importer = Actor::professor(test_support::unique_id("prof"));
        let mut snapshot = document();
        let name = test_support::unique_id("doomed");
        snapshot.name = name.clone();
        snapshot.course.course_id = test_support::unique_id("course");
        snapshot.course_id = None;
        // Postgres refuses NUL in text, so the last batch fails.
        snapshot.exam_log[0].action = "bad\u{0}action".to_string();

        let err = import_exam(&pool, &importer, snapshot.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage { .. }));

        let exams: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exams WHERE name = $1")
            .bind(&name)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(exams, 0);

        let course = repositories::courses::find_by_id(&pool, &snapshot.course.course_id)
            .await
            .unwrap();
        assert!(course.is_none());
    }
}
