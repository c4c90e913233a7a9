use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sqlx::PgPool;

use crate::db::models::{
    Course, Exam, ExamLog, ExamSection, QuestionChoice, SectionQuestion, Student, StudentAnswer,
};
use crate::repositories;
use crate::schemas::snapshot::{
    AnswerSnapshot, ChoiceSnapshot, CourseSnapshot, ExamSnapshot, LogSnapshot, QuestionSnapshot,
    SectionSnapshot, StudentSnapshot,
};
use crate::services::access::Actor;
use crate::services::errors::ServiceError;

/// Every row that makes up one exam.
#[derive(Debug, Clone)]
pub(crate) struct ExamRows {
    pub(crate) exam: Exam,
    pub(crate) course: Course,
    pub(crate) sections: Vec<ExamSection>,
    pub(crate) questions: Vec<SectionQuestion>,
    pub(crate) choices: Vec<QuestionChoice>,
    pub(crate) students: Vec<Student>,
    pub(crate) answers: Vec<StudentAnswer>,
    pub(crate) logs: Vec<ExamLog>,
}

/// Reads the exam and its children; a plain read with no snapshot isolation.
pub(crate) async fn export_exam(
    pool: &PgPool,
    actor: &Actor,
    exam_id: &str,
) -> Result<ExamSnapshot, ServiceError> {
    let exam = repositories::exams::find_by_id(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam"))?
        .ok_or(ServiceError::NotFound("Exam"))?;
    actor.authorize(&exam.professor_id)?;

    let course = repositories::courses::find_by_id(pool, &exam.course_id)
        .await
        .map_err(ServiceError::storage("Failed to load course"))?
        .ok_or(ServiceError::NotFound("Course"))?;
    let sections = repositories::sections::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load sections"))?;
    let questions = repositories::questions::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load questions"))?;
    let choices = repositories::choices::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load choices"))?;
    let students = repositories::students::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load students"))?;
    let answers = repositories::answers::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load answers"))?;
    let logs = repositories::exam_logs::list_by_exam(pool, exam_id)
        .await
        .map_err(ServiceError::storage("Failed to load exam logs"))?;

    let snapshot =
        assemble(ExamRows { exam, course, sections, questions, choices, students, answers, logs });

    tracing::info!(
        professor_id = %actor.professor_id,
        exam_id = %exam_id,
        sections = snapshot.sections.len(),
        students = snapshot.students.len(),
        action = "exam_export",
        "Exam exported"
    );

    Ok(snapshot)
}

/// Nests the flat rows into a document. Ordering is by local id at every
/// level regardless of the order rows arrive in.
pub(super) fn assemble(rows: ExamRows) -> ExamSnapshot {
    let ExamRows { exam, course, sections, questions, choices, students, answers, logs } = rows;

    let mut choices_by_question: BTreeMap<(i32, i32), Vec<ChoiceSnapshot>> = BTreeMap::new();
    for choice in choices {
        choices_by_question.entry((choice.section_id, choice.question_id)).or_default().push(
            ChoiceSnapshot {
                choice_id: choice.choice_id,
                choice_text: choice.choice_text,
                is_correct: choice.is_correct,
            },
        );
    }

    let mut questions_by_section: BTreeMap<i32, Vec<QuestionSnapshot>> = BTreeMap::new();
    for question in questions {
        let mut choices = choices_by_question
            .remove(&(question.section_id, question.question_id))
            .unwrap_or_default();
        choices.sort_by_key(|choice| choice.choice_id);

        questions_by_section.entry(question.section_id).or_default().push(QuestionSnapshot {
            question_id: question.question_id,
            question_text: question.question_text,
            diagram: question.diagram.map(|bytes| STANDARD.encode(bytes)),
            weight: question.weight,
            difficulty: question.difficulty,
            choices,
        });
    }

    let mut sections: Vec<SectionSnapshot> = sections
        .into_iter()
        .map(|section| {
            let mut questions =
                questions_by_section.remove(&section.section_id).unwrap_or_default();
            questions.sort_by_key(|question| question.question_id);
            SectionSnapshot {
                section_id: section.section_id,
                section_title: section.section_title,
                random_shuffle: section.random_shuffle,
                questions,
            }
        })
        .collect();
    sections.sort_by_key(|section| section.section_id);

    let mut students: Vec<StudentSnapshot> = students
        .into_iter()
        .map(|student| StudentSnapshot {
            id: student.id,
            name: student.name,
            email: student.email,
            national_id: student.national_id,
            remaining_attempts: student.remaining_attempts,
            status: student.status,
        })
        .collect();
    students.sort_by(|a, b| a.id.cmp(&b.id));

    let mut student_answers: Vec<AnswerSnapshot> = answers
        .into_iter()
        .map(|answer| AnswerSnapshot {
            student_id: answer.student_id,
            section_id: answer.section_id,
            question_id: answer.question_id,
            student_choice: answer.student_choice,
            question_order: answer.question_order,
            section_order: answer.section_order,
        })
        .collect();
    student_answers.sort_by(|a, b| {
        (&a.student_id, a.section_id, a.question_id).cmp(&(
            &b.student_id,
            b.section_id,
            b.question_id,
        ))
    });

    let mut logs = logs;
    logs.sort_by_key(|log| (log.time_stamp, log.id));
    let exam_log = logs
        .into_iter()
        .map(|log| LogSnapshot {
            student_id: log.student_id,
            ip_addr: log.ip_addr,
            user_agent: log.user_agent,
            action: log.action,
            section_id: log.section_id,
            question_id: log.question_id,
            time_stamp: log.time_stamp,
        })
        .collect();

    ExamSnapshot {
        id: Some(exam.id),
        name: exam.name,
        start_date: exam.start_date,
        start_time: exam.start_time,
        end_time: exam.end_time,
        min_submit_time: exam.min_submit_time,
        max_attempts: exam.max_attempts,
        exam_instructions: exam.exam_instructions,
        professor_id: Some(exam.professor_id),
        course_id: Some(exam.course_id),
        exam_password: exam.exam_password,
        status: exam.status,
        course: CourseSnapshot { course_id: course.course_id, course_name: course.course_name },
        sections,
        students,
        student_answers,
        exam_log,
    }
}
