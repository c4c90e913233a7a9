use sqlx::FromRow;
use time::{Date, PrimitiveDateTime, Time};

use crate::db::types::{DifficultyLevel, ExamStatus, StudentStatus};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Course {
    pub(crate) course_id: String,
    pub(crate) course_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) course_id: String,
    pub(crate) professor_id: String,
    pub(crate) start_date: Date,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) min_submit_time: Time,
    pub(crate) max_attempts: i32,
    pub(crate) exam_instructions: String,
    pub(crate) exam_password: String,
    pub(crate) status: ExamStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Exam row plus the aggregates shown in exam listings.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamSummary {
    #[sqlx(flatten)]
    pub(crate) exam: Exam,
    pub(crate) questions_count: i32,
    pub(crate) total_weight: f64,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamSection {
    pub(crate) exam_id: String,
    pub(crate) section_id: i32,
    pub(crate) section_title: String,
    pub(crate) random_shuffle: bool,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SectionQuestion {
    pub(crate) exam_id: String,
    pub(crate) section_id: i32,
    pub(crate) question_id: i32,
    pub(crate) professor_id: String,
    pub(crate) question_text: String,
    pub(crate) diagram: Option<Vec<u8>>,
    pub(crate) weight: f64,
    pub(crate) difficulty: DifficultyLevel,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuestionChoice {
    pub(crate) exam_id: String,
    pub(crate) section_id: i32,
    pub(crate) question_id: i32,
    pub(crate) choice_id: i32,
    pub(crate) choice_text: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Student {
    pub(crate) exam_id: String,
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: Option<String>,
    pub(crate) national_id: Option<String>,
    pub(crate) remaining_attempts: i32,
    pub(crate) status: StudentStatus,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudentAnswer {
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) section_id: i32,
    pub(crate) question_id: i32,
    pub(crate) student_choice: i32,
    pub(crate) question_order: i32,
    pub(crate) section_order: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamLog {
    pub(crate) id: i64,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) ip_addr: String,
    pub(crate) user_agent: String,
    pub(crate) action: String,
    pub(crate) section_id: Option<i32>,
    pub(crate) question_id: Option<i32>,
    pub(crate) time_stamp: PrimitiveDateTime,
}
