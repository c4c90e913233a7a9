use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};
use validator::Validate;

use crate::db::types::{DifficultyLevel, ExamStatus, StudentStatus};
use crate::schemas::clock;

/// Portable exam document: everything needed to rebuild an exam elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct ExamSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(with = "clock::date")]
    pub(crate) start_date: Date,
    #[serde(with = "clock::time_of_day")]
    pub(crate) start_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) end_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) min_submit_time: Time,
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default)]
    pub(crate) exam_instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) professor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) exam_password: String,
    #[serde(default = "default_exam_status")]
    pub(crate) status: ExamStatus,
    #[validate(nested)]
    pub(crate) course: CourseSnapshot,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) sections: Vec<SectionSnapshot>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) students: Vec<StudentSnapshot>,
    #[serde(default)]
    pub(crate) student_answers: Vec<AnswerSnapshot>,
    #[serde(default)]
    pub(crate) exam_log: Vec<LogSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct CourseSnapshot {
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[validate(length(min = 1, message = "course_name must not be empty"))]
    pub(crate) course_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct SectionSnapshot {
    pub(crate) section_id: i32,
    pub(crate) section_title: String,
    #[serde(default)]
    pub(crate) random_shuffle: bool,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct QuestionSnapshot {
    pub(crate) question_id: i32,
    pub(crate) question_text: String,
    /// Standard base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) diagram: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "weight must be positive"))]
    pub(crate) weight: f64,
    #[serde(default)]
    pub(crate) difficulty: DifficultyLevel,
    #[serde(default)]
    pub(crate) choices: Vec<ChoiceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChoiceSnapshot {
    pub(crate) choice_id: i32,
    pub(crate) choice_text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct StudentSnapshot {
    #[validate(length(min = 1, message = "student id must not be empty"))]
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) national_id: Option<String>,
    #[serde(default)]
    pub(crate) remaining_attempts: i32,
    #[serde(default = "default_student_status")]
    pub(crate) status: StudentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AnswerSnapshot {
    pub(crate) student_id: String,
    pub(crate) section_id: i32,
    pub(crate) question_id: i32,
    #[serde(alias = "chosen_choice_id")]
    pub(crate) student_choice: i32,
    #[serde(default)]
    pub(crate) question_order: i32,
    #[serde(default)]
    pub(crate) section_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LogSnapshot {
    pub(crate) student_id: String,
    #[serde(default)]
    pub(crate) ip_addr: String,
    #[serde(default)]
    pub(crate) user_agent: String,
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) section_id: Option<i32>,
    #[serde(default)]
    pub(crate) question_id: Option<i32>,
    #[serde(with = "clock::timestamp")]
    pub(crate) time_stamp: PrimitiveDateTime,
}

fn default_exam_status() -> ExamStatus {
    ExamStatus::NotStarted
}

fn default_student_status() -> StudentStatus {
    StudentStatus::NotStarted
}
