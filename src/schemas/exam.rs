use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};
use validator::Validate;

use crate::db::models::{Exam, ExamLog, ExamSummary};
use crate::db::types::ExamStatus;
use crate::schemas::clock;
use crate::services::lifecycle::{ExamDetails, NewExam};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[serde(with = "clock::date")]
    pub(crate) start_date: Date,
    #[serde(with = "clock::time_of_day")]
    pub(crate) start_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) end_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) min_submit_time: Time,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default)]
    pub(crate) exam_instructions: String,
    #[serde(default)]
    pub(crate) exam_password: String,
}

fn default_max_attempts() -> i32 {
    1
}

impl From<ExamCreate> for NewExam {
    fn from(payload: ExamCreate) -> Self {
        Self {
            details: ExamDetails {
                name: payload.name,
                course_id: payload.course_id,
                start_date: payload.start_date,
                start_time: payload.start_time,
                end_time: payload.end_time,
                min_submit_time: payload.min_submit_time,
                max_attempts: payload.max_attempts,
                exam_instructions: payload.exam_instructions,
            },
            exam_password: payload.exam_password,
        }
    }
}

/// Full replacement of an upcoming exam's metadata. The password is not editable.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub(crate) course_id: String,
    #[serde(with = "clock::date")]
    pub(crate) start_date: Date,
    #[serde(with = "clock::time_of_day")]
    pub(crate) start_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) end_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) min_submit_time: Time,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default)]
    pub(crate) exam_instructions: String,
}

impl From<ExamUpdate> for ExamDetails {
    fn from(payload: ExamUpdate) -> Self {
        Self {
            name: payload.name,
            course_id: payload.course_id,
            start_date: payload.start_date,
            start_time: payload.start_time,
            end_time: payload.end_time,
            min_submit_time: payload.min_submit_time,
            max_attempts: payload.max_attempts,
            exam_instructions: payload.exam_instructions,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) course_id: String,
    pub(crate) professor_id: String,
    #[serde(with = "clock::date")]
    pub(crate) start_date: Date,
    #[serde(with = "clock::time_of_day")]
    pub(crate) start_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) end_time: Time,
    #[serde(with = "clock::time_of_day")]
    pub(crate) min_submit_time: Time,
    pub(crate) max_attempts: i32,
    pub(crate) exam_instructions: String,
    pub(crate) status: ExamStatus,
    #[serde(with = "clock::timestamp")]
    pub(crate) created_at: PrimitiveDateTime,
    #[serde(with = "clock::timestamp")]
    pub(crate) updated_at: PrimitiveDateTime,
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            name: exam.name,
            course_id: exam.course_id,
            professor_id: exam.professor_id,
            start_date: exam.start_date,
            start_time: exam.start_time,
            end_time: exam.end_time,
            min_submit_time: exam.min_submit_time,
            max_attempts: exam.max_attempts,
            exam_instructions: exam.exam_instructions,
            status: exam.status,
            created_at: exam.created_at,
            updated_at: exam.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummaryResponse {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) questions_count: i32,
    pub(crate) total_weight: f64,
}

impl From<ExamSummary> for ExamSummaryResponse {
    fn from(summary: ExamSummary) -> Self {
        Self {
            exam: summary.exam.into(),
            questions_count: summary.questions_count,
            total_weight: summary.total_weight,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamStatusResponse {
    pub(crate) exam_id: String,
    pub(crate) status: ExamStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamLogResponse {
    pub(crate) id: i64,
    pub(crate) student_id: String,
    pub(crate) ip_addr: String,
    pub(crate) user_agent: String,
    pub(crate) action: String,
    pub(crate) section_id: Option<i32>,
    pub(crate) question_id: Option<i32>,
    #[serde(with = "clock::timestamp")]
    pub(crate) time_stamp: PrimitiveDateTime,
}

impl From<ExamLog> for ExamLogResponse {
    fn from(log: ExamLog) -> Self {
        Self {
            id: log.id,
            student_id: log.student_id,
            ip_addr: log.ip_addr,
            user_agent: log.user_agent,
            action: log.action,
            section_id: log.section_id,
            question_id: log.question_id,
            time_stamp: log.time_stamp,
        }
    }
}
