use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Exam phase. Moves forward only; see `services::lifecycle` for the legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "examstatus", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ExamStatus {
    NotStarted,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "studentstatus", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum StudentStatus {
    NotStarted,
    Active,
    Disconnected,
    SubmittedByHimself,
    SubmittedByProfessor,
}

impl StudentStatus {
    pub(crate) fn is_submitted(self) -> bool {
        matches!(self, Self::SubmittedByHimself | Self::SubmittedByProfessor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficultylevel", rename_all = "lowercase")]
pub(crate) enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_status_wire_names() {
        assert_eq!(serde_json::to_value(ExamStatus::NotStarted).unwrap(), "NOT_STARTED");
        assert_eq!(
            serde_json::from_value::<ExamStatus>(serde_json::json!("ONGOING")).unwrap(),
            ExamStatus::Ongoing
        );
        assert_eq!(serde_json::to_value(ExamStatus::Completed).unwrap(), "COMPLETED");
    }

    #[test]
    fn student_status_submitted_variants() {
        assert!(StudentStatus::SubmittedByHimself.is_submitted());
        assert!(StudentStatus::SubmittedByProfessor.is_submitted());
        assert!(!StudentStatus::Active.is_submitted());
        assert_eq!(
            serde_json::to_value(StudentStatus::SubmittedByProfessor).unwrap(),
            "SUBMITTED_BY_PROFESSOR"
        );
    }

    #[test]
    fn difficulty_is_lowercase() {
        assert_eq!(serde_json::to_value(DifficultyLevel::Hard).unwrap(), "hard");
        assert_eq!(DifficultyLevel::default(), DifficultyLevel::Medium);
    }
}
