mod lifecycle;
mod reports;
mod snapshot;

pub(super) use lifecycle::{
    create_exam, delete_exam, end_exam, exam_status, get_exam, list_exams, start_exam, update_exam,
};
pub(super) use reports::{exam_grades, exam_logs, exam_stats, student_answers, students_answers};
pub(super) use snapshot::{export_exam, import_exam};
