pub(crate) mod answers;
pub(crate) mod batch;
pub(crate) mod choices;
pub(crate) mod courses;
pub(crate) mod exam_logs;
pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod sections;
pub(crate) mod students;
