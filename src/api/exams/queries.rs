use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct ExamLogsQuery {
    #[serde(default)]
    pub(super) limit: Option<i64>,
}
