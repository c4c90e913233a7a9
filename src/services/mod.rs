pub(crate) mod access;
pub(crate) mod errors;
pub(crate) mod grading;
pub(crate) mod lifecycle;
pub(crate) mod schedule;
pub(crate) mod snapshot;
