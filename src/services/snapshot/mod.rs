//! Portable exam snapshots: export an exam with all of its children, and
//! rebuild one under a new owner.

mod export;
mod import;

pub(crate) use export::export_exam;
pub(crate) use import::{import_exam, ImportSummary};
