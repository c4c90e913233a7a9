use std::sync::Arc;

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::core::config::Settings;
use crate::core::time::local_now;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool) -> Self {
        Self { inner: Arc::new(InnerState { settings, db }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Current wall-clock time in the exam offset.
    pub(crate) fn exam_now(&self) -> PrimitiveDateTime {
        local_now(self.inner.settings.exam().utc_offset)
    }
}
