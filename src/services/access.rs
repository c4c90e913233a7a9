use crate::services::errors::ServiceError;

/// The authenticated caller of an exam operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Actor {
    pub(crate) professor_id: String,
    pub(crate) is_admin: bool,
}

impl Actor {
    #[cfg(test)]
    pub(crate) fn professor(professor_id: impl Into<String>) -> Self {
        Self { professor_id: professor_id.into(), is_admin: false }
    }

    #[cfg(test)]
    pub(crate) fn admin(professor_id: impl Into<String>) -> Self {
        Self { professor_id: professor_id.into(), is_admin: true }
    }

    /// Owners and admins may act on an exam; everyone else is refused.
    pub(crate) fn authorize(&self, owner_id: &str) -> Result<(), ServiceError> {
        if self.is_admin || self.professor_id == owner_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Not allowed to manage this exam"))
        }
    }
}
