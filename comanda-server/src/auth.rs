//! Authorization seam
//!
//! User lookup lives in an external collaborator; the engine only receives
//! `(user_id, role_id)` pairs. [`Actor`] is the validated form passed into
//! every gated operation, so the engine never re-queries the auth system
//! and every role gate is checked before the first write.

use async_trait::async_trait;
use shared::models::Role;
use shared::{CoreError, CoreResult};

/// External auth collaborator
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Currently logged-in user at the calling terminal
    async fn current_user(&self) -> CoreResult<(String, i64)>;
}

/// A staff member acting on the system, with their role already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Build an actor from the auth collaborator's raw answer
    pub fn from_auth(user_id: String, role_id: i64) -> CoreResult<Self> {
        let role = Role::from_id(role_id)
            .ok_or_else(|| CoreError::validation(format!("Unknown role id: {}", role_id)))?;
        Ok(Self { user_id, role })
    }

    /// Gate for approving/rejecting cancellation requests
    pub fn require_can_resolve_cancellations(&self) -> CoreResult<()> {
        if !self.role.can_resolve_cancellations() {
            return Err(CoreError::validation(format!(
                "Role {:?} cannot resolve cancellation requests",
                self.role
            )));
        }
        Ok(())
    }

    /// Gate for filing cancellation requests
    pub fn require_can_request_cancellations(&self) -> CoreResult<()> {
        if !self.role.can_request_cancellations() {
            return Err(CoreError::validation(format!(
                "Role {:?} cannot request cancellations",
                self.role
            )));
        }
        Ok(())
    }
}
