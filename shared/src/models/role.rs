//! Staff roles
//!
//! Role lookup itself is an external collaborator; the engine only receives
//! the numeric role id and gates actions on it.

use serde::{Deserialize, Serialize};

/// Staff role, identified by a stable numeric id in the auth system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Cashier,
    Waiter,
    Bar,
    Kitchen,
    Operations,
}

impl Role {
    /// Map the auth system's role id to a role
    pub fn from_id(id: i64) -> Option<Role> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Cashier),
            3 => Some(Role::Waiter),
            4 => Some(Role::Bar),
            5 => Some(Role::Kitchen),
            6 => Some(Role::Operations),
            _ => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Role::Admin => 1,
            Role::Cashier => 2,
            Role::Waiter => 3,
            Role::Bar => 4,
            Role::Kitchen => 5,
            Role::Operations => 6,
        }
    }

    /// Approval/rejection of cancellation requests
    pub fn can_resolve_cancellations(&self) -> bool {
        matches!(self, Role::Admin | Role::Operations)
    }

    /// Filing cancellation requests
    pub fn can_request_cancellations(&self) -> bool {
        matches!(self, Role::Admin | Role::Waiter | Role::Operations)
    }
}
