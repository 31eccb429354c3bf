use serde::{Deserialize, Serialize};

/// Who is operating the checklist. Managers may review, override and reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Staff,
    Manager,
}

impl Role {
    pub fn code(&self) -> &str {
        match self {
            Role::Staff => "staff",
            Role::Manager => "manager",
        }
    }

    /// Helper: convert input code from CLI (lowercase or uppercase)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "staff" | "s" => Some(Role::Staff),
            "manager" | "m" => Some(Role::Manager),
            _ => None,
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Manager)
    }
}
