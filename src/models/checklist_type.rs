use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChecklistType {
    Opening,
    Closing,
    Weekly,
    Monthly,
    ShiftChange,
}

impl ChecklistType {
    /// Convert enum → DB / wire string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ChecklistType::Opening => "OPENING",
            ChecklistType::Closing => "CLOSING",
            ChecklistType::Weekly => "WEEKLY",
            ChecklistType::Monthly => "MONTHLY",
            ChecklistType::ShiftChange => "SHIFT_CHANGE",
        }
    }

    /// Convert DB / CLI string → enum (case-insensitive, '-' accepted for '_')
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "OPENING" => Some(ChecklistType::Opening),
            "CLOSING" => Some(ChecklistType::Closing),
            "WEEKLY" => Some(ChecklistType::Weekly),
            "MONTHLY" => Some(ChecklistType::Monthly),
            "SHIFT_CHANGE" => Some(ChecklistType::ShiftChange),
            _ => None,
        }
    }

    pub fn is_weekly(&self) -> bool {
        matches!(self, ChecklistType::Weekly)
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, ChecklistType::Closing)
    }
}
