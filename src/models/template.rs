use super::checklist_type::ChecklistType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub required_photos: u32,
    #[serde(default)]
    pub requires_value: bool,
    #[serde(default)]
    pub critical: bool,
}

impl TaskDefinition {
    pub fn needs_photos(&self) -> bool {
        self.required_photos > 0
    }
}

/// A checklist as designed by a manager. Read-only from the engine's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub id: String,
    /// Empty in an import file: filled in with the operator's store.
    #[serde(default)]
    pub store_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChecklistType,
    /// Hour of day (0-23) at which a new logical day starts for this checklist.
    #[serde(default)]
    pub unlock_hour: u32,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

impl ChecklistTemplate {
    pub fn task(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.id.as_str())
    }
}
