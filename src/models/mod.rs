pub mod checklist_type;
pub mod role;
pub mod status;
pub mod submission;
pub mod task_result;
pub mod template;
