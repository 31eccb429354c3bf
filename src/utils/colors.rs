/// ANSI color helper utilities for terminal output.
use crate::models::status::SubmissionStatus;
use crate::models::task_result::AuditState;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

/// DRAFT → cyan, PENDING → yellow, APPROVED → green, REJECTED → red
pub fn color_for_status(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::Draft => CYAN,
        SubmissionStatus::Pending => YELLOW,
        SubmissionStatus::Approved => GREEN,
        SubmissionStatus::Rejected => RED,
    }
}

pub fn color_for_audit(audit: &AuditState) -> &'static str {
    match audit {
        AuditState::Unaudited => GREY,
        AuditState::AuditPending => BLUE,
        AuditState::Flagged { .. } => RED,
        AuditState::Clear { .. } => GREEN,
        AuditState::Overridden { .. } => MAGENTA,
    }
}

pub fn paint(color: &str, value: &str) -> String {
    format!("{color}{value}{RESET}")
}

/// Grey out empty placeholders ("" or "-").
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "-" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}
