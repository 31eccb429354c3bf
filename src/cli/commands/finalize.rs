use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::core::finalize::{FinalizeCheck, check};
use crate::errors::{AppError, AppResult};
use crate::models::task_result::TaskResult;
use crate::ui::messages::{confirm, info, success, warning};
use crate::utils::date::format_optional_instant;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Finalize { template, yes } = cmd else {
        return Ok(());
    };

    let logic = ChecklistLogic::from_config(cfg)?;
    let mut session = logic.open(template).await?;

    //
    // 1️⃣ Something to submit?
    //
    if session.is_read_only() {
        return Err(AppError::ReadOnly(format_optional_instant(
            session.view().locked_until,
        )));
    }
    if session.current().is_none() {
        return Err(AppError::NothingToFinalize);
    }

    //
    // 2️⃣ Validation (missing photos block, incomplete tasks ask)
    //
    let results: Vec<TaskResult> = session.responses().values().cloned().collect();
    let confirmed = match check(session.template(), &results) {
        FinalizeCheck::Blocked { missing } => {
            return Err(AppError::FinalizeBlocked { missing });
        }
        FinalizeCheck::NeedsConfirmation { incomplete } if !*yes => {
            let prompt = format!(
                "Some tasks are incomplete: {}. Submit anyway?",
                incomplete.join(", ")
            );
            if !confirm(prompt) {
                info("Operation cancelled.");
                return Ok(());
            }
            true
        }
        _ => *yes,
    };

    //
    // 3️⃣ Audit + submit
    //
    let coordinator = ChecklistLogic::coordinator(cfg);
    let report = session.finalize(&coordinator, confirmed).await?;
    session.flush().await;

    let view = session.view();
    success(format!(
        "'{}' submitted for review (locked until {}).",
        view.template_name,
        format_optional_instant(view.locked_until)
    ));
    for task in &report.flagged {
        warning(format!("Photo of task '{}' was flagged for review.", task));
    }
    if !report.auditor_unavailable.is_empty() {
        warning(format!(
            "Photo check unavailable for: {}",
            report.auditor_unavailable.join(", ")
        ));
    }

    let sub_id = view.submission_id.unwrap_or_default();
    logic.record(
        "finalize",
        &sub_id,
        &format!(
            "{} audited, {} flagged",
            report.audited.len(),
            report.flagged.len()
        ),
    );
    Ok(())
}
