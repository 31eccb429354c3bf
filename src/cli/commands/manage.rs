//! Manager actions on submitted checklists: override, review, reopen.

use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{confirm, info, success};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let logic = ChecklistLogic::from_config(cfg)?;
    if !logic.operator().role.is_manager() {
        let op = match cmd {
            Commands::Override { .. } => "override",
            Commands::Review { .. } => "review",
            _ => "reopen",
        };
        return Err(AppError::Forbidden(op.to_string()));
    }

    match cmd {
        Commands::Override { submission, task } => {
            let mut session = logic.open_for_submission(submission).await?;
            session.override_flag(submission, task).await?;
            session.flush().await;

            success(format!("Flag on task '{}' overridden.", task));
            logic.record("override", submission, &format!("task {}", task));
        }

        Commands::Review {
            submission,
            approve,
            ..
        } => {
            let mut session = logic.open_for_submission(submission).await?;
            let status = session.review(submission, *approve).await?;
            session.flush().await;

            success(format!("Submission {} is now {}.", submission, status.to_db_str()));
            logic.record("review", submission, status.to_db_str());
        }

        Commands::Reopen { submission, yes } => {
            let mut session = logic.open_for_submission(submission).await?;
            if !*yes
                && !confirm(format!(
                    "Reopen '{}'? The submitted checklist {} will be deleted.",
                    session.template().name,
                    submission
                ))
            {
                info("Operation cancelled.");
                return Ok(());
            }

            session.reset_submission(submission).await?;
            session.flush().await;

            success(format!(
                "'{}' reopened: it can be filled in again.",
                session.template().name
            ));
            logic.record("reopen", submission, "submission deleted");
        }

        _ => {}
    }

    Ok(())
}
