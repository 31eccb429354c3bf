use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::errors::AppResult;
use crate::ui::messages::success;

/// Handle `toggle`, `value` and `comment`.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let logic = ChecklistLogic::from_config(cfg)?;

    let (operation, target, message) = match cmd {
        Commands::Toggle { template, task, off } => {
            let mut session = logic.open(template).await?;
            session.toggle_task(task, !*off)?;
            session.flush().await;

            let state = if *off { "not done" } else { "done" };
            success(format!("Task '{}' marked as {}.", task, state));
            ("toggle", target_of(&session.template().id, task), state.to_string())
        }

        Commands::Value {
            template,
            task,
            value,
        } => {
            let mut session = logic.open(template).await?;
            session.set_value(task, value)?;
            session.flush().await;

            if value.trim().is_empty() {
                success(format!("Value of task '{}' cleared.", task));
            } else {
                success(format!("Value of task '{}' set to '{}'.", task, value.trim()));
            }
            ("value", target_of(&session.template().id, task), value.trim().to_string())
        }

        Commands::Comment {
            template,
            task,
            text,
        } => {
            let mut session = logic.open(template).await?;
            session.set_comment(task, text)?;
            session.flush().await;

            success(format!("Comment of task '{}' saved.", task));
            ("comment", target_of(&session.template().id, task), text.trim().to_string())
        }

        _ => return Ok(()),
    };

    logic.record(operation, &target, &message);
    Ok(())
}

fn target_of(template_id: &str, task_id: &str) -> String {
    format!("{}/{}", template_id, task_id)
}
