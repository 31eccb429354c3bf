use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::utils::path::expand_tilde;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Photo {
        template,
        task,
        file,
    } = cmd
    {
        let logic = ChecklistLogic::from_config(cfg)?;
        let uploader = ChecklistLogic::uploader(cfg, &expand_tilde(file));
        let mut session = logic.open(template).await?;

        let outcome = match session.add_photo(&uploader, task).await {
            Ok(outcome) => outcome,
            Err(AppError::Capture(e)) if e.is_retryable() => {
                warning("Could not take the photo. Check the file and try again.");
                return Err(AppError::Capture(e));
            }
            Err(e) => return Err(e),
        };
        session.flush().await;

        if outcome.uploaded {
            success(format!("Photo stored for task '{}'.", task));
        } else {
            warning("Photo storage unavailable: the photo is kept inside the checklist.");
        }

        if let Some(tv) = session.view().tasks.iter().find(|t| t.task.id == *task) {
            let count = tv.result.as_ref().map(|r| r.photo_count()).unwrap_or(0);
            let done = tv.result.as_ref().is_some_and(|r| r.completed);
            info(format!(
                "Photos: {}/{}{}",
                count,
                tv.task.required_photos,
                if done { " (task done)" } else { "" }
            ));
        }

        logic.record(
            "photo",
            &format!("{}/{}", session.template().id, task),
            if outcome.uploaded { "stored" } else { "inline" },
        );
    }

    Ok(())
}
