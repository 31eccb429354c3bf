use crate::cli::parser::{Commands, TemplateAction};
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::core::template::TemplateLogic;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::path::expand_tilde;
use crate::utils::table::{Column, Table};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Template { action } = cmd else {
        return Ok(());
    };
    let logic = ChecklistLogic::from_config(cfg)?;
    let store = logic.store();

    match action {
        TemplateAction::Import { file } => {
            let path = expand_tilde(file);
            let imported = TemplateLogic::import(store.as_ref(), &cfg.store_id, &path).await?;

            for t in &imported {
                success(format!(
                    "Imported '{}' ({}, {} tasks)",
                    t.name,
                    t.kind.to_db_str(),
                    t.tasks.len()
                ));
            }
            logic.record(
                "template_import",
                file,
                &format!("{} template(s) for store {}", imported.len(), cfg.store_id),
            );
        }

        TemplateAction::List => {
            let templates = TemplateLogic::list(store.as_ref(), &cfg.store_id).await?;
            if templates.is_empty() {
                info(format!(
                    "No templates for store '{}'. Use `template import FILE`.",
                    cfg.store_id
                ));
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::new("ID", 8),
                Column::new("Name", 20),
                Column::new("Type", 8),
                Column::new("Unlock", 6),
                Column::new("Tasks", 5),
            ]);
            for t in &templates {
                table.add_row(vec![
                    t.id.clone(),
                    t.name.clone(),
                    t.kind.to_db_str().to_string(),
                    format!("{:02}:00", t.unlock_hour),
                    t.tasks.len().to_string(),
                ]);
            }
            println!("📋 Templates of store '{}':\n", cfg.store_id);
            print!("{}", table.render());
        }
    }

    Ok(())
}
