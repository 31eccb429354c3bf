use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::core::session::SessionView;
use crate::errors::AppResult;
use crate::models::task_result::AuditState;
use crate::ui::messages::{header, warning};
use crate::utils::colors::{GREY, color_for_audit, color_for_status, colorize_optional, paint};
use crate::utils::date::{format_date, format_instant};
use crate::utils::formatting::{bold, check_mark, truncate};
use crate::utils::table::{Column, Table};

/// Print what a device shows for `view`.
pub fn print_view(view: &SessionView) {
    header(&view.template_name);

    println!("📅 Target date : {}", format_date(view.target_date));
    match (&view.submission_id, view.status) {
        (Some(id), Some(status)) => println!(
            "🧾 Submission  : {} [{}]",
            id,
            paint(color_for_status(status), status.to_db_str())
        ),
        _ => println!("🧾 Submission  : {}", paint(GREY, "none yet")),
    }
    match (view.is_read_only, view.locked_until) {
        (true, Some(until)) => println!("🔒 Locked until {} (read-only)", format_instant(until)),
        (true, None) => println!("🔒 Read-only"),
        _ => println!("✏️  Editable"),
    }
    println!();

    let mut table = Table::new(vec![
        Column::new("Task", 6),
        Column::new("Title", 20),
        Column::new("Done", 4),
        Column::new("Photos", 6),
        Column::new("Value", 8),
        Column::new("Audit", 9),
        Column::new("By", 6),
    ]);

    let mut notes = Vec::new();
    for tv in &view.tasks {
        let result = tv.result.as_ref();
        let done = result.is_some_and(|r| r.completed);
        let photos = result.map(|r| r.photo_count()).unwrap_or(0);
        let audit = result.map(|r| r.audit.clone()).unwrap_or_default();

        let mut title = truncate(&tv.task.title, 40);
        if tv.task.critical {
            title = bold(&title);
        }
        if tv.leased {
            title.push_str(" ✍");
        }

        table.add_row(vec![
            tv.task.id.clone(),
            title,
            check_mark(done).to_string(),
            if tv.task.needs_photos() {
                format!("{}/{}", photos, tv.task.required_photos)
            } else {
                colorize_optional("-")
            },
            colorize_optional(result.and_then(|r| r.value.as_deref()).unwrap_or("-")),
            paint(color_for_audit(&audit), audit.label()),
            colorize_optional(result.and_then(|r| r.completed_by.as_deref()).unwrap_or("-")),
        ]);

        if let Some(r) = result {
            if let Some(c) = &r.comment {
                notes.push(format!("💬 {}: {}", tv.task.id, c));
            }
            match &r.audit {
                AuditState::Flagged { reason } => {
                    notes.push(format!("🚩 {}: flagged: {}", tv.task.id, reason))
                }
                AuditState::Overridden { reason, by, .. } => notes.push(format!(
                    "🛡️  {}: flag overridden by {} ({})",
                    tv.task.id, by, reason
                )),
                _ => {}
            }
        }
    }

    print!("{}", table.render());
    if !notes.is_empty() {
        println!();
        for n in notes {
            println!("{}", n);
        }
    }
}

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status { template } = cmd {
        let logic = ChecklistLogic::from_config(cfg)?;
        let session = logic.open(template).await?;
        let view = session.view();

        print_view(&view);
        if view.tasks.is_empty() {
            warning("This checklist has no tasks.");
        }
    }

    Ok(())
}
