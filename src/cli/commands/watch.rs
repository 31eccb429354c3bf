use crate::cli::commands::status::print_view;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::core::scheduler::Trigger;
use crate::core::session::RefreshOutcome;
use crate::errors::AppResult;
use crate::ui::messages::info;
use chrono::Local;
use tokio::sync::watch;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Watch { template } = cmd else {
        return Ok(());
    };

    let logic = ChecklistLogic::from_config(cfg)?;
    let mut session = logic.open(template).await?;
    let scheduler = ChecklistLogic::scheduler(cfg);

    // Ctrl-C → shutdown
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    info(format!(
        "Watching '{}' (refresh every {}s, Ctrl-C to stop)",
        session.template().name,
        scheduler.heartbeat().as_secs()
    ));

    scheduler
        .run(&mut session, stop_rx, |trigger, outcome, view| {
            let changed = matches!(
                outcome,
                RefreshOutcome::Merged { .. } | RefreshOutcome::Cleared
            );
            if trigger == Trigger::Initial {
                print_view(view);
            } else if changed {
                println!(
                    "\n🔄 {} change at {}",
                    match trigger {
                        Trigger::StorageChange => "Local",
                        _ => "Remote",
                    },
                    Local::now().format("%H:%M:%S")
                );
                print_view(view);
            }
        })
        .await?;

    session.flush().await;
    info("Stopped watching.");
    Ok(())
}
