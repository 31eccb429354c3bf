use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::checklist::ChecklistLogic;
use crate::errors::AppResult;
use crate::ui::messages::warning;
use crate::utils::path::expand_tilde;
use std::fs;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the SQLite database and all pending migrations
///  - the photo storage directory
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    //
    // 1️⃣ CONFIGURATION
    //
    let written = Config::init_all(cfg.clone(), cli.db.clone(), cli.test)?;

    println!("⚙️  Initializing rChecklist…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", &written.database);

    //
    // 2️⃣ DATABASE (tables + migrations)
    //
    let logic = ChecklistLogic::from_config(&written)?;
    println!("✅ Database initialized at {}", &written.database);

    //
    // 3️⃣ PHOTO STORAGE (non blocking: uploads fall back to inline photos)
    //
    if let Some(root) = &written.photo_root {
        let dir = expand_tilde(root);
        match fs::create_dir_all(&dir) {
            Ok(()) => println!("🖼️  Photos     : {}", dir.display()),
            Err(e) => warning(format!(
                "Photo directory {} not available: {}",
                dir.display(),
                e
            )),
        }
    }

    //
    // 4️⃣ INTERNAL LOG
    //
    logic.record(
        "init",
        &written.store_id,
        &format!("Database initialized at {}", &written.database),
    );

    println!("🎉 rChecklist initialization completed!");
    Ok(())
}
