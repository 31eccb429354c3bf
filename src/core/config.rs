use crate::config::{Config, migrate};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    pub fn print(cfg: &Config) -> AppResult<()> {
        let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
        println!("📄 Current configuration:\n");
        println!("{}", yaml);
        Ok(())
    }

    /// Report fields missing from (or unknown to) the config file.
    ///
    /// Returns the missing field names.
    pub fn check(path: &Path) -> AppResult<Vec<String>> {
        if !path.exists() {
            warning(format!(
                "No configuration file at {}: defaults are in use (run `init`).",
                path.display()
            ));
            return Ok(Vec::new());
        }

        let missing = migrate::missing_fields(path).map_err(|_| AppError::ConfigLoad)?;
        let unknown = migrate::unknown_fields(path).map_err(|_| AppError::ConfigLoad)?;

        if missing.is_empty() {
            success("Configuration file has every field.");
        } else {
            warning(format!(
                "Missing fields (defaults apply): {}",
                missing.join(", ")
            ));
            info("Run `config --migrate` to write them to the file.");
        }
        if !unknown.is_empty() {
            warning(format!("Unknown fields (ignored): {}", unknown.join(", ")));
        }
        Ok(missing)
    }

    pub fn migrate(path: &Path, cfg: &Config) -> AppResult<Vec<String>> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "no configuration file at {}",
                path.display()
            )));
        }
        migrate::fill_missing_fields(path, cfg).map_err(|_| AppError::ConfigSave)
    }

    /// Open `path` in `editor`, falling back to $EDITOR / $VISUAL / the
    /// platform default.
    pub fn edit(path: &Path, editor: &Option<String>) -> AppResult<()> {
        let default_editor = std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            });
        let requested = editor.clone().unwrap_or_else(|| default_editor.clone());

        match Command::new(&requested).arg(path).status() {
            Ok(s) if s.success() => {
                success(format!(
                    "Configuration file edited successfully using '{}'",
                    requested
                ));
                return Ok(());
            }
            _ => warning(format!(
                "Editor '{}' not available, falling back to '{}'",
                requested, default_editor
            )),
        }

        match Command::new(&default_editor).arg(path).status() {
            Ok(s) if s.success() => {
                success(format!(
                    "Configuration file edited successfully using fallback '{}'",
                    default_editor
                ));
                Ok(())
            }
            Ok(s) => Err(AppError::Config(format!("{} exited with {}", default_editor, s))),
            Err(e) => Err(AppError::Config(e.to_string())),
        }
    }
}
