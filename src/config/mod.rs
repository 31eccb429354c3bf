use crate::models::role::Role;
use crate::ui::messages::warning;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_store_id")]
    pub store_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub role: Role,
    /// Root directory of the photo blob storage. Unset disables uploads.
    #[serde(default)]
    pub photo_root: Option<String>,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_interaction_grace_ms")]
    pub interaction_grace_ms: i64,
    #[serde(default = "default_submission_guard_ms")]
    pub submission_guard_ms: i64,
    #[serde(default = "default_photo_max_edge")]
    pub photo_max_edge: u32,
    #[serde(default = "default_photo_quality")]
    pub photo_quality: u8,
    /// External content auditor, e.g. `my-auditor --strict`.
    #[serde(default)]
    pub audit_command: Option<String>,
    #[serde(default = "default_audit_timeout_secs")]
    pub audit_timeout_secs: u64,
}

fn default_store_id() -> String {
    "main".to_string()
}
fn default_user_id() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "operator".to_string())
}
fn default_heartbeat_secs() -> u64 {
    4
}
fn default_interaction_grace_ms() -> i64 {
    6_000
}
fn default_submission_guard_ms() -> i64 {
    7_000
}
fn default_photo_max_edge() -> u32 {
    800
}
fn default_photo_quality() -> u8 {
    70
}
fn default_audit_timeout_secs() -> u64 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            store_id: default_store_id(),
            user_id: default_user_id(),
            role: Role::default(),
            photo_root: Some(Self::photo_dir().to_string_lossy().to_string()),
            heartbeat_secs: default_heartbeat_secs(),
            interaction_grace_ms: default_interaction_grace_ms(),
            submission_guard_ms: default_submission_guard_ms(),
            photo_max_edge: default_photo_max_edge(),
            photo_quality: default_photo_quality(),
            audit_command: None,
            audit_timeout_secs: default_audit_timeout_secs(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rchecklist")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rchecklist")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rchecklist.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rchecklist.sqlite")
    }

    /// Default photo blob root
    pub fn photo_dir() -> PathBuf {
        Self::config_dir().join("photos")
    }

    /// Load configuration from file, or return defaults if not found.
    ///
    /// An unreadable file is reported and replaced by defaults.
    pub fn load() -> Self {
        let path = Self::config_file();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_yaml::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(cfg) => cfg,
            Err(e) => {
                warning(format!(
                    "Ignoring configuration file {}: {}",
                    path.display(),
                    e
                ));
                Self::default()
            }
        }
    }

    /// Initialize configuration and database files from `base`.
    ///
    /// `custom_db` may be relative to the config directory. In test mode the
    /// config file is not written.
    pub fn init_all(base: Config, custom_db: Option<String>, is_test: bool) -> io::Result<Config> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_db {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            PathBuf::from(&base.database)
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..base
        };

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config).map_err(io::Error::other)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }
}
