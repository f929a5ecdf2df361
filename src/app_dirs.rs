use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "grammar-arcade";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("grammar_arcade_config.json"))
    }

    pub fn snapshot_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
                .join("stats.json")
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|pd| pd.data_local_dir().join("stats.json"))
                .unwrap_or_else(|| PathBuf::from("grammar_arcade_stats.json"))
        }
    }
}
