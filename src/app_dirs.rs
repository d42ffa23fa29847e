use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "protype";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/protype`, or the platform's local data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn settings_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("protype_settings.json"))
    }

    pub fn best_score_path() -> PathBuf {
        Self::in_state_dir("best_score.json")
    }

    pub fn history_path() -> PathBuf {
        Self::in_state_dir("history.csv")
    }

    pub fn log_path() -> PathBuf {
        Self::in_state_dir("protype.log")
    }

    fn in_state_dir(file: &str) -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join(file))
            .unwrap_or_else(|| PathBuf::from(format!("protype_{file}")))
    }
}
