use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_NAME: &str = "joyo-ladder";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// Default location of the JSON learner state.
    pub fn learner_state_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("learner.json"))
    }

    /// Default location of the SQLite learner database.
    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("learner.db"))
    }
}
