use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where the interactive mode writes its log, since stderr belongs to the screen.
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("autotype");
            Some(state_dir.join("autotype.log"))
        } else {
            ProjectDirs::from("", "", "autotype")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("autotype.log"))
        }
    }
}
