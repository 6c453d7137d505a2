use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::typing_policy::{ACCURACY_RANGE, WPM_RANGE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub wpm: f64,
    pub accuracy: f64,
    /// Windows whose title contains this are left out of the picker
    pub exclude_title: String,
}

impl Config {
    /// Replace out-of-range rates with the defaults so a hand-edited or
    /// stale file cannot stop every later run.
    fn sanitized(mut self, path: &Path) -> Self {
        let defaults = Config::default();
        if !WPM_RANGE.contains(&self.wpm) {
            warn!(path = %path.display(), wpm = self.wpm, "ignoring saved wpm");
            self.wpm = defaults.wpm;
        }
        if !ACCURACY_RANGE.contains(&self.accuracy) {
            warn!(path = %path.display(), accuracy = self.accuracy, "ignoring saved accuracy");
            self.accuracy = defaults.accuracy;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wpm: 60.0,
            accuracy: 96.0,
            exclude_title: "autotype".to_string(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "autotype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("autotype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(&self.path),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
