//! Cross-platform application paths

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, String> {
        let base = dirs::data_dir().ok_or("Could not determine data directory")?;
        Self::at(base.join("probviz"))
    }

    /// Rooted at an explicit directory, created if missing.
    pub fn at(data_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    /// Log of the interactive session, which owns the terminal.
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("probviz.log")
    }

    /// Rendered description pages (`show ... --html`).
    pub fn pages_dir(&self) -> PathBuf {
        self.data_dir.join("pages")
    }
}
