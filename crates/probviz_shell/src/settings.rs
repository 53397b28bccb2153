//! Persisted user settings (`settings.json`).

use std::fs;
use std::path::Path;

use probviz::context::Settings;
use tracing::{info, warn};

use crate::error::ShellError;

/// Reads settings, falling back to defaults when the file is missing or
/// unreadable. A corrupt file is reported and left in place.
pub fn load_settings(path: &Path) -> Settings {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
        Err(e) => {
            warn!("Could not read settings {:?}: {}", path, e);
            return Settings::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Ignoring corrupt settings {:?}: {}", path, e);
            Settings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ShellError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ShellError::io(parent, e))?;
    }
    let json = serde_json::to_vec_pretty(settings)?;
    fs::write(path, json).map_err(|e| ShellError::io(path, e))?;
    info!("Settings saved ({:?})", path);
    Ok(())
}
