use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "Subject Browser";
const CONFIG_FILE: &str = "config.json";

// ---------------------------------------------------------------------------
// Session settings persisted between runs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run the housekeeping filters right after a full import.
    pub initial_scrub: bool,
}

impl Settings {
    /// `<home>/Subject Browser/config.json`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
        Some(PathBuf::from(home).join(APP_DIR).join(CONFIG_FILE))
    }

    /// Read settings; a missing file gives defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings file at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&text).context("parsing settings JSON")
    }

    /// Like [`Settings::load`] but falls back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring settings file: {e:#}");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating settings directory {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("serializing settings")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }
}
