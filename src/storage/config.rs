use std::path::Path;

use anyhow::anyhow;
use socialgrab_core::models::settings::Settings;

/// Settings from `<data_dir>/settings.json`; defaults when the file is
/// missing or unreadable.
pub fn load_settings() -> Settings {
    match socialgrab_core::fs_paths::settings_file() {
        Some(path) => load_settings_from(&path),
        None => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> anyhow::Result<()> {
    let path = socialgrab_core::fs_paths::settings_file()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    save_settings_to(&path, settings)
}

pub fn load_settings_from(path: &Path) -> Settings {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
        Err(e) => {
            tracing::warn!("Could not read {}: {}; using defaults", path.display(), e);
            return Settings::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Invalid settings in {}: {}; using defaults", path.display(), e);
        Settings::default()
    })
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    tracing::debug!("Settings saved to {}", path.display());
    Ok(())
}
