use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::models::{Category, RotationMode};

/// Admin-editable runtime settings. Persisted as a small JSON file so edits
/// survive restarts and external tools can change them while the bot runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    pub site_name: String,
    pub affiliate_link: String,
    pub categories: CategoryToggles,
    pub bot_running: bool,
    pub current_rotation: RotationMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct CategoryToggles {
    pub pg: bool,
    pub pp: bool,
    pub wg: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            pg: true,
            pp: true,
            wg: true,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            site_name: std::env::var("SITE_NAME").unwrap_or_else(|_| "Rei dos Slots Sinais".into()),
            affiliate_link: std::env::var("AFFILIATE_LINK").unwrap_or_default(),
            categories: CategoryToggles::default(),
            bot_running: true,
            current_rotation: RotationMode::Favorites,
        }
    }
}

/// File-backed key-value store for runtime configuration.
///
/// Every getter reloads from disk first so changes made by external tools
/// take effect without a restart; every setter persists immediately.
/// Persistence failures are logged and swallowed — losing an edit is
/// preferable to taking the distribution loop down.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    inner: RwLock<RuntimeConfig>,
}

impl ConfigStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match read_config_file(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                let defaults = RuntimeConfig::default();
                write_config_file(&path, &defaults);
                tracing::info!(path = %path.display(), "Runtime config initialized with defaults");
                defaults
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to load runtime config — using defaults");
                RuntimeConfig::default()
            }
        };

        Self {
            path,
            inner: RwLock::new(config),
        }
    }

    /// Current settings, refreshed from disk.
    pub fn snapshot(&self) -> RuntimeConfig {
        self.reload();
        self.inner.read().expect("config lock poisoned").clone()
    }

    pub fn site_name(&self) -> String {
        self.snapshot().site_name
    }

    pub fn affiliate_link(&self) -> String {
        self.snapshot().affiliate_link
    }

    pub fn is_running(&self) -> bool {
        self.snapshot().bot_running
    }

    pub fn rotation(&self) -> RotationMode {
        self.snapshot().current_rotation
    }

    pub fn category_enabled(&self, category: Category) -> bool {
        let toggles = self.snapshot().categories;
        match category {
            Category::Pg => toggles.pg,
            Category::Pp => toggles.pp,
            Category::Wg => toggles.wg,
        }
    }

    pub fn set_site_name(&self, name: &str) {
        self.update(|c| c.site_name = name.trim().to_string());
    }

    pub fn set_affiliate_link(&self, link: &str) {
        self.update(|c| c.affiliate_link = link.trim().to_string());
    }

    pub fn set_running(&self, running: bool) {
        self.update(|c| c.bot_running = running);
    }

    pub fn set_rotation(&self, mode: RotationMode) {
        self.update(|c| c.current_rotation = mode);
    }

    /// Flip FAVORITES <-> RANDOM and persist; returns the new mode.
    pub fn toggle_rotation(&self) -> RotationMode {
        let mut next = RotationMode::Favorites;
        self.update(|c| {
            next = c.current_rotation.toggled();
            c.current_rotation = next;
        });
        next
    }

    pub fn set_category_enabled(&self, category: Category, enabled: bool) {
        self.update(|c| match category {
            Category::Pg => c.categories.pg = enabled,
            Category::Pp => c.categories.pp = enabled,
            Category::Wg => c.categories.wg = enabled,
        });
    }

    fn update(&self, f: impl FnOnce(&mut RuntimeConfig)) {
        let mut guard = self.inner.write().expect("config lock poisoned");
        f(&mut guard);
        write_config_file(&self.path, &guard);
    }

    fn reload(&self) {
        match read_config_file(&self.path) {
            Ok(Some(config)) => {
                *self.inner.write().expect("config lock poisoned") = config;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reload runtime config — keeping cached values");
            }
        }
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<Option<RuntimeConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

fn write_config_file(path: &Path, config: &RuntimeConfig) {
    let write = || -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(config)?)?;
        Ok(())
    };
    if let Err(e) = write() {
        tracing::error!(error = %e, path = %path.display(), "Failed to persist runtime config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot-config.json");

        let store = ConfigStore::load(&path);
        store.set_site_name("Test Site");
        store.set_rotation(RotationMode::Random);
        store.set_running(false);

        // A second store over the same file sees the persisted values.
        let reopened = ConfigStore::load(&path);
        assert_eq!(reopened.site_name(), "Test Site");
        assert_eq!(reopened.rotation(), RotationMode::Random);
        assert!(!reopened.is_running());
    }

    #[test]
    fn toggle_alternates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("c.json"));

        assert_eq!(store.rotation(), RotationMode::Favorites);
        assert_eq!(store.toggle_rotation(), RotationMode::Random);
        assert_eq!(store.toggle_rotation(), RotationMode::Favorites);
    }

    #[test]
    fn external_edits_take_effect_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let store = ConfigStore::load(&path);
        store.set_site_name("Before");

        // Simulate an external tool rewriting the file.
        let mut config = store.snapshot();
        config.site_name = "After".into();
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(store.site_name(), "After");
    }
}
