use std::sync::Arc;

use crate::config::ConfigStore;
use crate::models::RotationMode;

/// Owns the single active rotation mode and its transition rule. The value
/// itself lives in the persisted runtime config so it survives restarts.
#[derive(Debug, Clone)]
pub struct ModeRotator {
    store: Arc<ConfigStore>,
}

impl ModeRotator {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    pub fn current(&self) -> RotationMode {
        self.store.rotation()
    }

    /// FAVORITES -> RANDOM -> FAVORITES, persisted.
    pub fn toggle(&self) -> RotationMode {
        let next = self.store.toggle_rotation();
        tracing::debug!(mode = %next, "Rotation toggled");
        next
    }

    /// Fallback used when RANDOM keeps coming up empty: bias back toward the
    /// mode that is guaranteed to have configured content.
    pub fn force_favorites(&self) {
        tracing::info!("Forcing rotation back to FAVORITES");
        self.store.set_rotation(RotationMode::Favorites);
    }
}
