//! Player preferences
//!
//! Persisted to LocalStorage on the web build, defaults elsewhere. These
//! are not game state; a fresh run always starts from scratch.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    /// Sphere tessellation (width, height segments) for ball meshes
    pub fn sphere_segments(&self) -> (u32, u32) {
        match self {
            QualityPreset::Low => (12, 8),
            QualityPreset::Medium => (18, 12),
            QualityPreset::High => (24, 16),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Sinusoidal camera swing/lift
    pub camera_sway: bool,
    /// Show the FPS readout when the HUD has one
    pub show_fps: bool,
    /// Minimize motion: freezes camera sway and entity wobble
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            camera_sway: true,
            show_fps: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective camera sway (respects reduced_motion)
    pub fn effective_camera_sway(&self) -> bool {
        self.camera_sway && !self.reduced_motion
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "cosmic_breaker_settings";

    /// Load settings from LocalStorage (wasm only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY)
            && let Ok(settings) = serde_json::from_str(&json)
        {
            log::info!("loaded settings from LocalStorage");
            return settings;
        }

        log::info!("using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (wasm only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(json) = serde_json::to_string(self)
        {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}
