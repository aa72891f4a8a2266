//! Viewer configuration.
//!
//! The simulation host has been served by two generations of web clients that
//! differ only in a handful of behaviours. Each of those behaviours is a flag
//! here; [`ViewerConfig::default`] matches the current client and
//! [`ViewerConfig::legacy`] the earlier one.

use anyhow::Context as _;
use instant::Duration;
use serde::Deserialize;

/// Which bodies end up in the name registry used to route pose updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationScope {
    /// Every body including the root.
    AllBodies,
    /// Every body except the root.
    ChildrenOnly,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Where `/scene_id`, `/scene_data`, `/scene_state` and `/data/*` live.
    /// `None` on the web means "same origin as the page".
    pub base_url: Option<String>,
    pub scene_poll_interval_ms: u64,
    pub pose_interval_ms: u64,
    /// Convert positions, orientations and primitive scales from the
    /// simulation's left-handed frame.
    pub handedness_conversion: bool,
    /// Mirror mesh vertices/normals on z and reverse triangle winding.
    pub winding_correction: bool,
    pub registration: RegistrationScope,
    /// Move the root so the scene's bounding box is centered on the xz-plane.
    pub recenter: bool,
    /// Root height after recentering.
    pub recenter_height: f32,
    /// Express incoming poses relative to the (recentered) root frame.
    pub compose_root_frame: bool,
    pub flip_texture_y: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            scene_poll_interval_ms: 1000,
            pose_interval_ms: 20,
            handedness_conversion: true,
            winding_correction: true,
            registration: RegistrationScope::ChildrenOnly,
            recenter: true,
            recenter_height: 0.1,
            compose_root_frame: true,
            flip_texture_y: false,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn default_base_url() -> Option<String> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
fn default_base_url() -> Option<String> {
    Some("http://127.0.0.1:5000/".to_string())
}

impl ViewerConfig {
    /// Flag set of the first client generation: raw coordinates, every body
    /// registered, no recentering.
    pub fn legacy() -> Self {
        Self {
            handedness_conversion: false,
            winding_correction: false,
            registration: RegistrationScope::AllBodies,
            recenter: false,
            compose_root_frame: false,
            flip_texture_y: true,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Invalid viewer configuration")
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn scene_poll_interval(&self) -> Duration {
        Duration::from_millis(self.scene_poll_interval_ms)
    }

    pub fn pose_interval(&self) -> Duration {
        Duration::from_millis(self.pose_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            base_url = "http://sim.local:8080"
            pose_interval_ms = 50
            registration = "all_bodies"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://sim.local:8080"));
        assert_eq!(config.pose_interval(), Duration::from_millis(50));
        assert_eq!(config.registration, RegistrationScope::AllBodies);
        assert_eq!(config.scene_poll_interval_ms, 1000);
        assert!(config.handedness_conversion);
    }

    #[test]
    fn unknown_registration_scope_is_rejected() {
        assert!(ViewerConfig::from_toml_str("registration = \"everything\"").is_err());
    }

    #[test]
    fn legacy_only_changes_behaviour_flags() {
        let legacy = ViewerConfig::legacy();
        let current = ViewerConfig::default();
        assert!(!legacy.handedness_conversion);
        assert!(legacy.flip_texture_y);
        assert_eq!(legacy.pose_interval_ms, current.pose_interval_ms);
        assert_eq!(legacy.base_url, current.base_url);
    }
}
