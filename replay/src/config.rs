use anyhow::{Context, Result};
use serde::Deserialize;

use model::Theme;
use tracks::IngestOptions;

use crate::{Clock, PausePolicy, SceneStyle, TrailStyle, ViewState};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub style: String,
    /// Falls back to the MAPBOX_TOKEN environment variable
    pub access_token: Option<String>,
}

/// Everything tunable about a replay. Every field has a default, so a config file only needs to
/// mention what it changes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// In the same units as trajectory timestamps (seconds since the event start)
    pub trail_length: f64,
    pub loop_length: f64,
    /// Virtual time units per real millisecond
    pub animation_speed: f64,
    pub pause_policy: PausePolicy,
    pub theme: Theme,
    pub trail: TrailStyle,
    pub map: MapSettings,
    pub view_state: ViewState,
    pub frames_per_second: u32,
    pub ingest: IngestOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trail_length: 1_000_000.0,
            loop_length: 5_000_000.0,
            animation_speed: 60.0,
            pause_policy: PausePolicy::ResetToStart,
            theme: Theme::default(),
            trail: TrailStyle::default(),
            map: MapSettings {
                style: "mapbox://styles/mapbox/dark-v9".to_string(),
                access_token: None,
            },
            view_state: ViewState::default(),
            frames_per_second: 60,
            ingest: IngestOptions::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let raw = fs_err::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))?;
        config.finish()
    }

    /// Defaults, plus anything from the environment
    pub fn from_env() -> Result<Self> {
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        if self.map.access_token.is_none() {
            self.map.access_token = std::env::var("MAPBOX_TOKEN").ok();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.trail_length.is_finite() || self.trail_length <= 0.0 {
            bail!("trail_length must be positive, not {}", self.trail_length);
        }
        if self.frames_per_second == 0 {
            bail!("frames_per_second must be at least 1");
        }
        self.ingest.validate()?;
        // Catches bad loop_length and animation_speed
        self.clock()?;
        Ok(())
    }

    pub fn clock(&self) -> Result<Clock> {
        Ok(Clock::new(self.loop_length, self.animation_speed)?
            .with_pause_policy(self.pause_policy))
    }

    pub fn scene_style(&self) -> SceneStyle {
        SceneStyle {
            trail_length: self.trail_length,
            theme: self.theme.clone(),
            trail: self.trail.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use model::VendorClass;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        let clock = config.clock().unwrap();
        assert_eq!(clock.loop_length(), 5_000_000.0);
        assert_eq!(clock.speed(), 60.0);
        assert_eq!(clock.pause_policy(), PausePolicy::ResetToStart);
    }

    #[test]
    fn partial_file() {
        let config: Config = serde_json::from_str(
            r#"{
                "trail_length": 600,
                "loop_length": 7200,
                "animation_speed": 0.5,
                "pause_policy": "hold_position",
                "theme": {"trail_colors": {"1": [255, 0, 0]}},
                "view_state": {"longitude": -4.88, "latitude": 48.35, "zoom": 10, "pitch": 0, "bearing": 0},
                "ingest": {"max_concurrent_fetches": 2}
            }"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.pause_policy, PausePolicy::HoldPosition);
        assert_eq!(config.theme.color_for_class(VendorClass(1)), [255, 0, 0]);
        assert_eq!(config.ingest.max_concurrent_fetches, 2);
        assert_eq!(config.ingest.fetch_timeout_secs, 30.0);
        assert_eq!(config.frames_per_second, 60);
        assert_eq!(config.scene_style().trail_length, 600.0);
    }

    #[test]
    fn setup_errors() {
        for bad in [
            r#"{"loop_length": 0}"#,
            r#"{"loop_length": -10}"#,
            r#"{"trail_length": 0}"#,
            r#"{"animation_speed": -1}"#,
            r#"{"frames_per_second": 0}"#,
            r#"{"ingest": {"max_concurrent_fetches": 0}}"#,
        ] {
            let config: Config = serde_json::from_str(bad).unwrap();
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }
    }
}
