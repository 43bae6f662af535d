use crate::history::{DEFAULT_HISTORY_LENGTH, MAX_HISTORY_LENGTH};
use bezel_core::{FlightPreset, HullShape, NavigationError, Rgba};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_SPEED_BIAS: i32 = 75;
pub const MIN_TIMER_MS: u32 = 1;
pub const MAX_TIMER_MS: u32 = 100_000;

/// User-tunable navigator parameters, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorSettings {
    pub reduce_overlaps: bool,
    pub show_error: bool,
    pub auto_dim: bool,
    pub flight_preset: FlightPreset,
    /// Added to the flight timer period, in milliseconds.
    pub flight_speed_bias: i32,
    /// `<= 0` infers the world size from the landmark centres.
    pub world_size: f64,
    pub bezel_color: Rgba,
    /// Undimmed bezel opacity.
    #[serde(default = "default_bezel_opacity")]
    pub bezel_opacity: f32,
    pub history_length: usize,
    pub hull_shape: HullShape,

    #[serde(default = "default_hover_timer_ms")]
    pub hover_timer_ms: u32,
    #[serde(default = "default_stop_timer_ms")]
    pub stop_timer_ms: u32,
    #[serde(default = "default_dimmer_timer_ms")]
    pub dimmer_timer_ms: u32,
    /// Overrides the preset's flight timer period.
    #[serde(default)]
    pub flight_timer_ms: Option<u32>,

    #[serde(default = "default_step_dimness")]
    pub step_dimness: f32,
    #[serde(default = "default_num_dim_steps")]
    pub num_dim_steps: u32,
}

fn default_bezel_opacity() -> f32 {
    0.25
}
fn default_hover_timer_ms() -> u32 {
    500
}
fn default_stop_timer_ms() -> u32 {
    3000
}
fn default_dimmer_timer_ms() -> u32 {
    40
}
fn default_step_dimness() -> f32 {
    0.03
}
fn default_num_dim_steps() -> u32 {
    50
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            reduce_overlaps: false,
            show_error: false,
            auto_dim: true,
            flight_preset: FlightPreset::Express,
            flight_speed_bias: 0,
            world_size: 0.0,
            bezel_color: Rgba::GREY,
            bezel_opacity: default_bezel_opacity(),
            history_length: DEFAULT_HISTORY_LENGTH,
            hull_shape: HullShape::ConvexHull,
            hover_timer_ms: default_hover_timer_ms(),
            stop_timer_ms: default_stop_timer_ms(),
            dimmer_timer_ms: default_dimmer_timer_ms(),
            flight_timer_ms: None,
            step_dimness: default_step_dimness(),
            num_dim_steps: default_num_dim_steps(),
        }
    }
}

impl NavigatorSettings {
    /// Flight timer period before the speed bias is applied.
    pub fn flight_timer_ms(&self) -> u32 {
        self.flight_timer_ms
            .unwrap_or_else(|| self.flight_preset.timer_duration_ms())
    }

    /// Period of one flight step, bias included. Never below 1 ms.
    pub fn flight_period_ms(&self) -> u32 {
        let bias = self.flight_speed_bias.clamp(-MAX_SPEED_BIAS, MAX_SPEED_BIAS);
        let period = i64::from(self.flight_timer_ms()) + i64::from(bias);
        u32::try_from(period.max(i64::from(MIN_TIMER_MS))).unwrap_or(MIN_TIMER_MS)
    }

    /// Report the first out-of-range parameter, if any.
    pub fn validate(&self) -> Result<(), NavigationError> {
        let invalid = |name: &'static str, value: String| {
            Err(NavigationError::InvalidParameter { name, value })
        };
        if self.flight_speed_bias.abs() > MAX_SPEED_BIAS {
            return invalid("flight_speed_bias", self.flight_speed_bias.to_string());
        }
        if !(1..=MAX_HISTORY_LENGTH).contains(&self.history_length) {
            return invalid("history_length", self.history_length.to_string());
        }
        if !self.world_size.is_finite() {
            return invalid("world_size", self.world_size.to_string());
        }
        if !(0.0..=1.0).contains(&self.step_dimness) {
            return invalid("step_dimness", self.step_dimness.to_string());
        }
        if !(0.0..=1.0).contains(&self.bezel_opacity) {
            return invalid("bezel_opacity", self.bezel_opacity.to_string());
        }
        let timers = [
            ("hover_timer_ms", Some(self.hover_timer_ms)),
            ("stop_timer_ms", Some(self.stop_timer_ms)),
            ("dimmer_timer_ms", Some(self.dimmer_timer_ms)),
            ("flight_timer_ms", self.flight_timer_ms),
        ];
        for (name, value) in timers {
            if let Some(ms) = value
                && !(MIN_TIMER_MS..=MAX_TIMER_MS).contains(&ms)
            {
                return invalid(name, ms.to_string());
            }
        }
        Ok(())
    }

    /// Clamp every ranged parameter into its valid range.
    pub fn validated(mut self) -> Self {
        let clamp_timer = |ms: u32| ms.clamp(MIN_TIMER_MS, MAX_TIMER_MS);
        self.flight_speed_bias = self.flight_speed_bias.clamp(-MAX_SPEED_BIAS, MAX_SPEED_BIAS);
        self.history_length = self.history_length.clamp(1, MAX_HISTORY_LENGTH);
        if !self.world_size.is_finite() {
            self.world_size = 0.0;
        }
        self.step_dimness = if self.step_dimness.is_nan() {
            default_step_dimness()
        } else {
            self.step_dimness.clamp(0.0, 1.0)
        };
        self.bezel_opacity = if self.bezel_opacity.is_nan() {
            default_bezel_opacity()
        } else {
            self.bezel_opacity.clamp(0.0, 1.0)
        };
        self.hover_timer_ms = clamp_timer(self.hover_timer_ms);
        self.stop_timer_ms = clamp_timer(self.stop_timer_ms);
        self.dimmer_timer_ms = clamp_timer(self.dimmer_timer_ms);
        self.flight_timer_ms = self.flight_timer_ms.map(clamp_timer);
        self
    }

    /// `<config dir>/bezel/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bezel").join("settings.json"))
    }

    /// Load from the per-user config directory, falling back to defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                tracing::info!("No config directory, using default settings");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or unreadable file yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        tracing::info!("Loading settings from {:?}", path);
        if !path.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Failed to load settings: {}", e);
                Self::default()
            }
        }
    }

    /// Strict load: I/O and parse failures are returned. Out-of-range values
    /// are clamped with a warning.
    pub fn load_from(path: &Path) -> Result<Self, NavigationError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        if let Err(e) = settings.validate() {
            tracing::warn!("{}, clamping", e);
        }
        let settings = settings.validated();
        tracing::debug!("Settings loaded successfully: {:?}", settings);
        Ok(settings)
    }

    /// Save to the per-user config directory. Failures are logged.
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            tracing::error!("No config directory, settings not saved");
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::error!("Failed to save settings: {}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), NavigationError> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = NavigatorSettings::default();
        assert_eq!(s.hover_timer_ms, 500);
        assert_eq!(s.stop_timer_ms, 3000);
        assert_eq!(s.dimmer_timer_ms, 40);
        assert_eq!(s.flight_timer_ms(), 100);
        assert_eq!(s.history_length, 250);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_flight_period_follows_preset_and_bias() {
        let mut s = NavigatorSettings {
            flight_preset: FlightPreset::Tourist,
            ..Default::default()
        };
        assert_eq!(s.flight_period_ms(), 125);
        s.flight_speed_bias = -200;
        assert_eq!(s.flight_period_ms(), 50);
        s.flight_timer_ms = Some(20);
        s.flight_speed_bias = -75;
        assert_eq!(s.flight_period_ms(), 1);
    }

    #[test]
    fn test_validated_clamps() {
        let s = NavigatorSettings {
            flight_speed_bias: 300,
            history_length: 0,
            hover_timer_ms: 0,
            stop_timer_ms: 1_000_000,
            step_dimness: 2.0,
            world_size: f64::NAN,
            ..Default::default()
        };
        match s.validate() {
            Err(NavigationError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "flight_speed_bias")
            }
            other => panic!("expected invalid parameter, got {other:?}"),
        }
        let s = s.validated();
        assert_eq!(s.flight_speed_bias, 75);
        assert_eq!(s.history_length, 1);
        assert_eq!(s.hover_timer_ms, 1);
        assert_eq!(s.stop_timer_ms, MAX_TIMER_MS);
        assert_eq!(s.step_dimness, 1.0);
        assert_eq!(s.world_size, 0.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let s = NavigatorSettings {
            reduce_overlaps: true,
            flight_preset: FlightPreset::Tourist,
            flight_speed_bias: -20,
            bezel_color: Rgba::rgb(0.1, 0.2, 0.3),
            ..Default::default()
        };
        s.save_to(&path).unwrap();
        assert_eq!(NavigatorSettings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "auto_dim": false, "history_length": 9000 }"#).unwrap();
        let s = NavigatorSettings::load_from(&path).unwrap();
        assert!(!s.auto_dim);
        assert_eq!(s.history_length, MAX_HISTORY_LENGTH);
        assert_eq!(s.hover_timer_ms, 500);
        assert_eq!(s.bezel_opacity, 0.25);
    }

    #[test]
    fn test_bad_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            NavigatorSettings::load_from(&path),
            Err(NavigationError::Serde(_))
        ));
        assert_eq!(
            NavigatorSettings::load_or_default(&path),
            NavigatorSettings::default()
        );
        assert_eq!(
            NavigatorSettings::load_or_default(&dir.path().join("missing.json")),
            NavigatorSettings::default()
        );
    }
}
