//! Game settings and balance
//!
//! Every tunable the simulation reads lives here. Settings are validated once
//! at session start; an invalid set is a programming error, not a runtime
//! condition the simulation recovers from.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors produced while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
}

impl SettingsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Base obstacle chance for this preset
    pub fn obstacle_prob(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Normal => OBSTACLE_PROB,
            Difficulty::Hard => 0.6,
        }
    }

    /// Speed gain per millisecond for this preset
    pub fn speed_up_rate(&self) -> f32 {
        match self {
            Difficulty::Easy => SPEED_UP_RATE * 0.5,
            Difficulty::Normal => SPEED_UP_RATE,
            Difficulty::Hard => SPEED_UP_RATE * 2.0,
        }
    }
}

/// Gameplay tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Track layout ===
    pub section_length: f32,
    /// Sections spawned at session start
    pub visible_sections: usize,
    /// Look-ahead threshold in section lengths
    pub lookahead: f32,
    /// Opening sections that carry no obstacles
    pub clear_sections: usize,
    /// Opacity lost per second while fading
    pub fade_rate: f32,

    // === Obstacle generation ===
    pub min_slots: u32,
    pub max_slots: u32,
    /// Distance kept free at each end of a section
    pub slot_margin: f32,
    /// Max longitudinal jitter for independent obstacles
    pub slot_jitter: f32,
    pub group_prob: f64,
    pub obstacle_prob: f64,
    pub cluster_inclusion_prob: f64,
    pub min_obstacle_size: f32,
    pub max_obstacle_size: f32,

    // === Motion ===
    pub base_speed: f32,
    /// Floor for speed after a negative boost
    pub min_speed: f32,
    pub max_speed: f32,
    /// Speed gained per millisecond
    pub speed_up_rate: f32,
    pub max_dt: f32,
    pub lateral_smoothing: f32,
    pub camera_smoothing: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            section_length: SECTION_LENGTH,
            visible_sections: VISIBLE_SECTIONS,
            lookahead: LOOKAHEAD_SECTIONS,
            clear_sections: 1,
            fade_rate: FADE_RATE,

            min_slots: 4,
            max_slots: 6,
            slot_margin: 4.0,
            slot_jitter: 1.5,
            group_prob: GROUP_PROB,
            obstacle_prob: OBSTACLE_PROB,
            cluster_inclusion_prob: CLUSTER_INCLUSION_PROB,
            min_obstacle_size: 0.8,
            max_obstacle_size: 1.4,

            base_speed: BASE_SPEED,
            min_speed: 2.0,
            max_speed: 60.0,
            speed_up_rate: SPEED_UP_RATE,
            max_dt: MAX_FRAME_DT,
            lateral_smoothing: LATERAL_SMOOTHING,
            camera_smoothing: CAMERA_SMOOTHING,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates preset-dependent values)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        self.difficulty = preset;
        self.obstacle_prob = preset.obstacle_prob();
        self.speed_up_rate = preset.speed_up_rate();
    }

    /// Number of live sections allowed before the oldest starts fading
    pub fn live_capacity(&self) -> usize {
        self.visible_sections + EXTRA_LIVE_SECTIONS
    }

    /// Distance ahead of the player below which a new section is spawned
    pub fn lookahead_distance(&self) -> f32 {
        self.lookahead * self.section_length
    }

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded settings from {} ({})",
            path.as_ref().display(),
            settings.difficulty.as_str()
        );
        Ok(settings)
    }

    /// Check every invariant the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.section_length > 0.0) {
            return Err(SettingsError::invalid("section_length", "must be positive"));
        }
        if self.visible_sections < 2 {
            return Err(SettingsError::invalid("visible_sections", "must be at least 2"));
        }
        if !(self.lookahead > 0.0 && self.lookahead < self.visible_sections as f32) {
            return Err(SettingsError::invalid(
                "lookahead",
                format!(
                    "must be in (0, {}) so the initial window covers it",
                    self.visible_sections
                ),
            ));
        }
        if !(self.fade_rate > 0.0) {
            return Err(SettingsError::invalid("fade_rate", "must be positive"));
        }

        if self.min_slots == 0 || self.min_slots > self.max_slots {
            return Err(SettingsError::invalid(
                "min_slots",
                "must satisfy 1 <= min_slots <= max_slots",
            ));
        }
        if !(self.slot_margin >= 0.0 && 2.0 * self.slot_margin < self.section_length) {
            return Err(SettingsError::invalid(
                "slot_margin",
                "both margins must fit inside a section",
            ));
        }
        if !(self.slot_jitter >= 0.0) {
            return Err(SettingsError::invalid("slot_jitter", "must not be negative"));
        }
        for (field, p) in [
            ("group_prob", self.group_prob),
            ("obstacle_prob", self.obstacle_prob),
            ("cluster_inclusion_prob", self.cluster_inclusion_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SettingsError::invalid(field, "must be a probability in [0, 1]"));
            }
        }
        if !(self.min_obstacle_size > 0.0 && self.min_obstacle_size <= self.max_obstacle_size) {
            return Err(SettingsError::invalid(
                "min_obstacle_size",
                "must satisfy 0 < min_obstacle_size <= max_obstacle_size",
            ));
        }

        if self.max_obstacle_size / 2.0 > self.slot_margin {
            return Err(SettingsError::invalid(
                "max_obstacle_size",
                "obstacles must fit inside the slot margin",
            ));
        }

        if !(self.max_dt > 0.0) {
            return Err(SettingsError::invalid("max_dt", "must be positive"));
        }
        if !(self.min_speed >= 0.0
            && self.min_speed <= self.base_speed
            && self.base_speed <= self.max_speed)
        {
            return Err(SettingsError::invalid(
                "base_speed",
                "must satisfy 0 <= min_speed <= base_speed <= max_speed",
            ));
        }
        // One spawn per tick must keep up with the player
        if self.max_speed * self.max_dt >= self.section_length {
            return Err(SettingsError::invalid(
                "max_speed",
                "a single tick may not travel a whole section",
            ));
        }
        if !(self.speed_up_rate >= 0.0) {
            return Err(SettingsError::invalid("speed_up_rate", "must not be negative"));
        }
        for (field, f) in [
            ("lateral_smoothing", self.lateral_smoothing),
            ("camera_smoothing", self.camera_smoothing),
        ] {
            if !(f > 0.0 && f <= 1.0) {
                return Err(SettingsError::invalid(field, "must be in (0, 1]"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
        for preset in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert!(Settings::from_preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("norm"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "base_speed": 10.0 }"#).unwrap();
        assert_eq!(settings.base_speed, 10.0);
        assert_eq!(settings.section_length, SECTION_LENGTH);
        assert_eq!(settings.visible_sections, VISIBLE_SECTIONS);
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let settings = Settings::from_preset(Difficulty::Hard);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_lookahead_must_fit_initial_window() {
        let settings = Settings {
            lookahead: 4.0,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "lookahead", .. }));
    }

    #[test]
    fn test_runaway_speed_rejected() {
        let settings = Settings {
            max_speed: 1000.0,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "max_speed", .. }));
    }

    #[test]
    fn test_bad_probability_rejected() {
        let settings = Settings {
            group_prob: 1.5,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "group_prob", .. }));
    }

    #[test]
    fn test_slot_range_rejected() {
        let settings = Settings {
            min_slots: 7,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_base_speed_outside_bounds_rejected() {
        let settings = Settings {
            base_speed: 1.0,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "base_speed", .. }));
    }
}
