// Configuration - Tuning constants for analysis and the parameter mapper
// Stored as RON, every field falls back to its default when omitted

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Relative weights of the four tension components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensionWeights {
    pub hierarchical: f64,
    pub dissonance: f64,
    pub root_motion: f64,
    pub tendency: f64,
}

impl Default for TensionWeights {
    fn default() -> Self {
        Self {
            hierarchical: 0.40,
            dissonance: 0.25,
            root_motion: 0.20,
            tendency: 0.15,
        }
    }
}

/// Key, chord and tension heuristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Added to every major-mode correlation, breaks relative major/minor ties
    pub key_major_bias: f64,
    /// Best chord score below this reports an unknown chord
    pub chord_threshold: f64,
    /// Weight of non-chord-tone energy subtracted from the score
    pub non_chord_penalty: f64,
    /// Bonus for roots inside the detected key
    pub diatonic_bonus: f64,
    /// Cost of each template tone that is (nearly) silent
    pub missing_tone_penalty: f64,
    /// A template tone below this share of the window weight counts as missing
    pub missing_tone_ratio: f64,
    /// Chord window length in bars
    pub window_bars: f64,
    pub tension: TensionWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            key_major_bias: 0.02,
            chord_threshold: 0.3,
            non_chord_penalty: 0.3,
            diatonic_bonus: 0.15,
            missing_tone_penalty: 0.1,
            missing_tone_ratio: 0.05,
            window_bars: 0.5,
            tension: TensionWeights::default(),
        }
    }
}

/// Per-frame parameter mapper settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// How far behind "now" an event still counts as just happened (seconds)
    pub lookback: f64,
    /// Exponential approach rate towards a new chord's parameters (1/s)
    pub harmonic_rate: f64,
    /// Decay rate of the drum energy envelope (1/s)
    pub drum_decay: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            lookback: 0.05,
            harmonic_rate: 8.0,
            drum_decay: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub mapper: MapperConfig,
}

impl Config {
    /// Parse and validate a RON document
    pub fn from_ron_str(ron_data: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(ron_data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ron_data = std::fs::read_to_string(path)?;
        Self::from_ron_str(&ron_data)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Reject values the analysis cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        let m = &self.mapper;
        let non_negative = [
            ("analysis.key_major_bias", a.key_major_bias),
            ("analysis.chord_threshold", a.chord_threshold),
            ("analysis.non_chord_penalty", a.non_chord_penalty),
            ("analysis.diatonic_bonus", a.diatonic_bonus),
            ("analysis.missing_tone_penalty", a.missing_tone_penalty),
            ("analysis.missing_tone_ratio", a.missing_tone_ratio),
            ("analysis.tension.hierarchical", a.tension.hierarchical),
            ("analysis.tension.dissonance", a.tension.dissonance),
            ("analysis.tension.root_motion", a.tension.root_motion),
            ("analysis.tension.tendency", a.tension.tendency),
            ("mapper.lookback", m.lookback),
            ("mapper.harmonic_rate", m.harmonic_rate),
            ("mapper.drum_decay", m.drum_decay),
        ];

        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        if !a.window_bars.is_finite() || a.window_bars <= 0.0 {
            return Err(ConfigError::Invalid(
                "analysis.window_bars must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_constants() {
        let config = Config::default();
        assert_eq!(config.analysis.key_major_bias, 0.02);
        assert_eq!(config.analysis.chord_threshold, 0.3);
        assert_eq!(config.analysis.diatonic_bonus, 0.15);
        assert_eq!(config.analysis.window_bars, 0.5);
        assert_eq!(config.analysis.tension.hierarchical, 0.40);
        assert_eq!(config.mapper.lookback, 0.05);
        assert_eq!(config.mapper.harmonic_rate, 8.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = Config::from_ron_str("(analysis: (chord_threshold: 0.4))").unwrap();
        assert_eq!(config.analysis.chord_threshold, 0.4);
        assert_eq!(config.analysis.diatonic_bonus, 0.15);
        assert_eq!(config.mapper, MapperConfig::default());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = Config::default();
        config.mapper.lookback = 0.1;
        let text = config.to_ron_string().unwrap();
        assert_eq!(Config::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = Config::from_ron_str("(analysis: (window_bars: 0.0))");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = Config::from_ron_str("(mapper: (lookback: -1.0))");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_ron_rejected() {
        assert!(matches!(
            Config::from_ron_str("(analysis: "),
            Err(ConfigError::Ron(_))
        ));
    }
}
