//! Tunable parameters of the heading-inference engine.
//!
//! Every field has a default, so a partial TOML file only needs to name the
//! values it overrides.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::FontProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Runs whose baselines differ by at most this much share a line.
    pub line_tolerance: f32,
    /// Longer lines are never headings.
    pub max_heading_chars: usize,
    /// Cap applied to a title taken from the largest text on page 1.
    pub title_max_chars: usize,
    /// Metadata titles must be strictly longer than this to be trusted.
    pub metadata_title_min_chars: usize,
    pub h1_offset: f32,
    pub h2_offset: f32,
    pub h3_offset: f32,
    /// Profile used when the document has no usable font sizes.
    pub fallback: FallbackProfile,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        OutlineConfig {
            line_tolerance: 2.0,
            max_heading_chars: 200,
            title_max_chars: 100,
            metadata_title_min_chars: 10,
            h1_offset: 6.0,
            h2_offset: 3.0,
            h3_offset: 1.0,
            fallback: FallbackProfile::default(),
        }
    }
}

impl OutlineConfig {
    /// Parse a TOML document, filling unspecified keys with defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: OutlineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every line a heading or none.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.line_tolerance.is_finite() && self.line_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "line_tolerance must be a non-negative number, got {}",
                self.line_tolerance
            )));
        }
        if self.max_heading_chars < 2 {
            return Err(ConfigError::Invalid(
                "max_heading_chars must be at least 2".to_string(),
            ));
        }
        if !(self.h3_offset <= self.h2_offset && self.h2_offset <= self.h1_offset) {
            return Err(ConfigError::Invalid(format!(
                "offsets must satisfy h3 <= h2 <= h1, got {} / {} / {}",
                self.h3_offset, self.h2_offset, self.h1_offset
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackProfile {
    pub body_size: f32,
    pub h1_threshold: f32,
    pub h2_threshold: f32,
    pub h3_threshold: f32,
}

impl Default for FallbackProfile {
    fn default() -> Self {
        FallbackProfile {
            body_size: 12.0,
            h1_threshold: 18.0,
            h2_threshold: 15.0,
            h3_threshold: 13.0,
        }
    }
}

impl From<FallbackProfile> for FontProfile {
    fn from(f: FallbackProfile) -> Self {
        FontProfile {
            body_size: f.body_size,
            h1_threshold: f.h1_threshold,
            h2_threshold: f.h2_threshold,
            h3_threshold: f.h3_threshold,
        }
    }
}
