//! Rating engine configuration

use serde::{Deserialize, Serialize};

/// Tunable constants of the rating engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating used when a player has no rating and no votes
    pub default_rating: f64,
    /// Scale applied to (actual - expected) before the format weight
    pub skill_scale: f64,
    /// Steepness of the logistic win-probability curve
    pub logistic_slope: f64,
    /// Numerator of the experience denominator term
    pub experience_numerator: f64,
    /// Rating value at which the experience denominator diverges
    pub experience_ceiling: f64,
    /// Multiplier on the experience denominator
    pub experience_multiplier: f64,
    /// Extra denominator factor for tie-break formats
    pub short_format_penalty: f64,
    /// Experience granted per game before scaling
    pub experience_base: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            default_rating: 1000.0,
            skill_scale: 0.25,
            logistic_slope: 4.0,
            experience_numerator: 125.0,
            experience_ceiling: 7.0,
            experience_multiplier: 9.0,
            short_format_penalty: 5.5,
            experience_base: 0.5,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        let positive = [
            ("default_rating", self.default_rating),
            ("skill_scale", self.skill_scale),
            ("logistic_slope", self.logistic_slope),
            ("experience_ceiling", self.experience_ceiling),
            ("experience_multiplier", self.experience_multiplier),
            ("short_format_penalty", self.short_format_penalty),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(crate::error::LadderError::ConfigurationError {
                    message: format!("{} must be positive, got {}", name, value),
                });
            }
        }

        if !self.experience_numerator.is_finite() || !self.experience_base.is_finite() {
            return Err(crate::error::LadderError::ConfigurationError {
                message: "Experience constants must be finite".to_string(),
            });
        }

        Ok(())
    }
}
