//! Engine tunables.

use serde::Deserialize;

use super::error::ValidationError;

/// Conversation engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Minutes of inactivity before the continue-or-new prompt.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: i64,

    /// License renewal fee per year, in RM.
    #[serde(default = "default_fee_per_year")]
    pub fee_per_year: f64,

    /// Token budget for generative replies.
    #[serde(default = "default_reply_max_tokens")]
    pub reply_max_tokens: u32,

    /// Sampling temperature for generative replies.
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,

    /// Nucleus sampling parameter for generative replies.
    #[serde(default = "default_reply_top_p")]
    pub reply_top_p: f32,
}

impl EngineConfig {
    /// Validates engine configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_minutes <= 0 {
            return Err(ValidationError::InvalidInactivityTimeout);
        }
        if self.fee_per_year <= 0.0 {
            return Err(ValidationError::InvalidFee);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
            fee_per_year: default_fee_per_year(),
            reply_max_tokens: default_reply_max_tokens(),
            reply_temperature: default_reply_temperature(),
            reply_top_p: default_reply_top_p(),
        }
    }
}

fn default_timeout_minutes() -> i64 {
    30
}

fn default_fee_per_year() -> f64 {
    30.0
}

fn default_reply_max_tokens() -> u32 {
    512
}

fn default_reply_temperature() -> f32 {
    0.5
}

fn default_reply_top_p() -> f32 {
    0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.timeout_minutes, 30);
        assert_eq!(config.fee_per_year, 30.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let config = EngineConfig {
            timeout_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            fee_per_year: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
