//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable prefix shared by every onboarding setting.
const ENV_PREFIX: &str = "GOAL_ONBOARDING_";

/// Tutorial engine configuration.
#[derive(Debug, Clone)]
pub struct TutorialConfig {
    /// Delay after page load before the auto-start check runs.
    pub settle_delay: Duration,
    /// Additional delay between a positive auto-start check and the start.
    pub start_delay: Duration,
    /// Accounts younger than this many days count as new.
    pub new_account_days: i64,
    /// Goal-less users stay eligible until their login count reaches this.
    pub login_threshold: u32,
    /// Minimum distance between the panel and every viewport edge, in px.
    pub viewport_margin: f64,
    /// Distance between the panel and its target element, in px.
    pub target_gap: f64,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            start_delay: Duration::from_millis(500),
            new_account_days: 3,
            login_threshold: 5,
            viewport_margin: 10.0,
            target_gap: 20.0,
        }
    }
}

impl TutorialConfig {
    /// Build a config from `GOAL_ONBOARDING_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            settle_delay: env_parse::<u64>("SETTLE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            start_delay: env_parse::<u64>("START_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.start_delay),
            new_account_days: env_parse("NEW_ACCOUNT_DAYS")?
                .unwrap_or(defaults.new_account_days),
            login_threshold: env_parse("LOGIN_THRESHOLD")?.unwrap_or(defaults.login_threshold),
            ..defaults
        })
    }

    /// Zero delays, for hosts (and tests) that drive timing themselves.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            start_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn env_parse<T>(suffix: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let key = format!("{ENV_PREFIX}{suffix}");
    match std::env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = TutorialConfig::default();
        assert_eq!(c.settle_delay, Duration::from_millis(1000));
        assert_eq!(c.start_delay, Duration::from_millis(500));
        assert_eq!(c.new_account_days, 3);
        assert_eq!(c.login_threshold, 5);
        assert_eq!(c.viewport_margin, 10.0);
    }

    #[test]
    fn immediate_zeroes_delays_only() {
        let c = TutorialConfig::immediate();
        assert_eq!(c.settle_delay, Duration::ZERO);
        assert_eq!(c.start_delay, Duration::ZERO);
        assert_eq!(c.login_threshold, 5);
    }

    #[test]
    fn env_parse_missing_is_none() {
        let v: Option<u64> = env_parse("DEFINITELY_NOT_SET_ANYWHERE").unwrap();
        assert!(v.is_none());
    }
}
