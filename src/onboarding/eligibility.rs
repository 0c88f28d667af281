//! New-user eligibility: should this visitor be offered a tutorial at all?

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TutorialConfig;

use super::settings::{OnboardingSettings, parse_timestamp};

/// Selectors that mark a goal on the page.
pub const GOAL_SELECTORS: [&str; 2] = [".goal-card", "[data-goal-id]"];

/// Inputs to the eligibility decision, gathered once per page load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signals {
    pub tutorial_completed: bool,
    /// Whole days since registration, `None` when unknown.
    pub account_age_days: Option<i64>,
    pub has_goals: bool,
    pub login_count: u32,
}

/// The embedded user blob rendered into the page by the server.
#[derive(Debug, Deserialize)]
struct EmbeddedUser {
    /// A timestamp string or epoch milliseconds.
    created_at: Option<serde_json::Value>,
}

impl Signals {
    /// Gather signals from persisted settings and the current page.
    ///
    /// Account age prefers the page's embedded `created_at`, then the
    /// persisted registration date.
    pub fn gather(
        settings: &OnboardingSettings,
        embedded_user_json: Option<&str>,
        has_goals: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let created = embedded_user_json
            .and_then(embedded_created_at)
            .or(settings.account_created);

        Self {
            tutorial_completed: settings.tutorial_completed,
            account_age_days: created.map(|at| (now - at).num_days()),
            has_goals,
            login_count: settings.login_count,
        }
    }
}

/// Extract `created_at` from the embedded user JSON. Malformed JSON or an
/// unparseable timestamp is logged and treated as unknown.
fn embedded_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let user: EmbeddedUser = match serde_json::from_str(raw) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!("Failed to parse embedded user data: {}", e);
            return None;
        }
    };
    let created_at = match user.created_at? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    let parsed = parse_timestamp(&created_at);
    if parsed.is_none() {
        tracing::warn!(value = %created_at, "Embedded created_at is not a timestamp");
    }
    parsed
}

/// Decide whether the visitor counts as new.
///
/// A completed onboarding is final. Otherwise a young account qualifies, and
/// so does a goal-less user who has not yet reached the login threshold.
pub fn evaluate(signals: &Signals, config: &TutorialConfig) -> bool {
    if signals.tutorial_completed {
        return false;
    }

    let recently_registered = signals
        .account_age_days
        .is_some_and(|days| days < config.new_account_days);

    recently_registered || (!signals.has_goals && signals.login_count < config.login_threshold)
}
