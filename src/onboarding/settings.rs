//! Typed onboarding settings, serialized to string keys at the store boundary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DatabaseError;
use crate::store::SettingsStore;

use super::page::PageType;

/// Storage keys used for onboarding persistence.
pub mod settings_keys {
    use super::PageType;

    /// Global "user has finished onboarding" flag.
    pub const TUTORIAL_COMPLETED: &str = "tutorialCompleted";
    /// Page loads seen so far.
    pub const LOGIN_COUNT: &str = "loginCount";
    /// Registration timestamp.
    pub const ACCOUNT_CREATED_DATE: &str = "accountCreatedDate";

    /// Per-page "already shown" flag key, e.g. `tutorial_goal-detail_shown`.
    pub fn shown(page_type: PageType) -> String {
        format!("tutorial_{page_type}_shown")
    }
}

/// Per-page-type "shown" flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShownFlags {
    pub home: bool,
    pub dashboard: bool,
    pub goal_detail: bool,
    pub community: bool,
}

impl ShownFlags {
    /// `general` has no tutorial and never counts as shown.
    pub fn get(&self, page_type: PageType) -> bool {
        match page_type {
            PageType::Home => self.home,
            PageType::Dashboard => self.dashboard,
            PageType::GoalDetail => self.goal_detail,
            PageType::Community => self.community,
            PageType::General => false,
        }
    }

    pub fn set(&mut self, page_type: PageType, value: bool) {
        match page_type {
            PageType::Home => self.home = value,
            PageType::Dashboard => self.dashboard = value,
            PageType::GoalDetail => self.goal_detail = value,
            PageType::Community => self.community = value,
            PageType::General => {}
        }
    }

    pub fn all(&self) -> bool {
        PageType::WITH_TUTORIALS.iter().all(|p| self.get(*p))
    }
}

/// Persisted onboarding state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnboardingSettings {
    pub tutorial_completed: bool,
    pub shown: ShownFlags,
    pub login_count: u32,
    pub account_created: Option<DateTime<Utc>>,
}

impl OnboardingSettings {
    /// Read every field from the store. Missing keys take defaults; malformed
    /// values are logged and also take defaults.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, DatabaseError> {
        let mut settings = Self {
            tutorial_completed: read_flag(store, settings_keys::TUTORIAL_COMPLETED).await?,
            ..Self::default()
        };

        for page in PageType::WITH_TUTORIALS {
            let flag = read_flag(store, &settings_keys::shown(page)).await?;
            settings.shown.set(page, flag);
        }

        if let Some(raw) = store.get(settings_keys::LOGIN_COUNT).await? {
            settings.login_count = raw.trim().parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, "Ignoring malformed login count: {}", e);
                0
            });
        }

        if let Some(raw) = store.get(settings_keys::ACCOUNT_CREATED_DATE).await? {
            settings.account_created = parse_timestamp(&raw);
            if settings.account_created.is_none() {
                tracing::warn!(value = %raw, "Ignoring malformed account creation date");
            }
        }

        Ok(settings)
    }

    /// Write only the completed and shown flags, leaving the counter and
    /// registration date as other writers left them.
    pub async fn save_flags(&self, store: &dyn SettingsStore) -> Result<(), DatabaseError> {
        Self::store_completed(store, self.tutorial_completed).await?;
        for page in PageType::WITH_TUTORIALS {
            store
                .set(&settings_keys::shown(page), bool_str(self.shown.get(page)))
                .await?;
        }
        Ok(())
    }

    /// Bump the login counter for a page load. Returns the new count.
    pub async fn record_page_load(store: &dyn SettingsStore) -> Result<u32, DatabaseError> {
        let current = Self::load(store).await?.login_count;
        let next = current.saturating_add(1);
        store
            .set(settings_keys::LOGIN_COUNT, &next.to_string())
            .await?;
        Ok(next)
    }

    /// Set one page's shown flag.
    pub async fn store_shown(
        store: &dyn SettingsStore,
        page_type: PageType,
    ) -> Result<(), DatabaseError> {
        if page_type == PageType::General {
            return Ok(());
        }
        store.set(&settings_keys::shown(page_type), "true").await
    }

    pub async fn store_completed(
        store: &dyn SettingsStore,
        completed: bool,
    ) -> Result<(), DatabaseError> {
        store
            .set(settings_keys::TUTORIAL_COMPLETED, bool_str(completed))
            .await
    }

    /// Persist the registration timestamp.
    pub async fn store_account_created(
        store: &dyn SettingsStore,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        store
            .set(settings_keys::ACCOUNT_CREATED_DATE, &at.to_rfc3339())
            .await
    }

    /// Delete the completed flag and every shown flag. The login counter and
    /// registration date are left in place.
    pub async fn clear_flags(store: &dyn SettingsStore) -> Result<(), DatabaseError> {
        store.remove(settings_keys::TUTORIAL_COMPLETED).await?;
        for page in PageType::WITH_TUTORIALS {
            store.remove(&settings_keys::shown(page)).await?;
        }
        Ok(())
    }

    /// Set every shown flag and the global completed flag.
    pub fn disable_all(&mut self) {
        for page in PageType::WITH_TUTORIALS {
            self.shown.set(page, true);
        }
        self.tutorial_completed = true;
    }
}

async fn read_flag(store: &dyn SettingsStore, key: &str) -> Result<bool, DatabaseError> {
    Ok(store.get(key).await?.is_some_and(|v| v.trim() == "true"))
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Parse an RFC 3339, SQLite datetime, or epoch-milliseconds timestamp.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    s.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn shown_key_format() {
        assert_eq!(settings_keys::shown(PageType::Home), "tutorial_home_shown");
        assert_eq!(
            settings_keys::shown(PageType::GoalDetail),
            "tutorial_goal-detail_shown"
        );
    }

    #[tokio::test]
    async fn load_from_empty_store_is_default() {
        let store = MemoryStore::new();
        let settings = OnboardingSettings::load(&store).await.unwrap();
        assert_eq!(settings, OnboardingSettings::default());
    }

    #[tokio::test]
    async fn saved_flags_load_back_with_other_fields() {
        let store = MemoryStore::with_entries([("loginCount", "7")]);
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        OnboardingSettings::store_account_created(&store, created)
            .await
            .unwrap();

        let mut settings = OnboardingSettings::load(&store).await.unwrap();
        assert_eq!(settings.account_created, Some(created));
        settings.shown.set(PageType::Community, true);
        settings.save_flags(&store).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot["tutorial_community_shown"], "true");
        assert_eq!(snapshot["tutorial_home_shown"], "false");
        assert_eq!(snapshot["loginCount"], "7");

        let loaded = OnboardingSettings::load(&store).await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn malformed_values_fall_back_to_defaults() {
        let store = MemoryStore::with_entries([
            ("tutorialCompleted", "yes"),
            ("loginCount", "many"),
            ("accountCreatedDate", "last tuesday"),
        ]);
        let settings = OnboardingSettings::load(&store).await.unwrap();
        assert!(!settings.tutorial_completed);
        assert_eq!(settings.login_count, 0);
        assert!(settings.account_created.is_none());
    }

    #[tokio::test]
    async fn granular_writers_touch_only_their_keys() {
        let store = MemoryStore::with_entries([("loginCount", "4")]);

        assert_eq!(OnboardingSettings::record_page_load(&store).await.unwrap(), 5);
        OnboardingSettings::store_shown(&store, PageType::Dashboard)
            .await
            .unwrap();
        OnboardingSettings::store_shown(&store, PageType::General)
            .await
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["loginCount"], "5");
        assert_eq!(snapshot["tutorial_dashboard_shown"], "true");

        let mut settings = OnboardingSettings::load(&store).await.unwrap();
        settings.disable_all();
        settings.save_flags(&store).await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot["tutorialCompleted"], "true");
        assert_eq!(snapshot["loginCount"], "5");
        assert!(!snapshot.contains_key("accountCreatedDate"));
    }

    #[tokio::test]
    async fn disable_then_clear_flags() {
        let store = MemoryStore::with_entries([("loginCount", "3")]);
        let mut settings = OnboardingSettings::default();
        settings.disable_all();
        assert!(settings.shown.all());
        assert!(settings.tutorial_completed);
        settings.save_flags(&store).await.unwrap();

        OnboardingSettings::clear_flags(&store).await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1, "only the login counter survives: {snapshot:?}");
        assert_eq!(snapshot["loginCount"], "3");
    }

    #[test]
    fn general_page_has_no_flag() {
        let mut flags = ShownFlags::default();
        flags.set(PageType::General, true);
        assert_eq!(flags, ShownFlags::default());
        assert!(!flags.get(PageType::General));
    }

    #[test]
    fn parses_supported_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-01-15T08:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-15 08:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp(&expected.timestamp_millis().to_string()),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp("2026-01-15"),
            Some(Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("soon"), None);
    }
}
