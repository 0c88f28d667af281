//! OnboardingEngine — coordinates eligibility, auto-start, the tutorial
//! player, and persistence for one page load.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::TutorialConfig;
use crate::store::SettingsStore;

use super::eligibility::{self, GOAL_SELECTORS, Signals};
use super::host::HostPage;
use super::layout::position_panel;
use super::overlay::OverlayView;
use super::page::{PageType, detect_page_type};
use super::script::script_for;
use super::settings::OnboardingSettings;
use super::state::{
    ActiveTutorial, Advance, ExitOrigin, TutorialKey, TutorialOutcome, TutorialPhase,
    TutorialSession,
};

/// Which branch `check_auto_start` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "page_type", rename_all = "snake_case")]
pub enum AutoStartOutcome {
    Started(PageType),
    AlreadyActive,
    NotEligible,
    AlreadyShown(PageType),
    NoScript(PageType),
    /// Another start won the race during the start delay.
    Superseded,
    /// The page was unloaded before the check could start anything.
    PageUnloaded,
    /// Settings could not be read; nothing was shown.
    StorageUnavailable,
}

/// Snapshot of the engine for hosts and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub page_type: PageType,
    pub phase: TutorialPhase,
    pub tutorial_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<OnboardingSettings>,
}

/// The onboarding engine for one page load.
///
/// Construct one per page and drop it on navigation (after
/// [`page_unloaded`](Self::page_unloaded)). All control methods are
/// infallible from the host's point of view: refused transitions and storage
/// failures are logged and become no-ops.
pub struct OnboardingEngine {
    store: Arc<dyn SettingsStore>,
    page: Arc<dyn HostPage>,
    config: TutorialConfig,
    session: Mutex<TutorialSession>,
    /// Set once by `page_unloaded`; only written with `session` locked.
    unloaded: AtomicBool,
}

impl OnboardingEngine {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        page: Arc<dyn HostPage>,
        config: TutorialConfig,
    ) -> Self {
        Self {
            store,
            page,
            config,
            session: Mutex::new(TutorialSession::new()),
            unloaded: AtomicBool::new(false),
        }
    }

    /// Page type of the host page's current path.
    pub fn detect_page_type(&self) -> PageType {
        detect_page_type(&self.page.path())
    }

    /// Whether an overlay is currently up.
    pub async fn is_active(&self) -> bool {
        self.session.lock().await.is_active()
    }

    pub async fn phase(&self) -> TutorialPhase {
        self.session.lock().await.phase()
    }

    // ── Page lifecycle ──────────────────────────────────────────────

    /// Run once per page load: bump the login counter, then schedule the
    /// auto-start check after the settle delay.
    ///
    /// A navigation during either delay is caught by the final guard in
    /// `check_auto_start`, which then reports `PageUnloaded`.
    pub async fn page_loaded(self: &Arc<Self>) -> JoinHandle<AutoStartOutcome> {
        match OnboardingSettings::record_page_load(self.store.as_ref()).await {
            Ok(count) => tracing::debug!(login_count = count, "Recorded page load"),
            Err(e) => tracing::warn!("Failed to record page load: {}", e),
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(engine.config.settle_delay).await;
            engine.check_auto_start(None).await
        })
    }

    /// Tear down any overlay without persisting anything, e.g. on navigation.
    /// Pending auto-starts for this page load will not start anything.
    pub async fn page_unloaded(&self) {
        let mut session = self.session.lock().await;
        self.unloaded.store(true, Ordering::SeqCst);
        if let Some(ended) = session.finish() {
            tracing::debug!(
                page_type = %ended.page_type(),
                session = %ended.session_id,
                step = ended.step,
                "Tutorial torn down by navigation"
            );
            self.page.clear_highlight();
            self.page.unmount_overlay();
        }
    }

    // ── Eligibility & auto-start ────────────────────────────────────

    /// Whether the visitor counts as new. False when settings can't be read.
    pub async fn is_new_user(&self) -> bool {
        match self.load_settings().await {
            Some(settings) => self.eligible(&settings),
            None => false,
        }
    }

    fn eligible(&self, settings: &OnboardingSettings) -> bool {
        if settings.tutorial_completed {
            return false;
        }
        let has_goals = GOAL_SELECTORS.iter().any(|s| self.page.has_element(s));
        let user_json = self.page.embedded_user_json();
        let signals = Signals::gather(settings, user_json.as_deref(), has_goals, Utc::now());
        let eligible = eligibility::evaluate(&signals, &self.config);
        tracing::debug!(?signals, eligible, "Evaluated tutorial eligibility");
        eligible
    }

    /// Start the page's tutorial if the visitor is new and hasn't seen it.
    ///
    /// Waits the configured start delay before starting, then re-checks that
    /// nothing else started meanwhile.
    pub async fn check_auto_start(&self, page_type: Option<PageType>) -> AutoStartOutcome {
        if self.is_unloaded() {
            return AutoStartOutcome::PageUnloaded;
        }
        if self.is_active().await {
            return AutoStartOutcome::AlreadyActive;
        }

        let Some(settings) = self.load_settings().await else {
            return AutoStartOutcome::StorageUnavailable;
        };
        if !self.eligible(&settings) {
            return AutoStartOutcome::NotEligible;
        }

        let page_type = page_type.unwrap_or_else(|| self.detect_page_type());
        if settings.shown.get(page_type) {
            tracing::debug!(%page_type, "Tutorial already shown for page");
            return AutoStartOutcome::AlreadyShown(page_type);
        }
        if script_for(page_type).is_none() {
            return AutoStartOutcome::NoScript(page_type);
        }

        tokio::time::sleep(self.config.start_delay).await;

        let mut session = self.session.lock().await;
        if self.is_unloaded() {
            tracing::debug!(%page_type, "Page unloaded during auto-start delay");
            return AutoStartOutcome::PageUnloaded;
        }
        if session.is_active() {
            return AutoStartOutcome::Superseded;
        }
        if self.start_locked(&mut session, page_type) {
            AutoStartOutcome::Started(page_type)
        } else {
            AutoStartOutcome::NoScript(page_type)
        }
    }

    // ── Manual controls ─────────────────────────────────────────────

    /// Start the tutorial for `page_type` (or the current page). Works even if
    /// the tutorial was shown before. Returns whether it started.
    pub async fn start_tutorial(&self, page_type: Option<PageType>) -> bool {
        let page_type = page_type.unwrap_or_else(|| self.detect_page_type());
        let mut session = self.session.lock().await;
        if self.is_unloaded() {
            tracing::debug!(%page_type, "Ignoring start on an unloaded page");
            return false;
        }
        self.start_locked(&mut session, page_type)
    }

    pub async fn next_tutorial_step(&self) {
        let mut session = self.session.lock().await;
        match session.advance() {
            Ok(Advance::Moved(_)) => self.render_current(&session),
            Ok(Advance::Finished) => {
                self.end_locked(&mut session, TutorialOutcome::Completed, ExitOrigin::Manual)
                    .await
            }
            Err(e) => tracing::debug!("Ignoring next: {}", e),
        }
    }

    pub async fn previous_tutorial_step(&self) {
        let mut session = self.session.lock().await;
        match session.back() {
            Ok(Some(_)) => self.render_current(&session),
            Ok(None) => {}
            Err(e) => tracing::debug!("Ignoring previous: {}", e),
        }
    }

    pub async fn skip_tutorial(&self) {
        let mut session = self.session.lock().await;
        self.end_locked(&mut session, TutorialOutcome::Skipped, ExitOrigin::Manual)
            .await;
    }

    /// Complete the running tutorial from any step.
    pub async fn complete_tutorial(&self, origin: ExitOrigin) {
        let mut session = self.session.lock().await;
        self.end_locked(&mut session, TutorialOutcome::Completed, origin)
            .await;
    }

    /// Handle a DOM `KeyboardEvent.key`. Returns whether the key was consumed;
    /// keys are ignored while no tutorial is active.
    pub async fn handle_key(&self, key: &str) -> bool {
        if !self.is_active().await {
            return false;
        }
        match TutorialKey::from_dom_key(key) {
            Some(TutorialKey::Next) => self.next_tutorial_step().await,
            Some(TutorialKey::Previous) => self.previous_tutorial_step().await,
            Some(TutorialKey::Skip) => self.skip_tutorial().await,
            None => return false,
        }
        true
    }

    /// Hard opt-out: mark every tutorial shown and onboarding complete, and
    /// remove any overlay, whatever the current state.
    pub async fn disable_all_tutorials(&self) {
        let mut session = self.session.lock().await;
        session.finish();
        self.page.clear_highlight();
        self.page.unmount_overlay();

        let mut settings = self.load_settings().await.unwrap_or_default();
        settings.disable_all();
        if let Err(e) = settings.save_flags(self.store.as_ref()).await {
            tracing::warn!("Failed to persist disabled tutorials: {}", e);
        }
        tracing::info!("All tutorials disabled");
    }

    /// Clear every shown flag and the completed flag so tutorials can
    /// auto-start again. The login counter and registration date stay.
    pub async fn reset_tutorials(&self) {
        if let Err(e) = OnboardingSettings::clear_flags(self.store.as_ref()).await {
            tracing::warn!("Failed to persist tutorial reset: {}", e);
        }
        tracing::info!("Tutorial flags reset");
    }

    /// Persist the registration time, used when the page has no embedded
    /// `created_at`.
    pub async fn record_registration(&self, at: DateTime<Utc>) {
        if let Err(e) = OnboardingSettings::store_account_created(self.store.as_ref(), at).await {
            tracing::warn!("Failed to persist account creation date: {}", e);
        }
    }

    pub async fn status(&self) -> OnboardingStatus {
        let session = self.session.lock().await;
        OnboardingStatus {
            page_type: self.detect_page_type(),
            phase: session.phase(),
            tutorial_active: session.is_active(),
            settings: self.load_settings().await,
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }

    async fn load_settings(&self) -> Option<OnboardingSettings> {
        match OnboardingSettings::load(self.store.as_ref()).await {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Failed to load onboarding settings: {}", e);
                None
            }
        }
    }

    fn start_locked(&self, session: &mut TutorialSession, page_type: PageType) -> bool {
        match session.start(page_type) {
            Ok(active) => {
                tracing::info!(
                    %page_type,
                    session = %active.session_id,
                    steps = active.script.len(),
                    "Tutorial started"
                );
                self.page.mount_overlay();
                self.render(active);
                true
            }
            Err(e) => {
                tracing::warn!(%page_type, "Not starting tutorial: {}", e);
                false
            }
        }
    }

    fn render_current(&self, session: &TutorialSession) {
        if let Some(active) = session.current() {
            self.render(active);
        }
    }

    fn render(&self, active: &ActiveTutorial) {
        let step = active.current_step();
        let total = active.script.len();

        self.page.clear_highlight();
        if self.page.has_element(step.target_selector) {
            self.page.highlight(step.target_selector);
            self.page.scroll_into_view(step.target_selector);
        } else {
            tracing::debug!(
                selector = step.target_selector,
                step = step.key,
                "Tutorial target not on page"
            );
        }

        // Read the rect after scrolling so the panel follows the target.
        let position = position_panel(
            step.placement,
            self.page.element_rect(step.target_selector),
            self.page.panel_size(),
            self.page.viewport(),
            self.config.target_gap,
            self.config.viewport_margin,
        );

        let view = OverlayView {
            page_type: active.page_type(),
            step_key: step.key.to_string(),
            title: step.title.to_string(),
            body: step.body.to_string(),
            step_number: active.step + 1,
            total_steps: total,
            show_previous: active.step > 0,
            next_label: OverlayView::next_label_for(active.step, total),
            position,
        };
        self.page.render_overlay(&view);
    }

    /// `Active → Idle` with persistence. The page's shown flag is always set.
    /// The global completed flag is set for home/dashboard, and for every
    /// manual exit.
    async fn end_locked(
        &self,
        session: &mut TutorialSession,
        outcome: TutorialOutcome,
        origin: ExitOrigin,
    ) {
        let Some(ended) = session.finish() else {
            tracing::debug!(%outcome, "No tutorial to end");
            return;
        };
        let page_type = ended.page_type();

        self.page.clear_highlight();
        self.page.unmount_overlay();

        if let Err(e) = OnboardingSettings::store_shown(self.store.as_ref(), page_type).await {
            tracing::warn!(%page_type, "Failed to persist tutorial shown flag: {}", e);
        }
        let completes = page_type.completes_onboarding() || origin == ExitOrigin::Manual;
        if completes {
            if let Err(e) = OnboardingSettings::store_completed(self.store.as_ref(), true).await {
                tracing::warn!("Failed to persist onboarding completion: {}", e);
            }
        }

        tracing::info!(
            %page_type,
            session = %ended.session_id,
            step = ended.step,
            %outcome,
            ?origin,
            onboarding_completed = completes,
            "Tutorial ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::host::VirtualPage;
    use crate::onboarding::layout::{PanelPosition, Rect, Size};
    use crate::store::MemoryStore;

    fn engine_for(
        page: VirtualPage,
        store: Arc<MemoryStore>,
    ) -> (OnboardingEngine, Arc<VirtualPage>) {
        let page = Arc::new(page);
        let engine = OnboardingEngine::new(store, page.clone(), TutorialConfig::immediate());
        (engine, page)
    }

    #[tokio::test]
    async fn missing_targets_render_centered_without_highlight() {
        let (engine, page) =
            engine_for(VirtualPage::new("/community"), Arc::new(MemoryStore::new()));

        assert!(engine.start_tutorial(None).await);
        let view = page.overlay().unwrap();
        assert_eq!(view.position, PanelPosition::Centered);
        assert!(page.highlighted().is_none());
        assert!(!view.show_previous);
        assert_eq!(view.next_label, "Next");
    }

    #[tokio::test]
    async fn present_target_is_highlighted_scrolled_and_anchored() {
        let page = VirtualPage::new("/dashboard")
            .with_element(".dashboard-header", Rect::new(80.0, 100.0, 1000.0, 120.0));
        let (engine, page) = engine_for(page, Arc::new(MemoryStore::new()));

        engine.start_tutorial(None).await;
        assert_eq!(page.highlighted().as_deref(), Some(".dashboard-header"));
        assert_eq!(page.scroll_history(), vec![".dashboard-header".to_string()]);
        assert!(matches!(
            page.overlay().unwrap().position,
            PanelPosition::Anchored { .. }
        ));

        // Next step's target is absent: old highlight cleared, panel centered.
        engine.next_tutorial_step().await;
        assert!(page.highlighted().is_none());
        assert_eq!(page.overlay().unwrap().position, PanelPosition::Centered);
    }

    #[tokio::test]
    async fn small_viewport_clamps_anchored_panel() {
        let page = VirtualPage::new("/dashboard")
            .with_viewport(Size::new(400.0, 300.0))
            .with_element(".dashboard-header", Rect::new(80.0, 100.0, 1000.0, 120.0));
        let (engine, page) = engine_for(page, Arc::new(MemoryStore::new()));

        engine.start_tutorial(None).await;
        // Panel 360x220 below the header would overflow both axes.
        assert_eq!(
            page.overlay().unwrap().position,
            PanelPosition::Anchored { top: 70.0, left: 30.0 }
        );
    }

    #[tokio::test]
    async fn unloaded_page_refuses_auto_start() {
        let (engine, page) = engine_for(VirtualPage::new("/"), Arc::new(MemoryStore::new()));
        engine.page_unloaded().await;

        assert_eq!(
            engine.check_auto_start(None).await,
            AutoStartOutcome::PageUnloaded
        );
        assert!(!engine.start_tutorial(None).await);
        assert_eq!(page.mount_count(), 0);
    }

    #[tokio::test]
    async fn general_page_cannot_start() {
        let (engine, page) =
            engine_for(VirtualPage::new("/settings"), Arc::new(MemoryStore::new()));
        assert_eq!(engine.detect_page_type(), PageType::General);
        assert!(!engine.start_tutorial(None).await);
        assert!(!page.overlay_mounted());
    }

    #[tokio::test]
    async fn manual_start_refused_while_active() {
        let (engine, page) = engine_for(VirtualPage::new("/"), Arc::new(MemoryStore::new()));
        assert!(engine.start_tutorial(None).await);
        assert!(!engine.start_tutorial(Some(PageType::Community)).await);
        assert_eq!(page.overlay().unwrap().page_type, PageType::Home);
        assert_eq!(page.mount_count(), 1);
    }

    #[tokio::test]
    async fn automatic_exit_on_secondary_page_keeps_onboarding_open() {
        let store = Arc::new(MemoryStore::new());
        let (engine, _page) = engine_for(VirtualPage::new("/community"), store.clone());

        engine.start_tutorial(None).await;
        engine.complete_tutorial(ExitOrigin::Automatic).await;

        let settings = OnboardingSettings::load(store.as_ref()).await.unwrap();
        assert!(settings.shown.community);
        assert!(!settings.tutorial_completed);
    }

    #[tokio::test]
    async fn automatic_exit_on_dashboard_completes_onboarding() {
        let store = Arc::new(MemoryStore::new());
        let (engine, _page) = engine_for(VirtualPage::new("/dashboard"), store.clone());

        engine.start_tutorial(None).await;
        engine.complete_tutorial(ExitOrigin::Automatic).await;

        let settings = OnboardingSettings::load(store.as_ref()).await.unwrap();
        assert!(settings.shown.dashboard);
        assert!(settings.tutorial_completed);
    }

    #[tokio::test]
    async fn page_unloaded_tears_down_without_persisting() {
        let store = Arc::new(MemoryStore::new());
        let (engine, page) = engine_for(VirtualPage::new("/dashboard"), store.clone());

        engine.start_tutorial(None).await;
        engine.page_unloaded().await;

        assert!(!engine.is_active().await);
        assert!(!page.overlay_mounted());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn keys_ignored_while_idle() {
        let (engine, _page) = engine_for(VirtualPage::new("/"), Arc::new(MemoryStore::new()));
        assert!(!engine.handle_key("ArrowRight").await);

        engine.start_tutorial(None).await;
        assert!(!engine.handle_key("Enter").await);
        assert!(engine.handle_key("ArrowRight").await);
        assert_eq!(
            engine.phase().await,
            TutorialPhase::Active {
                page_type: PageType::Home,
                step: 1
            }
        );
    }

    #[tokio::test]
    async fn status_reports_phase_and_settings() {
        let store = Arc::new(MemoryStore::with_entries([("loginCount", "2")]));
        let (engine, _page) = engine_for(VirtualPage::new("/goals/detail/9"), store);

        engine.start_tutorial(None).await;
        let status = engine.status().await;
        assert_eq!(status.page_type, PageType::GoalDetail);
        assert!(status.tutorial_active);
        assert_eq!(status.settings.unwrap().login_count, 2);

        let json = serde_json::to_value(engine.status().await).unwrap();
        assert_eq!(json["phase"]["state"], "active");
        assert_eq!(json["phase"]["page_type"], "goal-detail");
    }
}
