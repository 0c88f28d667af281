//! Onboarding system — per-page guided tutorials for new users.
//!
//! The engine decides whether a visitor is new, picks the tutorial for the
//! current page, walks the user through it step by step with an overlay
//! panel, and persists completion so the same tutorial is not shown twice.

pub mod eligibility;
pub mod host;
pub mod layout;
pub mod manager;
pub mod overlay;
pub mod page;
pub mod script;
pub mod settings;
pub mod state;

pub use host::{HostPage, VirtualPage};
pub use manager::{AutoStartOutcome, OnboardingEngine, OnboardingStatus};
pub use page::{PageType, detect_page_type};
pub use script::{Placement, TutorialScript, TutorialStep, script_for};
pub use settings::OnboardingSettings;
pub use state::{ExitOrigin, TutorialOutcome, TutorialPhase};
