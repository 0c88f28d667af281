//! Tutorial player state machine — which script is running and on which step.

use serde::Serialize;
use uuid::Uuid;

use crate::error::TutorialError;

use super::page::PageType;
use super::script::{TutorialScript, TutorialStep, script_for};

/// Observable player state.
///
/// `Idle → Active(0) → … → Active(n-1) → Idle`. Completion and skipping both
/// collapse back to `Idle`; the difference lives in [`TutorialOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TutorialPhase {
    Idle,
    Active { page_type: PageType, step: usize },
}

impl std::fmt::Display for TutorialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active { page_type, step } => write!(f, "active({page_type}, {step})"),
        }
    }
}

/// How a tutorial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorialOutcome {
    Completed,
    Skipped,
}

impl std::fmt::Display for TutorialOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Who ended the tutorial. User-initiated exits finish onboarding globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOrigin {
    /// Button, keyboard, or an explicit control call.
    Manual,
    /// Ended by the host without user involvement.
    Automatic,
}

/// Keys the player reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialKey {
    Next,
    Previous,
    Skip,
}

impl TutorialKey {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "Escape" | "Esc" => Some(Self::Skip),
            "ArrowRight" | " " | "Space" | "Spacebar" => Some(Self::Next),
            "ArrowLeft" => Some(Self::Previous),
            _ => None,
        }
    }
}

/// The running tutorial.
#[derive(Debug, Clone)]
pub struct ActiveTutorial {
    /// Correlates log lines for one run.
    pub session_id: Uuid,
    pub script: &'static TutorialScript,
    /// Always `< script.len()`.
    pub step: usize,
}

impl ActiveTutorial {
    pub fn page_type(&self) -> PageType {
        self.script.page_type
    }

    pub fn current_step(&self) -> &'static TutorialStep {
        &self.script.steps[self.step]
    }
}

/// Result of `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    /// The last step was showing; the caller should complete the tutorial.
    Finished,
}

/// Session state for one page load. At most one tutorial runs at a time.
#[derive(Debug, Default)]
pub struct TutorialSession {
    active: Option<ActiveTutorial>,
}

impl TutorialSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<&ActiveTutorial> {
        self.active.as_ref()
    }

    pub fn phase(&self) -> TutorialPhase {
        match &self.active {
            Some(t) => TutorialPhase::Active {
                page_type: t.page_type(),
                step: t.step,
            },
            None => TutorialPhase::Idle,
        }
    }

    /// `Idle → Active(0)`. Refused while another tutorial runs or when the
    /// page type has no (non-empty) script.
    pub fn start(&mut self, page_type: PageType) -> Result<&ActiveTutorial, TutorialError> {
        if let Some(current) = &self.active {
            return Err(TutorialError::AlreadyActive {
                page_type: current.page_type(),
            });
        }
        let script = script_for(page_type)
            .filter(|s| !s.is_empty())
            .ok_or(TutorialError::NoScript { page_type })?;

        Ok(&*self.active.insert(ActiveTutorial {
            session_id: Uuid::new_v4(),
            script,
            step: 0,
        }))
    }

    /// `Active(i) → Active(i+1)`, or `Finished` on the last step (state unchanged).
    pub fn advance(&mut self) -> Result<Advance, TutorialError> {
        let active = self.active.as_mut().ok_or(TutorialError::NotActive)?;
        if active.step + 1 < active.script.len() {
            active.step += 1;
            Ok(Advance::Moved(active.step))
        } else {
            Ok(Advance::Finished)
        }
    }

    /// `Active(i) → Active(i-1)`. `Ok(None)` at step 0, where nothing changes.
    pub fn back(&mut self) -> Result<Option<usize>, TutorialError> {
        let active = self.active.as_mut().ok_or(TutorialError::NotActive)?;
        if active.step == 0 {
            return Ok(None);
        }
        active.step -= 1;
        Ok(Some(active.step))
    }

    /// End the running tutorial, returning it. `Active → Idle`.
    pub fn finish(&mut self) -> Option<ActiveTutorial> {
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_enters_step_zero() {
        let mut session = TutorialSession::new();
        assert_eq!(session.phase(), TutorialPhase::Idle);

        let active = session.start(PageType::Dashboard).unwrap();
        assert_eq!(active.step, 0);
        assert_eq!(active.current_step().key, "welcome");
        assert_eq!(
            session.phase(),
            TutorialPhase::Active {
                page_type: PageType::Dashboard,
                step: 0
            }
        );
    }

    #[test]
    fn start_is_refused_while_active_or_without_script() {
        let mut session = TutorialSession::new();
        assert_eq!(
            session.start(PageType::General).unwrap_err(),
            TutorialError::NoScript {
                page_type: PageType::General
            }
        );
        assert!(!session.is_active());

        session.start(PageType::Home).unwrap();
        assert_eq!(
            session.start(PageType::Community).unwrap_err(),
            TutorialError::AlreadyActive {
                page_type: PageType::Home
            }
        );
        assert_eq!(session.current().unwrap().page_type(), PageType::Home);
    }

    #[test]
    fn advance_visits_every_step_once() {
        for page in PageType::WITH_TUTORIALS {
            let mut session = TutorialSession::new();
            let len = session.start(page).unwrap().script.len();

            let mut visited = vec![0];
            let mut calls = 0;
            loop {
                calls += 1;
                match session.advance().unwrap() {
                    Advance::Moved(i) => visited.push(i),
                    Advance::Finished => break,
                }
            }
            assert_eq!(calls, len, "{page}: next count to finish");
            assert_eq!(visited, (0..len).collect::<Vec<_>>());
            // Still on the last step until the caller finishes it
            assert_eq!(session.current().unwrap().step, len - 1);
        }
    }

    #[test]
    fn back_at_first_step_is_noop() {
        let mut session = TutorialSession::new();
        session.start(PageType::Community).unwrap();
        assert_eq!(session.back().unwrap(), None);
        assert_eq!(session.current().unwrap().step, 0);

        session.advance().unwrap();
        session.advance().unwrap();
        assert_eq!(session.back().unwrap(), Some(1));
    }

    #[test]
    fn transitions_require_active_tutorial() {
        let mut session = TutorialSession::new();
        assert_eq!(session.advance().unwrap_err(), TutorialError::NotActive);
        assert_eq!(session.back().unwrap_err(), TutorialError::NotActive);
        assert!(session.finish().is_none());
    }

    #[test]
    fn finish_returns_to_idle() {
        let mut session = TutorialSession::new();
        session.start(PageType::GoalDetail).unwrap();
        let ended = session.finish().unwrap();
        assert_eq!(ended.page_type(), PageType::GoalDetail);
        assert_eq!(session.phase(), TutorialPhase::Idle);
        assert!(session.start(PageType::GoalDetail).is_ok());
    }

    #[test]
    fn dom_keys() {
        assert_eq!(TutorialKey::from_dom_key("Escape"), Some(TutorialKey::Skip));
        assert_eq!(TutorialKey::from_dom_key("ArrowRight"), Some(TutorialKey::Next));
        assert_eq!(TutorialKey::from_dom_key(" "), Some(TutorialKey::Next));
        assert_eq!(TutorialKey::from_dom_key("ArrowLeft"), Some(TutorialKey::Previous));
        assert_eq!(TutorialKey::from_dom_key("Enter"), None);
    }

    #[test]
    fn phase_display() {
        assert_eq!(TutorialPhase::Idle.to_string(), "idle");
        let p = TutorialPhase::Active {
            page_type: PageType::GoalDetail,
            step: 2,
        };
        assert_eq!(p.to_string(), "active(goal-detail, 2)");
    }
}
