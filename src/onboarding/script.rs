//! Built-in tutorial scripts, one per page type.

use serde::Serialize;

use super::page::PageType;

/// Where the panel sits relative to the step's target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

/// A single tutorial step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialStep {
    /// Stable identifier for external reference (analytics, styling).
    pub key: &'static str,
    pub title: &'static str,
    pub body: &'static str,
    /// CSS selector of the element to highlight. May match nothing.
    pub target_selector: &'static str,
    pub placement: Placement,
}

/// An ordered, immutable sequence of steps for one page type.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TutorialScript {
    pub page_type: PageType,
    pub steps: &'static [TutorialStep],
}

impl TutorialScript {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&'static TutorialStep> {
        self.steps.get(index)
    }
}

const fn step(
    key: &'static str,
    title: &'static str,
    body: &'static str,
    target_selector: &'static str,
    placement: Placement,
) -> TutorialStep {
    TutorialStep {
        key,
        title,
        body,
        target_selector,
        placement,
    }
}

static HOME_STEPS: [TutorialStep; 4] = [
    step(
        "welcome",
        "Welcome to GoalTracker! 🎯",
        "Let's take a quick tour so you can start turning big ambitions into daily progress.",
        ".hero-section",
        Placement::Bottom,
    ),
    step(
        "features",
        "Everything in One Place",
        "Set goals, break them into milestones, log progress and get AI-powered motivation.",
        ".features-section",
        Placement::Top,
    ),
    step(
        "get-started",
        "Create Your First Goal",
        "Use this button to create a goal. Be specific: \"Run a 10k by June\" beats \"get fit\".",
        ".cta-button",
        Placement::Bottom,
    ),
    step(
        "navigation",
        "Find Your Way Around",
        "The navigation bar takes you to your dashboard, the community and your profile.",
        ".navbar",
        Placement::Bottom,
    ),
];

static DASHBOARD_STEPS: [TutorialStep; 5] = [
    step(
        "welcome",
        "Welcome to Your Dashboard! 📊",
        "This is your home base. Everything about your goals and progress lives here.",
        ".dashboard-header",
        Placement::Bottom,
    ),
    step(
        "stats",
        "Track Your Progress",
        "These cards summarize active goals, completed milestones and your current streak.",
        ".stats-overview",
        Placement::Bottom,
    ),
    step(
        "goals",
        "Your Goals",
        "Each card is a goal. Click one to see its milestones and log progress.",
        ".goal-card",
        Placement::Right,
    ),
    step(
        "assistant",
        "Meet Your AI Assistant 🤖",
        "Ask for motivation, planning help or insight into your progress at any time.",
        "#ai-dashboard-assistant",
        Placement::Left,
    ),
    step(
        "add-goal",
        "Add a New Goal",
        "Ready for more? Create another goal here whenever inspiration strikes.",
        ".add-goal-btn",
        Placement::Top,
    ),
];

static GOAL_DETAIL_STEPS: [TutorialStep; 4] = [
    step(
        "overview",
        "Goal Overview 🎯",
        "Here is everything about this goal: its description, deadline and overall progress.",
        ".goal-header",
        Placement::Bottom,
    ),
    step(
        "milestones",
        "Milestones",
        "Break the goal into smaller milestones and tick them off as you go.",
        ".milestones-section",
        Placement::Right,
    ),
    step(
        "progress-log",
        "Log Your Progress",
        "Record what you did today. Small, regular updates keep momentum going.",
        ".progress-log",
        Placement::Top,
    ),
    step(
        "insights",
        "AI Insights 💡",
        "Get personalized suggestions based on how this goal is going.",
        ".ai-insights",
        Placement::Left,
    ),
];

static COMMUNITY_STEPS: [TutorialStep; 4] = [
    step(
        "welcome",
        "Welcome to the Community! 🌟",
        "Share your journey, cheer others on and find people chasing similar goals.",
        ".community-header",
        Placement::Bottom,
    ),
    step(
        "create-post",
        "Share an Update",
        "Post a win, a struggle or a question. The community is here to help.",
        ".create-post",
        Placement::Bottom,
    ),
    step(
        "feed",
        "Community Feed",
        "Like and comment on posts to encourage fellow goal-setters.",
        ".posts-feed",
        Placement::Top,
    ),
    step(
        "search",
        "Find People",
        "Search for users and goals to connect with like-minded people.",
        ".search-bar",
        Placement::Bottom,
    ),
];

static SCRIPTS: [TutorialScript; 4] = [
    TutorialScript {
        page_type: PageType::Home,
        steps: &HOME_STEPS,
    },
    TutorialScript {
        page_type: PageType::Dashboard,
        steps: &DASHBOARD_STEPS,
    },
    TutorialScript {
        page_type: PageType::GoalDetail,
        steps: &GOAL_DETAIL_STEPS,
    },
    TutorialScript {
        page_type: PageType::Community,
        steps: &COMMUNITY_STEPS,
    },
];

/// The script registered for a page type, if any.
pub fn script_for(page_type: PageType) -> Option<&'static TutorialScript> {
    SCRIPTS.iter().find(|s| s.page_type == page_type)
}

/// Every registered script.
pub fn all_scripts() -> &'static [TutorialScript] {
    &SCRIPTS
}
