//! Page-type detection — maps a navigation path to the tutorial it gets.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse classification of the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Home,
    Dashboard,
    GoalDetail,
    Community,
    /// No tutorial exists for this view.
    General,
}

impl PageType {
    /// Page types that carry a tutorial script, in display order.
    pub const WITH_TUTORIALS: [PageType; 4] = [
        PageType::Home,
        PageType::Dashboard,
        PageType::GoalDetail,
        PageType::Community,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Dashboard => "dashboard",
            Self::GoalDetail => "goal-detail",
            Self::Community => "community",
            Self::General => "general",
        }
    }

    /// Finishing this page's tutorial counts as finishing onboarding.
    pub fn completes_onboarding(&self) -> bool {
        matches!(self, Self::Home | Self::Dashboard)
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "dashboard" => Ok(Self::Dashboard),
            "goal-detail" => Ok(Self::GoalDetail),
            "community" => Ok(Self::Community),
            "general" => Ok(Self::General),
            other => Err(format!("unknown page type: {other}")),
        }
    }
}

struct PageRule {
    pattern: Regex,
    page_type: PageType,
    /// Higher wins when several rules match.
    specificity: u8,
}

impl PageRule {
    fn new(pattern: &str, page_type: PageType, specificity: u8) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("page rule pattern is valid"),
            page_type,
            specificity,
        }
    }
}

static PAGE_RULES: LazyLock<Vec<PageRule>> = LazyLock::new(|| {
    vec![
        PageRule::new(r"^/goals/detail(/|$)", PageType::GoalDetail, 3),
        PageRule::new(r"^/goals/\d+(/|$)", PageType::GoalDetail, 3),
        PageRule::new(r"^/goal/[^/]+", PageType::GoalDetail, 3),
        PageRule::new(r"^/goal-detail(/|$)", PageType::GoalDetail, 2),
        PageRule::new(r"^/dashboard(/|$)", PageType::Dashboard, 2),
        PageRule::new(r"^/community(/|$)", PageType::Community, 2),
        PageRule::new(r"^/goals(/|$)", PageType::Dashboard, 1),
        PageRule::new(r"^/(home|index\.html)?$", PageType::Home, 1),
    ]
});

/// Classify a navigation path. The most specific matching rule wins;
/// unmatched paths are [`PageType::General`].
pub fn detect_page_type(path: &str) -> PageType {
    let path = normalize_path(path);
    PAGE_RULES
        .iter()
        .filter(|rule| rule.pattern.is_match(&path))
        .max_by_key(|rule| rule.specificity)
        .map(|rule| rule.page_type)
        .unwrap_or(PageType::General)
}

/// Strip query/fragment, lowercase, and drop trailing slashes (root stays `/`).
fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_lowercase()
    } else {
        format!("/{}", trimmed.to_lowercase())
    }
}
