//! Overlay view model and its HTML rendering.

use serde::Serialize;

use super::layout::PanelPosition;
use super::page::PageType;

/// Stable id of the overlay root element, for styling hooks.
pub const OVERLAY_ROOT_ID: &str = "tutorial-overlay";

const NEXT_LABEL: &str = "Next";
const FINISH_LABEL: &str = "Finish";

/// Everything the host needs to draw the panel for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    pub page_type: PageType,
    pub step_key: String,
    pub title: String,
    pub body: String,
    /// 1-based.
    pub step_number: usize,
    pub total_steps: usize,
    pub show_previous: bool,
    pub next_label: &'static str,
    pub position: PanelPosition,
}

impl OverlayView {
    pub fn next_label_for(index: usize, total: usize) -> &'static str {
        if index + 1 >= total {
            FINISH_LABEL
        } else {
            NEXT_LABEL
        }
    }

    /// "Step X of N".
    pub fn indicator(&self) -> String {
        format!("Step {} of {}", self.step_number, self.total_steps)
    }

    pub fn is_last_step(&self) -> bool {
        self.step_number == self.total_steps
    }
}

/// Render the overlay subtree as an HTML fragment.
pub fn render_html(view: &OverlayView) -> String {
    let (panel_class, panel_style) = match view.position {
        PanelPosition::Centered => (
            "tutorial-panel tutorial-panel--centered",
            "top:50%;left:50%;transform:translate(-50%,-50%)".to_string(),
        ),
        PanelPosition::Anchored { top, left } => (
            "tutorial-panel",
            format!("top:{top:.0}px;left:{left:.0}px;transform:none"),
        ),
    };
    let prev_hidden = if view.show_previous { "" } else { " hidden" };

    format!(
        concat!(
            r#"<div id="{root}" class="tutorial-overlay" data-page-type="{page}" data-step="{key}">"#,
            r#"<div class="tutorial-backdrop"></div>"#,
            r#"<div class="{panel_class}" style="{panel_style}" role="dialog" aria-live="polite">"#,
            r#"<div class="tutorial-progress">{indicator}</div>"#,
            r#"<h3 class="tutorial-title">{title}</h3>"#,
            r#"<p class="tutorial-body">{body}</p>"#,
            r#"<div class="tutorial-controls">"#,
            r#"<button type="button" id="tutorial-skip" class="tutorial-btn tutorial-btn--link">Skip tour</button>"#,
            r#"<button type="button" id="tutorial-prev" class="tutorial-btn"{prev_hidden}>Previous</button>"#,
            r#"<button type="button" id="tutorial-next" class="tutorial-btn tutorial-btn--primary">{next}</button>"#,
            r#"</div></div></div>"#
        ),
        root = OVERLAY_ROOT_ID,
        page = view.page_type,
        key = escape_html(&view.step_key),
        panel_class = panel_class,
        panel_style = panel_style,
        indicator = view.indicator(),
        title = escape_html(&view.title),
        body = escape_html(&view.body),
        prev_hidden = prev_hidden,
        next = view.next_label,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
