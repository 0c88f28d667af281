//! Panel geometry: where the overlay panel goes for a given step.

use serde::Serialize;

use super::script::Placement;

/// A bounding box in viewport coordinates (px).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// A width/height pair (px), used for the viewport and the panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Resolved panel position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PanelPosition {
    /// Centered in the viewport via a translate transform.
    Centered,
    /// Absolute top-left corner; no centering transform.
    Anchored { top: f64, left: f64 },
}

/// Compute where the panel goes.
///
/// `Center` placement or a missing target keeps the panel centered. Otherwise
/// the panel sits `gap` px from the target on the requested side and is
/// clamped so it stays `margin` px inside the viewport.
pub fn position_panel(
    placement: Placement,
    target: Option<Rect>,
    panel: Size,
    viewport: Size,
    gap: f64,
    margin: f64,
) -> PanelPosition {
    let Some(target) = target else {
        return PanelPosition::Centered;
    };

    let (top, left) = match placement {
        Placement::Center => return PanelPosition::Centered,
        Placement::Top => (
            target.top - panel.height - gap,
            target.center_x() - panel.width / 2.0,
        ),
        Placement::Bottom => (
            target.bottom() + gap,
            target.center_x() - panel.width / 2.0,
        ),
        Placement::Left => (
            target.center_y() - panel.height / 2.0,
            target.left - panel.width - gap,
        ),
        Placement::Right => (
            target.center_y() - panel.height / 2.0,
            target.right() + gap,
        ),
    };

    PanelPosition::Anchored {
        top: clamp_axis(top, panel.height, viewport.height, margin),
        left: clamp_axis(left, panel.width, viewport.width, margin),
    }
}

/// Keep `[start, start + size]` within `[margin, extent - margin]`. When the
/// panel is larger than the space available, pin it to the leading margin.
fn clamp_axis(start: f64, size: f64, extent: f64, margin: f64) -> f64 {
    let max = extent - size - margin;
    start.min(max).max(margin)
}
