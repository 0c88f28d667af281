//! Host page seam — the DOM the engine reads from and draws into.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::layout::{Rect, Size};
use super::overlay::{self, OverlayView};

/// What the engine needs from the page it runs on.
///
/// Every method is infallible: a selector that matches nothing is `None`,
/// and drawing operations on a page without the relevant element are no-ops.
pub trait HostPage: Send + Sync {
    /// Current navigation path, e.g. `/goals/detail/42`.
    fn path(&self) -> String;

    /// Raw embedded user JSON (carrying `created_at`), if rendered.
    fn embedded_user_json(&self) -> Option<String>;

    /// Bounding box of the first element matching `selector`.
    fn element_rect(&self, selector: &str) -> Option<Rect>;

    fn has_element(&self, selector: &str) -> bool {
        self.element_rect(selector).is_some()
    }

    fn viewport(&self) -> Size;

    /// Rendered size of the overlay panel.
    fn panel_size(&self) -> Size;

    /// Insert the overlay root and backdrop.
    fn mount_overlay(&self);

    /// Redraw the panel for a step.
    fn render_overlay(&self, view: &OverlayView);

    /// Remove the overlay subtree.
    fn unmount_overlay(&self);

    /// Decorate the element matching `selector`.
    fn highlight(&self, selector: &str);

    /// Remove any highlight decoration.
    fn clear_highlight(&self);

    /// Smooth-scroll the element matching `selector` to the viewport center.
    fn scroll_into_view(&self, selector: &str);
}

/// Side effects recorded by [`VirtualPage`].
#[derive(Debug, Default)]
struct PageEffects {
    mounted: bool,
    mount_count: usize,
    view: Option<OverlayView>,
    html: Option<String>,
    highlighted: Option<String>,
    scrolled: Vec<String>,
}

/// An in-memory page: a path, a set of elements with fixed rects, and a
/// record of what the engine drew.
#[derive(Debug)]
pub struct VirtualPage {
    path: String,
    user_json: Option<String>,
    elements: HashMap<String, Rect>,
    viewport: Size,
    panel: Size,
    effects: Mutex<PageEffects>,
}

impl VirtualPage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user_json: None,
            elements: HashMap::new(),
            viewport: Size::new(1280.0, 800.0),
            panel: Size::new(360.0, 220.0),
            effects: Mutex::new(PageEffects::default()),
        }
    }

    pub fn with_element(mut self, selector: impl Into<String>, rect: Rect) -> Self {
        self.elements.insert(selector.into(), rect);
        self
    }

    pub fn with_user_json(mut self, json: impl Into<String>) -> Self {
        self.user_json = Some(json.into());
        self
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    /// Whether the overlay is currently mounted.
    pub fn overlay_mounted(&self) -> bool {
        self.effects().mounted
    }

    /// Last rendered step, while mounted.
    pub fn overlay(&self) -> Option<OverlayView> {
        let effects = self.effects();
        if effects.mounted {
            effects.view.clone()
        } else {
            None
        }
    }

    pub fn overlay_html(&self) -> Option<String> {
        let effects = self.effects();
        if effects.mounted {
            effects.html.clone()
        } else {
            None
        }
    }

    /// How many times an overlay has been mounted on this page.
    pub fn mount_count(&self) -> usize {
        self.effects().mount_count
    }

    pub fn highlighted(&self) -> Option<String> {
        self.effects().highlighted.clone()
    }

    pub fn scroll_history(&self) -> Vec<String> {
        self.effects().scrolled.clone()
    }

    fn effects(&self) -> MutexGuard<'_, PageEffects> {
        self.effects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostPage for VirtualPage {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn embedded_user_json(&self) -> Option<String> {
        self.user_json.clone()
    }

    fn element_rect(&self, selector: &str) -> Option<Rect> {
        self.elements.get(selector).copied()
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn panel_size(&self) -> Size {
        self.panel
    }

    fn mount_overlay(&self) {
        let mut effects = self.effects();
        if !effects.mounted {
            effects.mounted = true;
            effects.mount_count += 1;
        }
    }

    fn render_overlay(&self, view: &OverlayView) {
        let mut effects = self.effects();
        effects.html = Some(overlay::render_html(view));
        effects.view = Some(view.clone());
    }

    fn unmount_overlay(&self) {
        let mut effects = self.effects();
        effects.mounted = false;
        effects.view = None;
        effects.html = None;
    }

    fn highlight(&self, selector: &str) {
        if self.elements.contains_key(selector) {
            self.effects().highlighted = Some(selector.to_string());
        }
    }

    fn clear_highlight(&self) {
        self.effects().highlighted = None;
    }

    fn scroll_into_view(&self, selector: &str) {
        if self.elements.contains_key(selector) {
            self.effects().scrolled.push(selector.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_lookup_and_effects() {
        let page = VirtualPage::new("/dashboard")
            .with_element(".goal-card", Rect::new(10.0, 10.0, 100.0, 50.0));

        assert!(page.has_element(".goal-card"));
        assert!(!page.has_element(".missing"));

        page.highlight(".missing");
        assert!(page.highlighted().is_none());

        page.highlight(".goal-card");
        page.scroll_into_view(".goal-card");
        assert_eq!(page.highlighted().as_deref(), Some(".goal-card"));
        assert_eq!(page.scroll_history(), vec![".goal-card".to_string()]);

        page.clear_highlight();
        assert!(page.highlighted().is_none());
    }

    #[test]
    fn mount_is_counted_once_until_unmounted() {
        let page = VirtualPage::new("/");
        page.mount_overlay();
        page.mount_overlay();
        assert_eq!(page.mount_count(), 1);
        assert!(page.overlay_mounted());

        page.unmount_overlay();
        assert!(!page.overlay_mounted());
        assert!(page.overlay_html().is_none());

        page.mount_overlay();
        assert_eq!(page.mount_count(), 2);
    }
}
