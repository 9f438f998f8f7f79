use std::collections::{BTreeMap, BTreeSet};

use crate::view_model::{PageViewModel, PopupView};
use crate::{fit_within_viewport, parse_emphasis, Point, Size, Span};

/// Text shown next to the progress indicator of a loading popup.
pub const LOADING_LABEL: &str = "UnBaiting link...";

/// Side length of the dismiss control square in a loading popup's top-right corner.
pub const DISMISS_CONTROL_SIZE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    Loading,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupBody {
    Loading,
    Result(Vec<Span>),
    Error(String),
}

impl PopupBody {
    pub fn kind(&self) -> PopupKind {
        match self {
            PopupBody::Loading => PopupKind::Loading,
            PopupBody::Result(_) => PopupKind::Result,
            PopupBody::Error(_) => PopupKind::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub url: String,
    /// Top-left corner in page coordinates.
    pub position: Point,
    /// Rendered size, once the host has measured it.
    pub size: Option<Size>,
    pub body: PopupBody,
}

impl Popup {
    pub fn kind(&self) -> PopupKind {
        self.body.kind()
    }

    pub fn is_loading(&self) -> bool {
        self.kind() == PopupKind::Loading
    }

    fn contains(&self, point: Point) -> bool {
        let Some(size) = self.size else {
            return false;
        };
        point.x >= self.position.x
            && point.x < self.position.x + size.width
            && point.y >= self.position.y
            && point.y < self.position.y + size.height
    }

    fn dismiss_control_contains(&self, point: Point) -> bool {
        let Some(size) = self.size else {
            return false;
        };
        if !self.is_loading() {
            return false;
        }
        let right = self.position.x + size.width;
        point.x >= right - DISMISS_CONTROL_SIZE
            && point.x < right
            && point.y >= self.position.y
            && point.y < self.position.y + DISMISS_CONTROL_SIZE
    }
}

/// What a global click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// The dismiss control of the popup for this URL.
    DismissControl(String),
    /// Anywhere else inside the popup for this URL.
    Popup(String),
    /// Outside every popup.
    Outside,
}

/// Per-page popup store: one entry per URL plus the set of canceled URLs.
///
/// All mutation goes through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupController {
    popups: BTreeMap<String, Popup>,
    /// URLs in creation order; later entries sit on top.
    stack: Vec<String>,
    canceled: BTreeSet<String>,
    anchor: Point,
    scroll: Point,
    viewport: Size,
    dirty: bool,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn view(&self) -> PageViewModel {
        PageViewModel {
            popups: self
                .stacked()
                .map(|popup| PopupView {
                    url: popup.url.clone(),
                    kind: popup.kind(),
                    position: popup.position,
                    dismissable: popup.is_loading(),
                    body: popup.body.clone(),
                })
                .collect(),
            canceled_pending: self.canceled.len(),
            dirty: self.dirty,
        }
    }

    pub fn popup(&self, url: &str) -> Option<&Popup> {
        self.popups.get(url)
    }

    pub fn popup_count(&self) -> usize {
        self.popups.len()
    }

    pub fn is_canceled(&self, url: &str) -> bool {
        self.canceled.contains(url)
    }

    /// Resolve a page-space point to the popup (or its dismiss control) under it.
    /// Newer popups cover older ones.
    pub fn hit_test(&self, point: Point) -> ClickTarget {
        for popup in self.stacked().rev() {
            if popup.dismiss_control_contains(point) {
                return ClickTarget::DismissControl(popup.url.clone());
            }
            if popup.contains(point) {
                return ClickTarget::Popup(popup.url.clone());
            }
        }
        ClickTarget::Outside
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_anchor(&mut self, client_point: Point) {
        self.anchor = client_point;
    }

    pub(crate) fn set_scroll(&mut self, scroll: Point) {
        self.scroll = scroll;
    }

    pub(crate) fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.refit_all();
    }

    /// Insert or transform the popup for `url`. Returns true if the popup is new.
    pub(crate) fn show(&mut self, url: &str, body: PopupBody) -> bool {
        self.dirty = true;
        if let Some(popup) = self.popups.get_mut(url) {
            popup.body = body;
            return false;
        }
        let position = self.anchor.offset_by(self.scroll);
        self.stack.push(url.to_string());
        self.popups.insert(
            url.to_string(),
            Popup {
                url: url.to_string(),
                position,
                size: None,
                body,
            },
        );
        true
    }

    pub(crate) fn show_result(&mut self, url: &str, text: &str) -> bool {
        self.show(url, PopupBody::Result(parse_emphasis(text)))
    }

    pub(crate) fn show_error(&mut self, url: &str, message: &str) -> bool {
        self.show(url, PopupBody::Error(format!("Error: {message}")))
    }

    pub(crate) fn apply_measurement(&mut self, url: &str, size: Size) {
        let (viewport, scroll) = (self.viewport, self.scroll);
        if let Some(popup) = self.popups.get_mut(url) {
            popup.size = Some(size);
            popup.position = fit_within_viewport(popup.position, size, viewport, scroll);
            self.dirty = true;
        }
    }

    /// Remove the popup for `url`. Returns true if a loading popup was canceled.
    pub(crate) fn dismiss(&mut self, url: &str, via_explicit_control: bool) -> bool {
        let Some(popup) = self.popups.remove(url) else {
            return false;
        };
        self.stack.retain(|stacked| stacked != url);
        self.dirty = true;
        if popup.is_loading() && via_explicit_control {
            self.canceled.insert(url.to_string());
            return true;
        }
        false
    }

    /// Drop every non-loading popup that does not own the click target.
    pub(crate) fn dismiss_outside(&mut self, target: &ClickTarget) {
        let clicked_url = match target {
            ClickTarget::DismissControl(url) | ClickTarget::Popup(url) => Some(url.as_str()),
            ClickTarget::Outside => None,
        };
        let before = self.popups.len();
        self.popups
            .retain(|url, popup| popup.is_loading() || Some(url.as_str()) == clicked_url);
        if self.popups.len() != before {
            let popups = &self.popups;
            self.stack.retain(|url| popups.contains_key(url));
            self.dirty = true;
        }
    }

    /// Consume the canceled marker for `url`, if any.
    pub(crate) fn take_canceled(&mut self, url: &str) -> bool {
        self.canceled.remove(url)
    }

    fn stacked(&self) -> impl DoubleEndedIterator<Item = &Popup> + '_ {
        self.stack.iter().filter_map(|url| self.popups.get(url))
    }

    fn refit_all(&mut self) {
        let (viewport, scroll) = (self.viewport, self.scroll);
        for popup in self.popups.values_mut() {
            if let Some(size) = popup.size {
                popup.position = fit_within_viewport(popup.position, size, viewport, scroll);
            }
        }
        self.dirty = true;
    }
}
