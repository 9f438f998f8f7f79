use crate::{Point, PopupBody, PopupKind};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageViewModel {
    pub popups: Vec<PopupView>,
    /// Canceled URLs still waiting for their terminal update.
    pub canceled_pending: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub url: String,
    pub kind: PopupKind,
    pub position: Point,
    /// Loading popups carry an explicit dismiss control.
    pub dismissable: bool,
    pub body: PopupBody,
}
