use crate::{ClickTarget, Point, Size, UpdateMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Right-click (or equivalent gesture) at a viewport-relative point.
    ContextClick(Point),
    /// Page scroll offset changed.
    Scrolled(Point),
    /// Viewport was resized.
    ViewportResized(Size),
    /// Update delivered by the orchestrator; always answered with an ack.
    Incoming(UpdateMessage),
    /// Host measured the rendered box of a popup.
    PopupMeasured { url: String, size: Size },
    /// Global click, already resolved to a target.
    Click(ClickTarget),
    /// Programmatic dismissal of a single popup.
    Dismiss {
        url: String,
        via_explicit_control: bool,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
