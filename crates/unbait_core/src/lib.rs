//! UnBait core: pure popup state machine, message contract and view-model helpers.
mod effect;
mod geometry;
mod markup;
mod message;
mod msg;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::Effect;
pub use geometry::{fit_within_viewport, Point, Size, VIEWPORT_MARGIN};
pub use markup::{escape_html, parse_emphasis, render_html, Span};
pub use message::{Ack, AckStatus, UpdateMessage};
pub use msg::Msg;
pub use state::{
    ClickTarget, Popup, PopupBody, PopupController, PopupKind, DISMISS_CONTROL_SIZE,
    LOADING_LABEL,
};
pub use status::RequestStatus;
pub use update::update;
pub use view_model::{PageViewModel, PopupView};
