use crate::{Ack, ClickTarget, Effect, Msg, PopupBody, PopupController, UpdateMessage};

/// Pure update function: applies a message to the popup store and returns any effects.
pub fn update(mut state: PopupController, msg: Msg) -> (PopupController, Vec<Effect>) {
    let effects = match msg {
        Msg::ContextClick(point) => {
            state.set_anchor(point);
            Vec::new()
        }
        Msg::Scrolled(offset) => {
            state.set_scroll(offset);
            Vec::new()
        }
        Msg::ViewportResized(size) => {
            state.set_viewport(size);
            Vec::new()
        }
        Msg::Incoming(message) => apply_incoming(&mut state, message),
        Msg::PopupMeasured { url, size } => {
            state.apply_measurement(&url, size);
            Vec::new()
        }
        Msg::Click(target) => {
            let mut effects = Vec::new();
            if let ClickTarget::DismissControl(url) = &target {
                if state.dismiss(url, true) {
                    effects.push(Effect::RequestCanceled { url: url.clone() });
                }
            }
            // Clicks elsewhere on a loading popup fall through here as no-ops.
            state.dismiss_outside(&target);
            effects
        }
        Msg::Dismiss {
            url,
            via_explicit_control,
        } => {
            if state.dismiss(&url, via_explicit_control) {
                vec![Effect::RequestCanceled { url }]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_incoming(state: &mut PopupController, message: UpdateMessage) -> Vec<Effect> {
    if message.is_terminal() && state.take_canceled(message.url()) {
        return vec![Effect::Acknowledge(Ack::canceled())];
    }

    let url = match message {
        UpdateMessage::ShowLoading { url } => {
            // A fresh request for this URL supersedes an older cancellation.
            state.take_canceled(&url);
            state.show(&url, PopupBody::Loading);
            url
        }
        UpdateMessage::ShowResult { url, result } => {
            state.show_result(&url, &result);
            url
        }
        UpdateMessage::ShowError { url, error } => {
            state.show_error(&url, &error);
            url
        }
    };

    vec![
        Effect::MeasurePopup { url },
        Effect::Acknowledge(Ack::success()),
    ]
}
