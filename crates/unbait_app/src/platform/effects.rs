use unbait_core::{Ack, Effect, Msg, PopupController};
use unbait_logging::{unbait_debug, unbait_info};

use super::ui;

/// Result of executing the effects of one update.
#[derive(Debug, Default)]
pub(crate) struct EffectOutcome {
    /// Reply owed to the sender of the incoming update, if any.
    pub ack: Option<Ack>,
    pub follow_up: Vec<Msg>,
}

pub(crate) fn run_effects(state: &PopupController, effects: Vec<Effect>) -> EffectOutcome {
    let mut outcome = EffectOutcome::default();
    for effect in effects {
        match effect {
            Effect::Acknowledge(ack) => {
                outcome.ack = Some(ack);
            }
            Effect::MeasurePopup { url } => {
                if let Some(popup) = state.popup(&url) {
                    let size = ui::render::measure(&popup.body);
                    unbait_debug!("Measured popup for {}: {}x{}", url, size.width, size.height);
                    outcome.follow_up.push(Msg::PopupMeasured { url, size });
                }
            }
            Effect::RequestCanceled { url } => {
                // The background request keeps running; its result is dropped on arrival.
                unbait_info!("Canceled popup for {}", url);
            }
        }
    }
    outcome
}
