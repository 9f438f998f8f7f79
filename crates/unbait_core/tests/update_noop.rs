use unbait_core::{update, Msg, PopupController};

#[test]
fn update_is_noop() {
    let state = PopupController::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
