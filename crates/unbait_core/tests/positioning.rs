use unbait_core::{
    update, ClickTarget, Msg, Point, PopupController, Size, UpdateMessage, DISMISS_CONTROL_SIZE,
};

const URL: &str = "https://example.com/l";

fn shown_at(click: Point, viewport: Size) -> PopupController {
    let state = PopupController::with_viewport(viewport);
    let (state, _) = update(state, Msg::ContextClick(click));
    let (state, _) = update(
        state,
        Msg::Incoming(UpdateMessage::ShowLoading { url: URL.into() }),
    );
    state
}

#[test]
fn popup_opens_at_last_context_click_plus_scroll() {
    let state = PopupController::with_viewport(Size::new(1000, 800));
    let (state, _) = update(state, Msg::Scrolled(Point::new(0, 300)));
    let (state, _) = update(state, Msg::ContextClick(Point::new(40, 60)));
    let (state, _) = update(
        state,
        Msg::Incoming(UpdateMessage::ShowLoading { url: URL.into() }),
    );
    assert_eq!(state.popup(URL).unwrap().position, Point::new(40, 360));
}

#[test]
fn measured_result_popup_is_pulled_inside_viewport() {
    let state = shown_at(Point::new(800, 20), Size::new(1000, 800));
    let (state, _) = update(
        state,
        Msg::Incoming(UpdateMessage::ShowResult {
            url: URL.into(),
            result: "answer".into(),
        }),
    );
    let (state, _) = update(
        state,
        Msg::PopupMeasured {
            url: URL.into(),
            size: Size::new(220, 150),
        },
    );
    assert_eq!(state.popup(URL).unwrap().position, Point::new(770, 20));
}

#[test]
fn hit_test_finds_dismiss_control_and_body() {
    let state = shown_at(Point::new(100, 100), Size::new(1000, 800));
    let (state, _) = update(
        state,
        Msg::PopupMeasured {
            url: URL.into(),
            size: Size::new(200, 60),
        },
    );

    let control = Point::new(100 + 200 - DISMISS_CONTROL_SIZE / 2, 105);
    assert_eq!(
        state.hit_test(control),
        ClickTarget::DismissControl(URL.into())
    );
    assert_eq!(
        state.hit_test(Point::new(110, 140)),
        ClickTarget::Popup(URL.into())
    );
    assert_eq!(state.hit_test(Point::new(5, 5)), ClickTarget::Outside);
}

#[test]
fn unmeasured_popup_is_never_hit() {
    let state = shown_at(Point::new(100, 100), Size::new(1000, 800));
    assert_eq!(state.hit_test(Point::new(100, 100)), ClickTarget::Outside);
}

fn measured(state: PopupController, url: &str, size: Size) -> PopupController {
    let (state, _) = update(state, Msg::PopupMeasured { url: url.into(), size });
    state
}

#[test]
fn newest_popup_is_on_top_of_older_ones() {
    let older = "https://a.example/first";
    let newer = "https://b.example/second";
    let state = PopupController::with_viewport(Size::new(1000, 800));
    let (state, _) = update(state, Msg::ContextClick(Point::new(100, 100)));
    let (state, _) = update(
        state,
        Msg::Incoming(UpdateMessage::ShowLoading { url: older.into() }),
    );
    let (state, _) = update(
        state,
        Msg::Incoming(UpdateMessage::ShowLoading { url: newer.into() }),
    );
    let state = measured(state, older, Size::new(200, 60));
    let state = measured(state, newer, Size::new(200, 60));

    let body = Point::new(110, 140);
    assert_eq!(state.hit_test(body), ClickTarget::Popup(newer.into()));
    let drawn: Vec<_> = state.view().popups.into_iter().map(|p| p.url).collect();
    assert_eq!(drawn, vec![older.to_string(), newer.to_string()]);

    let (state, _) = update(
        state,
        Msg::Dismiss {
            url: newer.into(),
            via_explicit_control: false,
        },
    );
    assert_eq!(state.hit_test(body), ClickTarget::Popup(older.into()));
}
