//! Integration tests for the pointer device host

use ki_user_event::config::SessionSettings;
use ki_user_event::dom::{Document, NodeId};
use ki_user_event::event::EventType;
use ki_user_event::input::keymap::pointer_key;
use ki_user_event::input::pointer::{PointerAction, PointerEventsCheck, PointerPosition};
use ki_user_event::input::InputError;
use ki_user_event::{api, Session};

fn session() -> Session {
    Session::new(SessionSettings::default().with_delay(None))
}

fn details(doc: &Document, event_type: EventType) -> Vec<u32> {
    doc.event_log()
        .iter()
        .filter(|e| e.event_type == event_type)
        .map(|e| e.detail())
        .collect()
}

fn button_doc() -> (Document, NodeId) {
    let doc = Document::from_markup("<div id='wrap'><button id='go'>Go</button></div>").unwrap();
    let button = doc.query("#go").unwrap();
    (doc, button)
}

#[tokio::test]
async fn test_click_count_cycles_one_two_three() {
    let (mut doc, button) = button_doc();
    doc.enable_event_log();
    let mut session = session();

    api::triple_click(&mut session, &mut doc, button).await.unwrap();

    assert_eq!(details(&doc, EventType::MouseDown), vec![1, 2, 3]);
    assert_eq!(details(&doc, EventType::MouseUp), vec![1, 2, 3]);
    assert_eq!(details(&doc, EventType::Click), vec![1, 2, 3]);
    assert_eq!(details(&doc, EventType::DblClick), vec![2]);

    let types: Vec<EventType> = doc.event_log().iter().map(|e| e.event_type).collect();
    let dbl = types.iter().position(|t| *t == EventType::DblClick).unwrap();
    let clicks: Vec<usize> = types
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == EventType::Click)
        .map(|(i, _)| i)
        .collect();
    assert!(clicks[1] < dbl && dbl < clicks[2]);
}

#[tokio::test]
async fn test_separate_clicks_do_not_accumulate() {
    let (mut doc, button) = button_doc();
    doc.enable_event_log();
    let mut session = session();

    api::click(&mut session, &mut doc, button).await.unwrap();
    api::click(&mut session, &mut doc, button).await.unwrap();

    assert_eq!(details(&doc, EventType::Click), vec![1, 1]);
    assert!(details(&doc, EventType::DblClick).is_empty());
}

#[tokio::test]
async fn test_other_button_restarts_count() {
    let (mut doc, button) = button_doc();
    doc.enable_event_log();
    let mut session = session();

    let actions = [PointerAction::keys_on("[MouseLeft][MouseRight][MouseLeft]", button)];
    api::pointer(&mut session, &mut doc, &actions).await.unwrap();

    assert_eq!(details(&doc, EventType::MouseDown), vec![1, 1, 1]);
}

#[tokio::test]
async fn test_secondary_button_fires_contextmenu_only() {
    let (mut doc, button) = button_doc();
    doc.enable_event_log();
    let mut session = session();

    let actions = [PointerAction::keys_on("[MouseRight]", button)];
    api::pointer(&mut session, &mut doc, &actions).await.unwrap();

    let types: Vec<EventType> = doc.event_log().iter().map(|e| e.event_type).collect();
    assert_eq!(
        types.iter().filter(|t| **t == EventType::ContextMenu).count(),
        1
    );
    assert!(!types.contains(&EventType::Click));
    assert!(!types.contains(&EventType::DblClick));
    let mousedown = types.iter().position(|t| *t == EventType::MouseDown).unwrap();
    let contextmenu = types.iter().position(|t| *t == EventType::ContextMenu).unwrap();
    assert!(mousedown < contextmenu);
}

#[tokio::test]
async fn test_buttons_bitmask_while_held() {
    let (mut doc, button) = button_doc();
    doc.enable_event_log();
    let mut session = session();

    let actions = [PointerAction::keys_on("[MouseLeft>][MouseRight>]", button)];
    api::pointer(&mut session, &mut doc, &actions).await.unwrap();

    let downs: Vec<u16> = doc
        .event_log()
        .iter()
        .filter(|e| e.event_type == EventType::MouseDown)
        .map(|e| e.buttons())
        .collect();
    assert_eq!(downs, vec![1, 3]);
}

#[tokio::test]
async fn test_hover_enters_outermost_first() {
    let (mut doc, button) = button_doc();
    let wrap = doc.query("#wrap").unwrap();
    doc.enable_event_log();
    let mut session = session();

    api::hover(&mut session, &mut doc, button).await.unwrap();
    let entered: Vec<NodeId> = doc
        .event_log()
        .iter()
        .filter(|e| e.event_type == EventType::MouseEnter)
        .map(|e| e.target)
        .collect();
    let wrap_index = entered.iter().position(|n| *n == wrap).unwrap();
    let button_index = entered.iter().position(|n| *n == button).unwrap();
    assert!(wrap_index < button_index);

    doc.take_event_log();
    api::unhover(&mut session, &mut doc, button).await.unwrap();
    let left: Vec<NodeId> = doc
        .event_log()
        .iter()
        .filter(|e| e.event_type == EventType::MouseLeave)
        .map(|e| e.target)
        .collect();
    assert_eq!(left, vec![button, wrap]);
}

#[tokio::test]
async fn test_pointer_events_none_fails_the_gesture() {
    let mut doc =
        Document::from_markup("<div style='pointer-events: none'><button>x</button></div>").unwrap();
    let button = doc.query("button").unwrap();
    let mut session = session();

    let err = api::click(&mut session, &mut doc, button).await.unwrap_err();
    match err {
        InputError::PointerEventsNone { inherited_from, .. } => {
            assert_eq!(inherited_from.as_deref(), Some("div"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut unchecked = Session::new(
        SessionSettings::default()
            .with_delay(None)
            .with_pointer_events_check(PointerEventsCheck::Never),
    );
    assert!(api::click(&mut unchecked, &mut doc, button).await.is_ok());
}

#[tokio::test]
async fn test_each_target_checks_element_once() {
    let (mut doc, button) = button_doc();
    let mut session = Session::new(
        SessionSettings::default()
            .with_delay(None)
            .with_pointer_events_check(PointerEventsCheck::EachTarget),
    );

    api::click(&mut session, &mut doc, button).await.unwrap();
    let after_first = doc.style_lookups();
    api::click(&mut session, &mut doc, button).await.unwrap();
    api::dbl_click(&mut session, &mut doc, button).await.unwrap();
    assert_eq!(doc.style_lookups(), after_first);

    session.pointer_guard_mut().invalidate(Some(button));
    api::click(&mut session, &mut doc, button).await.unwrap();
    assert!(doc.style_lookups() > after_first);
}

#[tokio::test]
async fn test_each_api_call_rechecks_per_call() {
    let (mut doc, button) = button_doc();
    let mut session = session();

    api::click(&mut session, &mut doc, button).await.unwrap();
    let after_first = doc.style_lookups();
    api::click(&mut session, &mut doc, button).await.unwrap();
    assert!(doc.style_lookups() > after_first);
}

#[test]
fn test_touch_contacts_share_primacy() {
    let (mut doc, button) = button_doc();
    doc.enable_event_log();
    let mut session = Session::default();
    let a = pointer_key("TouchA").unwrap();
    let b = pointer_key("TouchB").unwrap();

    session.pointer_press(&mut doc, a, PointerPosition::at(button)).unwrap();
    session.pointer_press(&mut doc, b, PointerPosition::at(button)).unwrap();

    let downs: Vec<(Option<u32>, bool)> = doc
        .event_log()
        .iter()
        .filter(|e| e.event_type == EventType::PointerDown)
        .map(|e| (e.init.pointer_id, e.init.is_primary))
        .collect();
    assert_eq!(downs.len(), 2);
    assert!(downs[0].1);
    assert!(!downs[1].1);
    assert_ne!(downs[0].0, downs[1].0);

    // a multitouch contact produces no compatibility mouse events
    doc.take_event_log();
    session.pointer_release(&mut doc, a, PointerPosition::at(button)).unwrap();
    assert!(!doc
        .event_log()
        .iter()
        .any(|e| e.event_type == EventType::Click));
}

#[test]
fn test_moving_unknown_pointer_is_an_error() {
    let (mut doc, button) = button_doc();
    let mut session = Session::default();

    let err = session
        .pointer_move(&mut doc, "TouchZ", PointerPosition::at(button))
        .unwrap_err();
    assert!(matches!(err, InputError::UnknownPointer { .. }));
}

#[tokio::test]
async fn test_mouse_down_focuses_closest_focusable() {
    let mut doc = Document::from_markup("<button id='b'><span id='s'>label</span></button><p>x</p>").unwrap();
    let span = doc.query("#s").unwrap();
    let button = doc.query("#b").unwrap();
    let p = doc.query("p").unwrap();
    let mut session = session();

    api::click(&mut session, &mut doc, span).await.unwrap();
    assert_eq!(doc.active_element(), Some(button));

    api::click(&mut session, &mut doc, p).await.unwrap();
    assert_eq!(doc.active_element(), None);
}

#[tokio::test]
async fn test_click_after_offset_on_other_element() {
    let mut doc = Document::from_markup("<p>long paragraph</p><input value='ab'>").unwrap();
    let p = doc.query("p").unwrap();
    let input = doc.query("input").unwrap();
    let mut session = session();

    let actions = [PointerAction::Keys {
        keys: "[MouseLeft]".to_string(),
        position: PointerPosition::at(p).with_offset(10),
    }];
    api::pointer(&mut session, &mut doc, &actions).await.unwrap();
    api::click(&mut session, &mut doc, input).await.unwrap();

    assert_eq!(doc.active_element(), Some(input));
    let left = pointer_key("MouseLeft").unwrap();
    assert!(!session.pointer().is_key_pressed(left));
}

#[tokio::test]
async fn test_drag_from_control_onto_other_element() {
    let mut doc = Document::from_markup("<textarea>hello</textarea><p>x</p>").unwrap();
    let textarea = doc.query("textarea").unwrap();
    let p = doc.query("p").unwrap();
    let mut session = session();

    let actions = [
        PointerAction::Keys {
            keys: "[MouseLeft>]".to_string(),
            position: PointerPosition::at(textarea).with_offset(5),
        },
        PointerAction::move_to(p),
        PointerAction::Keys {
            keys: "[/MouseLeft]".to_string(),
            position: PointerPosition::default(),
        },
    ];
    api::pointer(&mut session, &mut doc, &actions).await.unwrap();

    assert_eq!(doc.active_element(), Some(textarea));
    let left = pointer_key("MouseLeft").unwrap();
    assert!(!session.pointer().is_key_pressed(left));

    api::click(&mut session, &mut doc, p).await.unwrap();
    assert_eq!(doc.active_element(), None);
    assert!(!session.pointer().is_key_pressed(left));
}
