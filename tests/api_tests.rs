//! Integration tests for the async convenience API
//!
//! Tests typing, clearing, tab navigation, option selection and the
//! clipboard round trip through a whole session.

use std::sync::Arc;

use ki_user_event::api::{self, TypeOptions};
use ki_user_event::config::SessionSettings;
use ki_user_event::dom::Document;
use ki_user_event::event::EventType;
use ki_user_event::input::{DataTransfer, InputError, MemoryClipboard};
use ki_user_event::Session;

fn session() -> Session {
    Session::new(SessionSettings::default().with_delay(None))
}

fn count(doc: &Document, event_type: EventType) -> usize {
    doc.event_log()
        .iter()
        .filter(|e| e.event_type == event_type)
        .count()
}

const FORM: &str = "<form id='f'>\
    <input id='name'>\
    <input id='mail' type='email'>\
    <select id='color'><option>Red</option><option value='g'>Green</option></select>\
    <button id='send'>Send</button>\
    </form>";

#[tokio::test]
async fn test_type_text_fills_input_and_fires_change_on_blur() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let name = doc.query("#name").unwrap();
    let mail = doc.query("#mail").unwrap();
    doc.enable_event_log();
    let mut session = session();

    api::type_text(&mut session, &mut doc, name, "Ada").await.unwrap();
    assert_eq!(doc.value(name), "Ada");
    assert_eq!(doc.active_element(), Some(name));
    assert_eq!(count(&doc, EventType::Input), 3);
    assert_eq!(count(&doc, EventType::Change), 0);

    api::tab(&mut session, &mut doc, false).await.unwrap();
    assert_eq!(doc.active_element(), Some(mail));
    let change = doc
        .event_log()
        .iter()
        .find(|e| e.event_type == EventType::Change)
        .unwrap();
    assert_eq!(change.target, name);
}

#[tokio::test]
async fn test_type_text_without_click_uses_focused_element() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let name = doc.query("#name").unwrap();
    doc.enable_event_log();
    let mut session = session();
    session.focus_element(&mut doc, name).unwrap();

    let options = TypeOptions {
        skip_click: Some(true),
        ..TypeOptions::default()
    };
    api::type_text_with(&mut session, &mut doc, name, "hi", options)
        .await
        .unwrap();

    assert_eq!(doc.value(name), "hi");
    assert_eq!(count(&doc, EventType::MouseDown), 0);
}

#[tokio::test]
async fn test_keyboard_enter_submits_form_through_button() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let name = doc.query("#name").unwrap();
    let form = doc.query("#f").unwrap();
    let mut session = session();

    api::type_text(&mut session, &mut doc, name, "Ada{Enter}").await.unwrap();

    assert_eq!(doc.submissions(), &[form]);
}

#[tokio::test]
async fn test_prevented_submit_is_not_recorded() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let form = doc.query("#f").unwrap();
    let send = doc.query("#send").unwrap();
    doc.add_event_listener(form, EventType::Submit, |_, event| event.prevent_default());
    let mut session = session();

    api::click(&mut session, &mut doc, send).await.unwrap();

    assert!(doc.submissions().is_empty());
}

#[tokio::test]
async fn test_clear_empties_textarea() {
    let mut doc = Document::from_markup("<textarea>line one\nline two</textarea>").unwrap();
    let textarea = doc.query("textarea").unwrap();
    doc.enable_event_log();
    let mut session = session();

    api::clear(&mut session, &mut doc, textarea).await.unwrap();

    assert_eq!(doc.value(textarea), "");
    let input = doc
        .event_log()
        .iter()
        .find(|e| e.event_type == EventType::Input)
        .unwrap();
    assert_eq!(input.data(), None);
}

#[tokio::test]
async fn test_clear_rejects_disabled_input() {
    let mut doc = Document::from_markup("<input value='x' disabled>").unwrap();
    let input = doc.query("input").unwrap();
    let mut session = session();

    let err = api::clear(&mut session, &mut doc, input).await.unwrap_err();
    assert!(matches!(err, InputError::NotEditable { .. }));
    assert_eq!(doc.value(input), "x");
}

#[tokio::test]
async fn test_shift_tab_walks_backwards() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let name = doc.query("#name").unwrap();
    let send = doc.query("#send").unwrap();
    let mut session = session();
    session.focus_element(&mut doc, name).unwrap();

    api::tab(&mut session, &mut doc, true).await.unwrap();
    assert_ne!(doc.active_element(), Some(name));

    session.focus_element(&mut doc, send).unwrap();
    api::tab(&mut session, &mut doc, true).await.unwrap();
    assert_eq!(doc.active_element(), doc.query("#color"));
    assert!(!session.keyboard().modifiers().get(ki_user_event::Modifier::Shift));
}

#[tokio::test]
async fn test_select_option_by_value() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let color = doc.query("#color").unwrap();
    doc.enable_event_log();
    let mut session = session();

    api::select_options(&mut session, &mut doc, color, &["g"]).await.unwrap();

    assert_eq!(doc.value(color), "g");
    assert_eq!(count(&doc, EventType::Change), 1);
    assert_eq!(doc.active_element(), Some(color));
}

#[tokio::test]
async fn test_selecting_current_option_fires_nothing() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let color = doc.query("#color").unwrap();
    let mut session = session();
    api::select_options(&mut session, &mut doc, color, &["Red"]).await.unwrap();
    doc.enable_event_log();

    api::select_options(&mut session, &mut doc, color, &["Red"]).await.unwrap();

    assert_eq!(count(&doc, EventType::Change), 0);
}

#[tokio::test]
async fn test_unknown_option_is_an_error() {
    let mut doc = Document::from_markup(FORM).unwrap();
    let color = doc.query("#color").unwrap();
    let mut session = session();

    let err = api::select_options(&mut session, &mut doc, color, &["Blue"])
        .await
        .unwrap_err();
    assert!(matches!(err, InputError::OptionNotFound { .. }));
}

#[tokio::test]
async fn test_copy_and_paste_between_inputs() {
    let mut doc = Document::from_markup("<input id='a' value='hello'><input id='b'>").unwrap();
    let a = doc.query("#a").unwrap();
    let b = doc.query("#b").unwrap();
    let clipboard = Arc::new(MemoryClipboard::new());
    let mut session = session().with_clipboard(clipboard.clone());

    session.focus_element(&mut doc, a).unwrap();
    ki_user_event::selection::select(&mut doc, a, 0, 5).unwrap();
    let copied = api::copy(&mut session, &mut doc).await.unwrap();
    assert_eq!(copied.map(|d| d.get_data("text/plain")), Some("hello".to_string()));

    session.focus_element(&mut doc, b).unwrap();
    api::paste(&mut session, &mut doc, None).await.unwrap();
    assert_eq!(doc.value(b), "hello");
    assert_eq!(doc.value(a), "hello");
}

#[tokio::test]
async fn test_paste_with_explicit_data() {
    let mut doc = Document::from_markup("<input>").unwrap();
    let input = doc.query("input").unwrap();
    doc.enable_event_log();
    let mut session = session();
    session.focus_element(&mut doc, input).unwrap();

    api::paste(&mut session, &mut doc, Some(DataTransfer::from_text("pasted")))
        .await
        .unwrap();

    assert_eq!(doc.value(input), "pasted");
    assert_eq!(count(&doc, EventType::Paste), 1);
}

#[tokio::test]
async fn test_prevented_paste_leaves_value() {
    let mut doc = Document::from_markup("<input value='keep'>").unwrap();
    let input = doc.query("input").unwrap();
    doc.add_event_listener(input, EventType::Paste, |_, event| event.prevent_default());
    let mut session = session();
    session.focus_element(&mut doc, input).unwrap();

    api::paste(&mut session, &mut doc, Some(DataTransfer::from_text("x")))
        .await
        .unwrap();

    assert_eq!(doc.value(input), "keep");
}
