//! Integration tests for the keyboard device

use ki_user_event::dom::Document;
use ki_user_event::event::EventType;
use ki_user_event::input::Modifier;
use ki_user_event::Session;

fn key_events(doc: &Document) -> Vec<(EventType, String)> {
    doc.event_log()
        .iter()
        .filter(|e| matches!(e.event_type, EventType::KeyDown | EventType::KeyUp))
        .map(|e| (e.event_type, e.key().unwrap_or_default().to_string()))
        .collect()
}

#[test]
fn test_modifier_symmetry() {
    for (name, modifier) in [
        ("Shift", Modifier::Shift),
        ("Control", Modifier::Control),
        ("Alt", Modifier::Alt),
        ("Meta", Modifier::Meta),
    ] {
        let mut doc = Document::new();
        doc.enable_event_log();
        let mut session = Session::default();
        let key = session.key_map().resolve_key(name);

        session.keyboard_press(&mut doc, &key).unwrap();
        assert!(session.keyboard().modifiers().get(modifier), "{name} active");
        session.keyboard_release(&mut doc, &key).unwrap();
        assert!(!session.keyboard().modifiers().get(modifier), "{name} released");

        let log = doc.event_log();
        let down = log.iter().find(|e| e.event_type == EventType::KeyDown).unwrap();
        let up = log.iter().find(|e| e.event_type == EventType::KeyUp).unwrap();
        assert!(down.get_modifier_state(name), "keydown of {name} carries it");
        assert!(!up.get_modifier_state(name), "keyup of {name} no longer carries it");
    }
}

#[test]
fn test_modifier_applies_to_keys_typed_while_held() {
    let mut doc = Document::new();
    doc.enable_event_log();
    let mut session = Session::default();

    session.type_keys(&mut doc, "{Shift>}a{/Shift}b").unwrap();
    let log = doc.event_log();
    let a = log
        .iter()
        .find(|e| e.event_type == EventType::KeyDown && e.key() == Some("a"))
        .unwrap();
    let b = log
        .iter()
        .find(|e| e.event_type == EventType::KeyDown && e.key() == Some("b"))
        .unwrap();
    assert!(a.shift_key());
    assert!(!b.shift_key());
}

#[test]
fn test_caps_lock_toggles_once_per_press() {
    let mut doc = Document::new();
    let mut session = Session::default();

    session.type_keys(&mut doc, "{CapsLock}").unwrap();
    assert!(session.keyboard().modifiers().get(Modifier::CapsLock));

    session.type_keys(&mut doc, "{CapsLock}").unwrap();
    assert!(!session.keyboard().modifiers().get(Modifier::CapsLock));
}

#[test]
fn test_caps_lock_stays_active_after_release() {
    let mut doc = Document::new();
    doc.enable_event_log();
    let mut session = Session::default();

    session.type_keys(&mut doc, "{CapsLock}a").unwrap();
    let a = doc
        .event_log()
        .iter()
        .find(|e| e.event_type == EventType::KeyDown && e.key() == Some("a"))
        .unwrap();
    assert!(a.get_modifier_state("CapsLock"));
}

#[test]
fn test_alt_graph_companion_events() {
    let mut doc = Document::new();
    doc.enable_event_log();
    let mut session = Session::default();

    session.type_keys(&mut doc, "{AltGraph}").unwrap();
    assert_eq!(
        key_events(&doc),
        vec![
            (EventType::KeyDown, "Control".to_string()),
            (EventType::KeyDown, "AltGraph".to_string()),
            (EventType::KeyUp, "AltGraph".to_string()),
            (EventType::KeyUp, "Control".to_string()),
        ]
    );
    assert!(session.keyboard().pressed_keys().is_empty());
}

#[test]
fn test_keypress_only_for_printable_unmodified_keys() {
    let mut doc = Document::new();
    doc.enable_event_log();
    let mut session = Session::default();

    session.type_keys(&mut doc, "a{Enter}{Control>}b{/Control}{Escape}").unwrap();
    let presses: Vec<(String, u32)> = doc
        .event_log()
        .iter()
        .filter(|e| e.event_type == EventType::KeyPress)
        .map(|e| (e.key().unwrap_or_default().to_string(), e.init.char_code))
        .collect();
    assert_eq!(presses, vec![("a".to_string(), 97), ("Enter".to_string(), 13)]);
}

#[test]
fn test_prevented_keydown_skips_keypress_and_input() {
    let mut doc = Document::from_markup("<input>").unwrap();
    let input = doc.query("input").unwrap();
    doc.add_event_listener(input, EventType::KeyDown, |_, event| event.prevent_default());
    doc.enable_event_log();
    let mut session = Session::default();
    session.focus_element(&mut doc, input).unwrap();

    session.type_keys(&mut doc, "x").unwrap();
    assert_eq!(doc.value(input), "");
    assert!(!doc
        .event_log()
        .iter()
        .any(|e| matches!(e.event_type, EventType::KeyPress | EventType::Input)));
}

#[test]
fn test_invalid_descriptor_fires_nothing() {
    let mut doc = Document::new();
    doc.enable_event_log();
    let mut session = Session::default();

    assert!(session.type_keys(&mut doc, "a{Shift").is_err());
    assert!(doc.event_log().is_empty());
}

#[test]
fn test_tab_moves_focus_in_order() {
    let mut doc =
        Document::from_markup("<input id='a'><button id='b'>b</button><input id='c' tabindex='-1'>")
            .unwrap();
    let a = doc.query("#a").unwrap();
    let b = doc.query("#b").unwrap();
    let mut session = Session::default();

    session.type_keys(&mut doc, "{Tab}").unwrap();
    assert_eq!(doc.active_element(), Some(a));
    session.type_keys(&mut doc, "{Tab}").unwrap();
    assert_eq!(doc.active_element(), Some(b));
    session.type_keys(&mut doc, "{Shift>}{Tab}{/Shift}").unwrap();
    assert_eq!(doc.active_element(), Some(a));
}
