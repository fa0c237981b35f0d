//! Convenience API for ki-user-event
//!
//! Async wrappers that drive the keyboard, the pointer host and the edit
//! engine the way a user would: hover before a click, click before typing,
//! pause between steps. Every function starts a new API call for the
//! pointer-events guard.
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::{api, dom::Document, Session};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut doc = Document::from_markup("<input id='name'>").unwrap();
//! let input = doc.query("#name").unwrap();
//! let mut session = Session::default();
//!
//! api::type_text(&mut session, &mut doc, input, "Hello").await.unwrap();
//! assert_eq!(doc.value(input), "Hello");
//! # }
//! ```

mod clipboard;
mod select;

pub use clipboard::{copy, cut, paste};
pub use select::{deselect_options, select_options};

use crate::dom::{Document, NodeId};
use crate::event::EditType;
use crate::input::pointer::PointerAction;
use crate::input::{InputError, InputResult};
use crate::selection;
use crate::session::Session;
use tracing::debug;

/// Options of [`type_text_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeOptions {
    /// Overrides the session's `skip_click` setting.
    pub skip_click: Option<bool>,
    /// Overrides the session's `skip_auto_close` setting.
    pub skip_auto_close: Option<bool>,
    /// Selection to set after the focusing click, as character offsets.
    pub initial_selection: Option<(usize, usize)>,
}

/// Types descriptor text on the focused element.
///
/// Supports `{Key}`, `[Code]`, `{Key>}` (hold), `{/Key}` (release) and
/// `{Key>N/}` (press N times, then release). `{{` and `[[` type a literal
/// bracket.
///
/// # Errors
///
/// Returns [`InputError::InvalidDescriptor`] or [`InputError::UnknownKey`]
/// before any event is fired when the text cannot be parsed.
pub async fn keyboard(session: &mut Session, doc: &mut Document, text: &str) -> InputResult<()> {
    let actions = session.key_map.parse_actions(text)?;
    session.pointer_guard.next_call();
    debug!(text, actions = actions.len(), "keyboard");

    for action in &actions {
        if session.keyboard.is_pressed(&action.key) {
            session.keyboard_release(doc, &action.key)?;
        }
        if !action.release_previous {
            for i in 0..action.repeat {
                session.keyboard_press(doc, &action.key)?;
                if i + 1 < action.repeat {
                    session.delay.wait().await;
                }
            }
            if action.release_self {
                session.keyboard_release(doc, &action.key)?;
            }
        }
        session.delay.wait().await;
    }
    Ok(())
}

/// Runs a pointer gesture.
///
/// Each action is split into steps with a pause after each one. The click
/// count starts over after the gesture, so two separate `pointer` calls
/// never form a double click.
pub async fn pointer(
    session: &mut Session,
    doc: &mut Document,
    actions: &[PointerAction],
) -> InputResult<()> {
    let mut steps = Vec::new();
    for action in actions {
        steps.extend(action.steps()?);
    }
    session.pointer_guard.next_call();
    debug!(steps = steps.len(), "pointer");

    let result = run_pointer_steps(session, doc, &steps).await;
    session.pointer.reset_click_count();
    result
}

async fn run_pointer_steps(
    session: &mut Session,
    doc: &mut Document,
    steps: &[crate::input::pointer::PointerStep],
) -> InputResult<()> {
    for step in steps {
        session.pointer_step(doc, step)?;
        session.delay.wait().await;
    }
    Ok(())
}

fn click_actions(session: &Session, element: NodeId, keys: &str) -> Vec<PointerAction> {
    let mut actions = Vec::with_capacity(2);
    if !session.settings.skip_hover {
        actions.push(PointerAction::move_to(element));
    }
    actions.push(PointerAction::keys_on(keys, element));
    actions
}

/// Moves the mouse onto `element` and clicks the primary button.
pub async fn click(session: &mut Session, doc: &mut Document, element: NodeId) -> InputResult<()> {
    let actions = click_actions(session, element, "[MouseLeft]");
    pointer(session, doc, &actions).await
}

/// Clicks `element` twice in one gesture.
pub async fn dbl_click(session: &mut Session, doc: &mut Document, element: NodeId) -> InputResult<()> {
    let actions = click_actions(session, element, "[MouseLeft][MouseLeft]");
    pointer(session, doc, &actions).await
}

/// Clicks `element` three times in one gesture.
pub async fn triple_click(
    session: &mut Session,
    doc: &mut Document,
    element: NodeId,
) -> InputResult<()> {
    let actions = click_actions(session, element, "[MouseLeft][MouseLeft][MouseLeft]");
    pointer(session, doc, &actions).await
}

pub async fn hover(session: &mut Session, doc: &mut Document, element: NodeId) -> InputResult<()> {
    pointer(session, doc, &[PointerAction::move_to(element)]).await
}

/// Moves the mouse off `element` onto the body.
pub async fn unhover(session: &mut Session, doc: &mut Document, element: NodeId) -> InputResult<()> {
    session.assert_pointer_events(doc, element)?;
    let body = doc.body();
    pointer(session, doc, &[PointerAction::move_to(body)]).await
}

/// Clicks `element` and types `text` into it.
pub async fn type_text(
    session: &mut Session,
    doc: &mut Document,
    element: NodeId,
    text: &str,
) -> InputResult<()> {
    type_text_with(session, doc, element, text, TypeOptions::default()).await
}

/// Like [`type_text`], with per-call options.
///
/// Keys still held at the end are released unless auto-close is skipped.
pub async fn type_text_with(
    session: &mut Session,
    doc: &mut Document,
    element: NodeId,
    text: &str,
    options: TypeOptions,
) -> InputResult<()> {
    let skip_click = options.skip_click.unwrap_or(session.settings.skip_click);
    let skip_auto_close = options
        .skip_auto_close
        .unwrap_or(session.settings.skip_auto_close);

    if !skip_click {
        click(session, doc, element).await?;
    }
    if let Some((start, end)) = options.initial_selection {
        selection::select(doc, element, start, end)?;
    }

    keyboard(session, doc, text).await?;

    if !skip_auto_close {
        release_all_keys(session, doc)?;
    }
    Ok(())
}

fn release_all_keys(session: &mut Session, doc: &mut Document) -> InputResult<()> {
    let held: Vec<_> = session
        .keyboard
        .pressed_keys()
        .into_iter()
        .cloned()
        .collect();
    for key in &held {
        session.keyboard_release(doc, key)?;
    }
    Ok(())
}

/// Focuses an editable element, selects all of its content and deletes it.
///
/// # Errors
///
/// Returns [`InputError::NotEditable`] when the element is not editable,
/// cannot be focused or its content cannot be selected.
pub async fn clear(session: &mut Session, doc: &mut Document, element: NodeId) -> InputResult<()> {
    let not_editable = |doc: &Document, reason: &str| InputError::NotEditable {
        element: doc.describe(element),
        reason: reason.to_string(),
    };
    if !doc.is_editable(element) || doc.is_disabled(element) {
        return Err(not_editable(doc, "clear is only supported on editable elements"));
    }
    session.pointer_guard.next_call();
    debug!(element = %doc.describe(element), "clear");

    session.focus_element(doc, element)?;
    if doc.active_element() != Some(element) {
        return Err(not_editable(doc, "the element could not be focused"));
    }
    selection::select_all(doc, element)?;
    if !selection::is_all_selected(doc, element) {
        return Err(not_editable(doc, "the content could not be selected"));
    }
    session.input(doc, element, "", EditType::DeleteContentBackward)
}

/// Presses Tab, or Shift+Tab when `shift` is set.
pub async fn tab(session: &mut Session, doc: &mut Document, shift: bool) -> InputResult<()> {
    let text = if shift { "{Shift>}{Tab}{/Shift}" } else { "{Tab}" };
    keyboard(session, doc, text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::event::EventType;

    fn session() -> Session {
        Session::new(SessionSettings::default().with_delay(None))
    }

    fn types(doc: &mut Document) -> Vec<EventType> {
        doc.take_event_log().into_iter().map(|e| e.event_type).collect()
    }

    #[tokio::test]
    async fn test_click_hovers_first() {
        let mut doc = Document::from_markup("<button>Go</button>").unwrap();
        let button = doc.query("button").unwrap();
        doc.enable_event_log();
        let mut session = session();

        click(&mut session, &mut doc, button).await.unwrap();
        let log = types(&mut doc);
        assert_eq!(log.first(), Some(&EventType::PointerOver));
        assert_eq!(log.last(), Some(&EventType::Click));
    }

    #[tokio::test]
    async fn test_skip_hover_omits_move() {
        let mut doc = Document::from_markup("<button>Go</button>").unwrap();
        let button = doc.query("button").unwrap();
        doc.enable_event_log();
        let mut session = Session::new(
            SessionSettings::default()
                .with_delay(None)
                .with_skip_hover(true),
        );

        click(&mut session, &mut doc, button).await.unwrap();
        let log = types(&mut doc);
        assert!(!log.contains(&EventType::MouseMove));
        assert!(log.contains(&EventType::Click));
    }

    #[tokio::test]
    async fn test_type_text_releases_held_keys() {
        let mut doc = Document::from_markup("<input>").unwrap();
        let input = doc.query("input").unwrap();
        let mut session = session();

        type_text(&mut session, &mut doc, input, "{Shift>}ab").await.unwrap();
        assert_eq!(doc.value(input), "ab");
        assert!(session.keyboard().pressed_keys().is_empty());
    }

    #[tokio::test]
    async fn test_type_text_keeps_keys_with_skip_auto_close() {
        let mut doc = Document::from_markup("<input>").unwrap();
        let input = doc.query("input").unwrap();
        let mut session = session();
        let options = TypeOptions {
            skip_auto_close: Some(true),
            ..TypeOptions::default()
        };

        type_text_with(&mut session, &mut doc, input, "{Shift>}a", options)
            .await
            .unwrap();
        assert_eq!(session.keyboard().pressed_keys().len(), 1);
    }

    #[tokio::test]
    async fn test_type_text_with_initial_selection() {
        let mut doc = Document::from_markup("<input value='abcd'>").unwrap();
        let input = doc.query("input").unwrap();
        let mut session = session();
        let options = TypeOptions {
            initial_selection: Some((1, 3)),
            ..TypeOptions::default()
        };

        type_text_with(&mut session, &mut doc, input, "X", options)
            .await
            .unwrap();
        assert_eq!(doc.value(input), "aXd");
    }

    #[tokio::test]
    async fn test_clear_rejects_non_editable() {
        let mut doc = Document::from_markup("<div>text</div>").unwrap();
        let div = doc.query("div").unwrap();
        let mut session = session();

        let err = clear(&mut session, &mut doc, div).await.unwrap_err();
        assert!(matches!(err, InputError::NotEditable { .. }));
    }

    #[tokio::test]
    async fn test_clear_empties_value() {
        let mut doc = Document::from_markup("<input value='hello'>").unwrap();
        let input = doc.query("input").unwrap();
        let mut session = session();

        clear(&mut session, &mut doc, input).await.unwrap();
        assert_eq!(doc.value(input), "");
    }
}
