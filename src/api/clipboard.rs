//! `copy`, `cut` and `paste` on the focused element

use crate::dom::{Document, NodeId};
use crate::event::{EventInit, EventType};
use crate::input::clipboard::DataTransfer;
use crate::input::InputResult;
use crate::selection;
use crate::session::Session;
use tracing::{debug, trace};

/// Copies the current selection.
///
/// Returns the data listeners left on the event, or `None` when nothing is
/// selected. Unless a listener prevents the event, the data is written to the
/// session clipboard when `write_to_clipboard` is enabled.
pub async fn copy(session: &mut Session, doc: &mut Document) -> InputResult<Option<DataTransfer>> {
    transfer_selection(session, doc, EventType::Copy).await
}

/// Like [`copy`], then deletes the selection from an editable target.
pub async fn cut(session: &mut Session, doc: &mut Document) -> InputResult<Option<DataTransfer>> {
    transfer_selection(session, doc, EventType::Cut).await
}

async fn transfer_selection(
    session: &mut Session,
    doc: &mut Document,
    event_type: EventType,
) -> InputResult<Option<DataTransfer>> {
    session.pointer_guard.next_call();
    let target = doc.active_element_or_body();
    let text = selection::selected_text(doc, target);
    if text.is_empty() {
        trace!(event = %event_type, "nothing selected");
        return Ok(None);
    }
    debug!(event = %event_type, element = %doc.describe(target), chars = text.chars().count(), "clipboard transfer");

    let init = EventInit {
        clipboard_data: Some(DataTransfer::from_text(&text)),
        ..EventInit::default()
    };
    let event = session.dispatch_event(doc, target, event_type, init, false)?;
    let data = event.init.clipboard_data.unwrap_or_default();

    if !event.default_prevented && session.settings.write_to_clipboard {
        session.clipboard().write(data.clone()).await?;
    }
    Ok(Some(data))
}

/// Pastes into the focused element.
///
/// Uses `data` when given, otherwise reads the session clipboard.
///
/// # Errors
///
/// Returns [`InputError::Clipboard`](crate::input::InputError::Clipboard)
/// when no data is given and the clipboard cannot be read.
pub async fn paste(
    session: &mut Session,
    doc: &mut Document,
    data: Option<DataTransfer>,
) -> InputResult<()> {
    session.pointer_guard.next_call();
    let target: NodeId = doc.active_element_or_body();
    let data = match data {
        Some(data) => data,
        None => session.clipboard().read().await?,
    };
    debug!(element = %doc.describe(target), types = ?data.types(), "paste");

    let init = EventInit {
        clipboard_data: Some(data),
        ..EventInit::default()
    };
    session.dispatch(doc, target, EventType::Paste, init)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::input::clipboard::UnavailableClipboard;
    use std::sync::Arc;

    fn session() -> Session {
        Session::new(SessionSettings::default().with_delay(None))
    }

    fn focused_input(value: &str) -> (Document, NodeId) {
        let mut doc = Document::from_markup(&format!("<input value='{value}'>")).unwrap();
        let input = doc.query("input").unwrap();
        let mut session = session();
        session.focus_element(&mut doc, input).unwrap();
        (doc, input)
    }

    #[tokio::test]
    async fn test_copy_writes_selection_to_clipboard() {
        let (mut doc, input) = focused_input("hello");
        selection::select(&mut doc, input, 1, 4).unwrap();
        let mut session = session();

        let data = copy(&mut session, &mut doc).await.unwrap().unwrap();
        assert_eq!(data.get_data("text"), "ell");
        assert_eq!(session.clipboard().read_text().await.unwrap(), "ell");
        assert_eq!(doc.value(input), "hello");
    }

    #[tokio::test]
    async fn test_copy_without_selection_returns_none() {
        let (mut doc, input) = focused_input("hello");
        selection::select(&mut doc, input, 2, 2).unwrap();
        let mut session = session();

        assert!(copy(&mut session, &mut doc).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prevented_copy_leaves_clipboard() {
        let (mut doc, input) = focused_input("hello");
        selection::select(&mut doc, input, 0, 5).unwrap();
        doc.add_event_listener(input, EventType::Copy, |_, event| event.prevent_default());
        let mut session = session();
        session.clipboard().write_text("before").await.unwrap();

        copy(&mut session, &mut doc).await.unwrap();
        assert_eq!(session.clipboard().read_text().await.unwrap(), "before");
    }

    #[tokio::test]
    async fn test_cut_then_paste() {
        let (mut doc, input) = focused_input("hello");
        selection::select(&mut doc, input, 0, 2).unwrap();
        let mut session = session();

        cut(&mut session, &mut doc).await.unwrap();
        assert_eq!(doc.value(input), "llo");

        selection::select(&mut doc, input, 3, 3).unwrap();
        paste(&mut session, &mut doc, None).await.unwrap();
        assert_eq!(doc.value(input), "llohe");
    }

    #[tokio::test]
    async fn test_paste_without_clipboard_fails() {
        let (mut doc, _) = focused_input("");
        let mut session = session().with_clipboard(Arc::new(UnavailableClipboard));

        assert!(paste(&mut session, &mut doc, None).await.is_err());
        assert!(paste(&mut session, &mut doc, Some(DataTransfer::from_text("x")))
            .await
            .is_ok());
    }
}
