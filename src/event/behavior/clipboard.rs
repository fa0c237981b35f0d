//! Default actions of clipboard events.

use super::DefaultAction;
use crate::dom::Document;
use crate::event::{EditType, Event};
use crate::input::InputResult;
use crate::session::Session;

pub(super) fn cut(
    event: &Event,
    _session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let target = event.target;
    if !doc.is_editable(target) {
        return Ok(None);
    }
    Ok(Some(DefaultAction::new(move |session, doc| {
        session.input(doc, target, "", EditType::DeleteByCut)
    })))
}

pub(super) fn paste(
    event: &Event,
    _session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let target = event.target;
    if !doc.is_editable(target) {
        return Ok(None);
    }
    let data = event
        .init
        .clipboard_data
        .as_ref()
        .map(|d| d.get_data("text"))
        .unwrap_or_default();
    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(DefaultAction::new(move |session, doc| {
        session.input(doc, target, &data, EditType::InsertFromPaste)
    })))
}
