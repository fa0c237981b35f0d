//! Activation behavior of clicks and form events.

use super::DefaultAction;
use crate::dom::{Document, InputType};
use crate::event::{Event, EventInit, EventType};
use crate::input::InputResult;
use crate::session::Session;
use tracing::debug;

pub(super) fn click(
    event: &Event,
    _session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let target = event.target;
    if doc.is_disabled(target) {
        return Ok(None);
    }

    let context = doc.closest(target, |d, n| {
        matches!(
            d.tag_name(n),
            Some("button" | "input" | "label" | "select" | "textarea")
        )
    });
    if let Some(control) = context.and_then(|c| doc.label_control(c)) {
        let init = event.init.clone();
        return Ok(Some(DefaultAction::new(move |session, doc| {
            if doc.is_focusable(control) {
                session.focus_element(doc, control)?;
            }
            session.dispatch(doc, control, EventType::Click, init)?;
            Ok(())
        })));
    }

    match doc.input_type(target) {
        Some(InputType::File) => {
            return Ok(Some(DefaultAction::new(move |session, doc| {
                session.blur_element(doc, target)?;
                session.dispatch(doc, target, EventType::FileDialog, EventInit::default())?;
                session.focus_element(doc, target)
            })));
        }
        Some(InputType::Checkbox) => {
            // toggled before listeners run, listeners observe the new state
            let previous = doc.checked(target);
            doc.set_checked(target, !previous);
            return Ok(Some(
                DefaultAction::new(move |session, doc| fire_input_and_change(session, doc, target))
                    .with_revert(move |_, doc| {
                        doc.set_checked(target, previous);
                        Ok(())
                    }),
            ));
        }
        Some(InputType::Radio) => {
            if doc.checked(target) {
                return Ok(None);
            }
            let previous = doc
                .radio_group(target)
                .into_iter()
                .find(|r| doc.checked(*r));
            doc.set_checked(target, true);
            return Ok(Some(
                DefaultAction::new(move |session, doc| fire_input_and_change(session, doc, target))
                    .with_revert(move |_, doc| {
                        match previous {
                            Some(previous) => doc.set_checked(previous, true),
                            None => doc.set_checked(target, false),
                        }
                        Ok(())
                    }),
            ));
        }
        _ => {}
    }

    let Some(form) = doc.form_of(target) else {
        return Ok(None);
    };
    if doc.is_submit_button(target) {
        return Ok(Some(DefaultAction::new(move |session, doc| {
            session.dispatch(doc, form, EventType::Submit, EventInit::default())?;
            Ok(())
        })));
    }
    if doc.is_reset_button(target) {
        return Ok(Some(DefaultAction::new(move |session, doc| {
            session.dispatch(doc, form, EventType::Reset, EventInit::default())?;
            Ok(())
        })));
    }
    Ok(None)
}

fn fire_input_and_change(
    session: &mut Session,
    doc: &mut Document,
    target: crate::dom::NodeId,
) -> InputResult<()> {
    session.dispatch(doc, target, EventType::Input, EventInit::default())?;
    session.dispatch(doc, target, EventType::Change, EventInit::default())?;
    Ok(())
}

pub(super) fn submit(
    event: &Event,
    _session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let form = event.target;
    if !doc.is_tag(form, "form") {
        return Ok(None);
    }
    Ok(Some(DefaultAction::new(move |_, doc| {
        debug!(form = %doc.describe(form), "form submitted");
        doc.record_submission(form);
        Ok(())
    })))
}

pub(super) fn reset(
    event: &Event,
    _session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let form = event.target;
    if !doc.is_tag(form, "form") {
        return Ok(None);
    }
    Ok(Some(DefaultAction::new(move |_, doc| {
        doc.reset_form(form);
        Ok(())
    })))
}
