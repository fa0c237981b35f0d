//! Default actions of keyboard events.

use super::DefaultAction;
use crate::dom::{Document, InputType, NodeId};
use crate::event::{EditType, Event, EventInit, EventType};
use crate::input::InputResult;
use crate::selection;
use crate::session::Session;
use tracing::trace;

pub(super) fn keydown(
    event: &Event,
    session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let target = event.target;
    let shift = event.shift_key();
    let action = match event.key().unwrap_or_default() {
        "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" => {
            let key = event.key().unwrap_or_default();
            let delta: isize = if matches!(key, "ArrowLeft" | "ArrowUp") { -1 } else { 1 };
            if doc.is_input_of_type(target, InputType::Radio) {
                Some(DefaultAction::new(move |session, doc| {
                    walk_radio(session, doc, target, delta)
                }))
            } else if matches!(key, "ArrowLeft" | "ArrowRight") {
                Some(DefaultAction::new(move |_, doc| {
                    if shift {
                        selection::extend_selection(doc, target, delta)
                    } else {
                        selection::move_selection(doc, target, delta)
                    }
                }))
            } else {
                None
            }
        }
        key @ ("Home" | "End" | "PageUp" | "PageDown") => {
            let editable = doc.is_tag(target, "input")
                || doc.is_tag(target, "textarea")
                || doc.is_content_editable(target);
            let to_end = matches!(key, "End" | "PageDown");
            editable.then(|| {
                DefaultAction::new(move |_, doc| {
                    selection::set_caret_to_edge(doc, target, to_end, shift)
                })
            })
        }
        key @ ("Backspace" | "Delete") => {
            let edit = if key == "Backspace" {
                EditType::DeleteContentBackward
            } else {
                EditType::DeleteContentForward
            };
            doc.is_editable(target).then(|| {
                DefaultAction::new(move |session, doc| session.input(doc, target, "", edit))
            })
        }
        "Tab" => Some(DefaultAction::new(move |session, doc| {
            let destination = tab_destination(doc, target, shift);
            session.focus_element(doc, destination)?;
            if doc.has_own_selection(destination) {
                selection::select_all(doc, destination)?;
            }
            Ok(())
        })),
        _ => None,
    };
    if action.is_some() {
        return Ok(action);
    }

    let control = session.keyboard().modifiers().get(crate::input::Modifier::Control);
    if event.code() == Some("KeyA") && control {
        return Ok(Some(DefaultAction::new(move |_, doc| {
            selection::select_all(doc, target)
        })));
    }
    Ok(None)
}

pub(super) fn keypress(
    event: &Event,
    session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let target = event.target;
    let key = event.key().unwrap_or_default();

    if key == "Enter" {
        let activates = doc.is_tag(target, "button")
            || doc
                .input_type(target)
                .map(InputType::clicks_on_enter)
                .unwrap_or(false)
            || (doc.is_tag(target, "a") && doc.has_attribute(target, "href"));
        if activates {
            return Ok(Some(click_action(target)));
        }
        if doc.is_tag(target, "input") {
            let Some(form) = doc.form_of(target) else {
                return Ok(None);
            };
            let controls = doc.form_controls(form);
            if let Some(submit) = controls.iter().copied().find(|c| doc.is_submit_button(*c)) {
                return Ok(Some(click_action(submit)));
            }
            let inputs = controls.iter().filter(|c| doc.is_tag(**c, "input")).count();
            let submits = doc
                .input_type(target)
                .map(InputType::submits_on_enter)
                .unwrap_or(false);
            if submits && inputs == 1 {
                return Ok(Some(DefaultAction::new(move |session, doc| {
                    session.dispatch(doc, form, EventType::Submit, EventInit::default())?;
                    Ok(())
                })));
            }
            return Ok(None);
        }
    }

    if !doc.is_editable(target) {
        return Ok(None);
    }
    let (data, edit) = if key == "Enter" {
        let shift = session.keyboard().modifiers().get(crate::input::Modifier::Shift);
        let edit = if doc.is_content_editable(target) && !shift {
            EditType::InsertParagraph
        } else {
            EditType::InsertLineBreak
        };
        ("\n".to_string(), edit)
    } else {
        (key.to_string(), EditType::InsertText)
    };
    Ok(Some(DefaultAction::new(move |session, doc| {
        session.input(doc, target, &data, edit)
    })))
}

pub(super) fn keyup(
    event: &Event,
    _session: &mut Session,
    doc: &mut Document,
) -> InputResult<Option<DefaultAction>> {
    let target = event.target;
    if event.key() == Some(" ") && is_clickable_input(doc, target) {
        return Ok(Some(click_action(target)));
    }
    Ok(None)
}

fn click_action(target: NodeId) -> DefaultAction {
    DefaultAction::new(move |session, doc| {
        session.dispatch(doc, target, EventType::Click, EventInit::default())?;
        Ok(())
    })
}

fn is_clickable_input(doc: &Document, node: NodeId) -> bool {
    doc.is_tag(node, "button")
        || matches!(
            doc.input_type(node),
            Some(
                InputType::Button
                    | InputType::Color
                    | InputType::File
                    | InputType::Image
                    | InputType::Reset
                    | InputType::Submit
                    | InputType::Checkbox
                    | InputType::Radio
            )
        )
}

/// Checks the next enabled radio button of the group, wrapping around.
fn walk_radio(
    session: &mut Session,
    doc: &mut Document,
    radio: NodeId,
    delta: isize,
) -> InputResult<()> {
    let group = doc.radio_group(radio);
    let Some(start) = group.iter().position(|r| *r == radio) else {
        return Ok(());
    };
    let len = group.len() as isize;
    let mut index = start as isize;
    loop {
        index = (index + delta).rem_euclid(len);
        let candidate = group[index as usize];
        if candidate == radio {
            return Ok(());
        }
        if doc.is_disabled(candidate) {
            continue;
        }
        trace!(radio = %doc.describe(candidate), "walk radio group");
        session.focus_element(doc, candidate)?;
        session.dispatch(doc, candidate, EventType::Click, EventInit::default())?;
        return Ok(());
    }
}

/// Element Tab moves focus to from `active`.
///
/// Radio groups are represented by their active member, otherwise by the
/// checked member, otherwise by all members. Moving past either end of the
/// order lands on the body.
pub(crate) fn tab_destination(doc: &Document, active: NodeId, backwards: bool) -> NodeId {
    let body = doc.body();
    let mut order = doc.tab_order();
    if !order.contains(&active) && active != body {
        // an element with negative tabindex keeps its place in tree order
        order = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|n| *n == active || order.contains(n))
            .collect();
    }

    let active_group = doc
        .is_input_of_type(active, InputType::Radio)
        .then(|| doc.attribute(active, "name").map(str::to_string))
        .flatten();
    let radio_name = |node: NodeId| {
        doc.is_input_of_type(node, InputType::Radio)
            .then(|| doc.attribute(node, "name").filter(|n| !n.is_empty()))
            .flatten()
    };
    let mut pruned = vec![body];
    let mut checked_groups: Vec<String> = Vec::new();
    for node in order {
        if let Some(name) = radio_name(node) {
            if node == active {
                pruned.push(node);
                continue;
            }
            if active_group.as_deref() == Some(name) {
                continue;
            }
            if doc.checked(node) {
                pruned.retain(|n| radio_name(*n) != Some(name));
                pruned.push(node);
                checked_groups.push(name.to_string());
                continue;
            }
            if checked_groups.iter().any(|g| g == name) {
                continue;
            }
        }
        pruned.push(node);
    }

    let len = pruned.len() as isize;
    let mut index = pruned.iter().position(|n| *n == active).unwrap_or(0) as isize;
    let delta = if backwards { -1 } else { 1 };
    loop {
        index = (index + delta).rem_euclid(len);
        let candidate = pruned[index as usize];
        if candidate == active {
            return body;
        }
        if candidate == body || doc.is_visible(candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_order_wraps_to_body() {
        let doc = Document::from_markup("<input id='a'><input id='b'>").unwrap();
        let a = doc.query("#a").unwrap();
        let b = doc.query("#b").unwrap();
        assert_eq!(tab_destination(&doc, doc.body(), false), a);
        assert_eq!(tab_destination(&doc, a, false), b);
        assert_eq!(tab_destination(&doc, b, false), doc.body());
        assert_eq!(tab_destination(&doc, a, true), doc.body());
        assert_eq!(tab_destination(&doc, doc.body(), true), b);
    }

    #[test]
    fn test_tab_respects_positive_tabindex() {
        let doc = Document::from_markup(
            "<input id='a'><input id='b' tabindex='2'><input id='c' tabindex='1'>",
        )
        .unwrap();
        let a = doc.query("#a").unwrap();
        let b = doc.query("#b").unwrap();
        let c = doc.query("#c").unwrap();
        assert_eq!(tab_destination(&doc, doc.body(), false), c);
        assert_eq!(tab_destination(&doc, c, false), b);
        assert_eq!(tab_destination(&doc, b, false), a);
    }

    #[test]
    fn test_tab_skips_unchecked_radios_of_checked_group() {
        let doc = Document::from_markup(
            "<input type='radio' name='g' id='r1'><input type='radio' name='g' id='r2' checked><button id='x'>x</button>",
        )
        .unwrap();
        let r2 = doc.query("#r2").unwrap();
        let x = doc.query("#x").unwrap();
        assert_eq!(tab_destination(&doc, doc.body(), false), r2);
        assert_eq!(tab_destination(&doc, r2, false), x);
    }

    #[test]
    fn test_arrow_walks_radio_group() {
        let mut doc = Document::from_markup(
            "<input type='radio' name='g' id='r1' checked><input type='radio' name='g' id='r2' disabled><input type='radio' name='g' id='r3'>",
        )
        .unwrap();
        let r1 = doc.query("#r1").unwrap();
        let r3 = doc.query("#r3").unwrap();
        let mut session = Session::default();
        session.focus_element(&mut doc, r1).unwrap();
        session.type_keys(&mut doc, "{ArrowRight}").unwrap();
        assert!(doc.checked(r3));
        assert_eq!(doc.active_element(), Some(r3));
        session.type_keys(&mut doc, "{ArrowDown}").unwrap();
        assert!(doc.checked(r1));
    }

    #[test]
    fn test_space_keyup_clicks_checkbox() {
        let mut doc = Document::from_markup("<input type='checkbox'>").unwrap();
        let checkbox = doc.query("input").unwrap();
        let mut session = Session::default();
        session.focus_element(&mut doc, checkbox).unwrap();
        session.type_keys(&mut doc, " ").unwrap();
        assert!(doc.checked(checkbox));
    }

    #[test]
    fn test_prevented_keydown_skips_keyup_click() {
        let mut doc = Document::from_markup("<input type='checkbox'>").unwrap();
        let checkbox = doc.query("input").unwrap();
        doc.add_event_listener(checkbox, EventType::KeyDown, |_, e| e.prevent_default());
        let mut session = Session::default();
        session.focus_element(&mut doc, checkbox).unwrap();
        session.type_keys(&mut doc, " ").unwrap();
        assert!(!doc.checked(checkbox));
    }

    #[test]
    fn test_enter_submits_single_input_form() {
        let mut doc = Document::from_markup("<form><input></form>").unwrap();
        let form = doc.query("form").unwrap();
        let input = doc.query("input").unwrap();
        let mut session = Session::default();
        session.focus_element(&mut doc, input).unwrap();
        session.type_keys(&mut doc, "{Enter}").unwrap();
        assert_eq!(doc.submissions(), &[form]);
        assert_eq!(doc.value(input), "");
    }

    #[test]
    fn test_enter_clicks_submit_button() {
        let mut doc =
            Document::from_markup("<form><input id='a'><input id='b'><input type='submit'></form>")
                .unwrap();
        let form = doc.query("form").unwrap();
        let a = doc.query("#a").unwrap();
        let mut session = Session::default();
        session.focus_element(&mut doc, a).unwrap();
        session.type_keys(&mut doc, "{Enter}").unwrap();
        assert_eq!(doc.submissions(), &[form]);
    }

    #[test]
    fn test_enter_in_textarea_inserts_line_break() {
        let mut doc = Document::from_markup("<textarea>a</textarea>").unwrap();
        let textarea = doc.query("textarea").unwrap();
        doc.enable_event_log();
        let mut session = Session::default();
        session.focus_element(&mut doc, textarea).unwrap();
        session.type_keys(&mut doc, "{Enter}b").unwrap();
        assert_eq!(doc.value(textarea), "a\nb");
        let input = doc
            .event_log()
            .iter()
            .find(|e| e.event_type == EventType::Input)
            .unwrap();
        assert_eq!(input.input_type(), Some(EditType::InsertLineBreak));
    }

    #[test]
    fn test_control_a_selects_all() {
        let mut doc = Document::from_markup("<input value='hello'>").unwrap();
        let input = doc.query("input").unwrap();
        let mut session = Session::default();
        session.focus_element(&mut doc, input).unwrap();
        session.type_keys(&mut doc, "{Control>}a{/Control}").unwrap();
        assert_eq!(selection::selected_text(&doc, input), "hello");
    }
}
