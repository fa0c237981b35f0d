//! Option selection in `<select>` elements

use super::click;
use crate::dom::{Document, NodeId};
use crate::event::{EventInit, EventType};
use crate::input::pointer::PointerAction;
use crate::input::{InputError, InputResult};
use crate::session::Session;
use tracing::debug;

/// Selects the options of `select` matching `values` by value or text.
///
/// A single select is clicked and then switched to the option. In a
/// multiple select every option is clicked and added to the selection.
/// Elements with `pointer-events: none` are changed without pointer events.
///
/// # Errors
///
/// - [`InputError::OptionNotFound`] when a value matches no option
/// - [`InputError::OptionDisabled`] when the select or an option is disabled
/// - [`InputError::SelectCardinality`] when several values are given for a
///   single select
pub async fn select_options(
    session: &mut Session,
    doc: &mut Document,
    select: NodeId,
    values: &[&str],
) -> InputResult<()> {
    change_options(session, doc, select, values, true).await
}

/// Removes the options matching `values` from a multiple select.
///
/// # Errors
///
/// Same as [`select_options`]. Single selects always fail with
/// [`InputError::SelectCardinality`].
pub async fn deselect_options(
    session: &mut Session,
    doc: &mut Document,
    select: NodeId,
    values: &[&str],
) -> InputResult<()> {
    change_options(session, doc, select, values, false).await
}

fn find_options(doc: &Document, select: NodeId, values: &[&str]) -> InputResult<Vec<NodeId>> {
    let options = doc.options(select);
    values
        .iter()
        .map(|value| {
            options
                .iter()
                .copied()
                .find(|o| doc.option_value(*o) == *value || doc.text_content(*o).trim() == *value)
                .ok_or_else(|| InputError::OptionNotFound {
                    select: doc.describe(select),
                    value: value.to_string(),
                })
        })
        .collect()
}

fn is_option_disabled(doc: &Document, option: NodeId) -> bool {
    doc.is_disabled(option)
        || doc
            .closest(option, |d, n| d.is_tag(n, "optgroup"))
            .map(|group| doc.is_disabled(group))
            .unwrap_or(false)
}

async fn change_options(
    session: &mut Session,
    doc: &mut Document,
    select: NodeId,
    values: &[&str],
    selected: bool,
) -> InputResult<()> {
    let options = find_options(doc, select, values)?;
    if doc.is_disabled(select) {
        return Err(InputError::OptionDisabled {
            option: doc.describe(select),
        });
    }
    if let Some(option) = options.iter().find(|o| is_option_disabled(doc, **o)) {
        return Err(InputError::OptionDisabled {
            option: doc.describe(*option),
        });
    }
    debug!(select = %doc.describe(select), ?values, selected, "change options");

    if doc.is_multiple(select) {
        for option in options {
            session.pointer_guard.next_call();
            if session.has_pointer_events(doc, option) {
                let actions = [
                    PointerAction::move_to(option),
                    PointerAction::keys_on("[MouseLeft]", option),
                ];
                super::pointer(session, doc, &actions).await?;
            }
            session.focus_element(doc, select)?;
            set_option(session, doc, option, selected)?;
        }
        return Ok(());
    }

    match options.as_slice() {
        [option] if selected => {
            session.pointer_guard.next_call();
            if session.has_pointer_events(doc, select) {
                click(session, doc, select).await?;
            } else {
                session.focus_element(doc, select)?;
            }
            set_option(session, doc, *option, true)
        }
        _ => Err(InputError::SelectCardinality {
            select: doc.describe(select),
        }),
    }
}

fn set_option(
    session: &mut Session,
    doc: &mut Document,
    option: NodeId,
    selected: bool,
) -> InputResult<()> {
    if doc.is_option_selected(option) == selected {
        return Ok(());
    }
    doc.set_option_selected(option, selected);
    session.dispatch(doc, option, EventType::Input, EventInit::default())?;
    session.dispatch(doc, option, EventType::Change, EventInit::default())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;

    const MARKUP: &str = "<select id='one'><option value='a'>Alpha</option><option value='b'>Beta</option>\
        <option value='c' disabled>Gamma</option></select>\
        <select id='many' multiple><option>x</option><option>y</option><option>z</option></select>";

    fn setup() -> (Document, Session, NodeId, NodeId) {
        let doc = Document::from_markup(MARKUP).unwrap();
        let one = doc.query("#one").unwrap();
        let many = doc.query("#many").unwrap();
        (doc, Session::new(SessionSettings::default().with_delay(None)), one, many)
    }

    #[tokio::test]
    async fn test_select_single_by_text() {
        let (mut doc, mut session, one, _) = setup();
        doc.enable_event_log();

        select_options(&mut session, &mut doc, one, &["Beta"]).await.unwrap();
        let selected = doc.selected_options(one);
        assert_eq!(selected.len(), 1);
        assert_eq!(doc.option_value(selected[0]), "b");
        assert_eq!(doc.active_element(), Some(one));

        let log = doc.take_event_log();
        let change = log.iter().position(|e| e.event_type == EventType::Change).unwrap();
        let click = log.iter().position(|e| e.event_type == EventType::Click).unwrap();
        assert!(click < change);
    }

    #[tokio::test]
    async fn test_select_errors() {
        let (mut doc, mut session, one, _) = setup();

        let missing = select_options(&mut session, &mut doc, one, &["nope"]).await;
        assert!(matches!(missing, Err(InputError::OptionNotFound { .. })));

        let two = select_options(&mut session, &mut doc, one, &["a", "b"]).await;
        assert!(matches!(two, Err(InputError::SelectCardinality { .. })));

        let disabled = select_options(&mut session, &mut doc, one, &["c"]).await;
        assert!(matches!(disabled, Err(InputError::OptionDisabled { .. })));

        let deselect = deselect_options(&mut session, &mut doc, one, &["a"]).await;
        assert!(matches!(deselect, Err(InputError::SelectCardinality { .. })));
    }

    #[tokio::test]
    async fn test_multiple_select_and_deselect() {
        let (mut doc, mut session, _, many) = setup();

        select_options(&mut session, &mut doc, many, &["x", "z"]).await.unwrap();
        let values: Vec<String> = doc
            .selected_options(many)
            .into_iter()
            .map(|o| doc.option_value(o))
            .collect();
        assert_eq!(values, vec!["x", "z"]);

        deselect_options(&mut session, &mut doc, many, &["x"]).await.unwrap();
        let values: Vec<String> = doc
            .selected_options(many)
            .into_iter()
            .map(|o| doc.option_value(o))
            .collect();
        assert_eq!(values, vec!["z"]);
    }
}
