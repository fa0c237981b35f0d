//! Element classification: control types, editability, focusability,
//! forms and labels.

use super::{Document, NodeId};
use std::fmt;

/// Type of an `<input>` element. Unknown values fall back to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    Text,
    Search,
    Url,
    Tel,
    Email,
    Password,
    Number,
    Date,
    Time,
    DatetimeLocal,
    Month,
    Week,
    Checkbox,
    Radio,
    File,
    Submit,
    Reset,
    Button,
    Image,
    Color,
    Range,
    Hidden,
}

impl InputType {
    /// Parses the `type` attribute value.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "search" => Self::Search,
            "url" => Self::Url,
            "tel" => Self::Tel,
            "email" => Self::Email,
            "password" => Self::Password,
            "number" => Self::Number,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime-local" => Self::DatetimeLocal,
            "month" => Self::Month,
            "week" => Self::Week,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "file" => Self::File,
            "submit" => Self::Submit,
            "reset" => Self::Reset,
            "button" => Self::Button,
            "image" => Self::Image,
            "color" => Self::Color,
            "range" => Self::Range,
            "hidden" => Self::Hidden,
            _ => Self::Text,
        }
    }

    /// Attribute spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Search => "search",
            Self::Url => "url",
            Self::Tel => "tel",
            Self::Email => "email",
            Self::Password => "password",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::DatetimeLocal => "datetime-local",
            Self::Month => "month",
            Self::Week => "week",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::File => "file",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::Button => "button",
            Self::Image => "image",
            Self::Color => "color",
            Self::Range => "range",
            Self::Hidden => "hidden",
        }
    }

    /// Types the user can type into. These keep their own selection.
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Search
                | Self::Url
                | Self::Tel
                | Self::Email
                | Self::Password
                | Self::Number
                | Self::Date
                | Self::Time
                | Self::DatetimeLocal
                | Self::Month
                | Self::Week
        )
    }

    /// Types exposing `selectionStart`/`setSelectionRange`.
    pub fn supports_selection_api(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Search | Self::Url | Self::Tel | Self::Password
        )
    }

    /// Types honouring the `maxlength` attribute.
    pub fn supports_max_length(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Search | Self::Url | Self::Tel | Self::Email | Self::Password
        )
    }

    /// Types whose Enter key press activates the element.
    pub fn clicks_on_enter(self) -> bool {
        matches!(
            self,
            Self::Button | Self::Color | Self::File | Self::Image | Self::Reset | Self::Submit
        )
    }

    /// Types that submit a form with a single field on Enter.
    pub fn submits_on_enter(self) -> bool {
        matches!(
            self,
            Self::Email
                | Self::Month
                | Self::Password
                | Self::Search
                | Self::Tel
                | Self::Text
                | Self::Url
                | Self::Week
        )
    }

    /// Types that toggle on click.
    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "optgroup", "option", "fieldset"];
const LABELABLE: &[&str] = &["button", "input", "meter", "output", "progress", "select", "textarea"];

impl Document {
    /// The input type of an `<input>` element.
    pub fn input_type(&self, node: NodeId) -> Option<InputType> {
        if !self.is_tag(node, "input") {
            return None;
        }
        Some(InputType::parse(self.attribute(node, "type").unwrap_or("text")))
    }

    /// Returns whether `node` is an input of the given type.
    pub fn is_input_of_type(&self, node: NodeId, input_type: InputType) -> bool {
        self.input_type(node) == Some(input_type)
    }

    /// Returns whether a form control is disabled, directly or through a
    /// disabled fieldset.
    pub fn is_disabled(&self, node: NodeId) -> bool {
        let Some(tag) = self.tag_name(node) else {
            return false;
        };
        if !FORM_CONTROLS.contains(&tag) {
            return false;
        }
        if self.has_attribute(node, "disabled") {
            return true;
        }
        self.inclusive_ancestors(node)
            .into_iter()
            .skip(1)
            .any(|a| self.is_tag(a, "fieldset") && self.has_attribute(a, "disabled"))
    }

    /// Returns whether a control is read-only.
    pub fn is_read_only(&self, node: NodeId) -> bool {
        self.has_attribute(node, "readonly")
    }

    /// Returns whether `node` lies in an editing host.
    pub fn is_content_editable(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(value) = self.attribute(current, "contenteditable") {
                match value.to_ascii_lowercase().as_str() {
                    "" | "true" | "plaintext-only" => return true,
                    "false" => return false,
                    _ => {}
                }
            }
            cursor = self.parent(current);
        }
        false
    }

    /// The outermost editing host containing `node`.
    pub fn content_editable_host(&self, node: NodeId) -> Option<NodeId> {
        let start = if self.is_text(node) {
            self.parent(node)?
        } else {
            node
        };
        if !self.is_content_editable(start) {
            return None;
        }
        let mut host = start;
        while let Some(parent) = self.parent(host) {
            if !self.is_element(parent) || !self.is_content_editable(parent) {
                break;
            }
            host = parent;
        }
        Some(host)
    }

    /// Returns whether the element keeps its own value and selection
    /// (textarea and typeable inputs).
    pub fn has_own_selection(&self, node: NodeId) -> bool {
        self.is_tag(node, "textarea")
            || self.input_type(node).map(InputType::is_editable).unwrap_or(false)
    }

    /// Returns whether the element exposes the selection API.
    pub fn supports_selection_api(&self, node: NodeId) -> bool {
        self.is_tag(node, "textarea")
            || self
                .input_type(node)
                .map(InputType::supports_selection_api)
                .unwrap_or(false)
    }

    /// Typeable input or textarea that is not read-only.
    pub fn is_editable_input_or_textarea(&self, node: NodeId) -> bool {
        self.has_own_selection(node) && !self.is_read_only(node)
    }

    /// Returns whether user edits are applied to `node`.
    pub fn is_editable(&self, node: NodeId) -> bool {
        (self.is_editable_input_or_textarea(node) && !self.is_disabled(node))
            || self.is_content_editable(node)
    }

    /// Parsed `tabindex` attribute.
    pub fn tab_index(&self, node: NodeId) -> Option<i32> {
        self.attribute(node, "tabindex")
            .and_then(|v| v.trim().parse().ok())
    }

    /// Returns whether `node` can receive focus.
    pub fn is_focusable(&self, node: NodeId) -> bool {
        let Some(tag) = self.tag_name(node) else {
            return false;
        };
        if self.is_disabled(node) {
            return false;
        }
        let natively = match tag {
            "input" => self.input_type(node) != Some(InputType::Hidden),
            "button" | "select" | "textarea" | "iframe" => true,
            "a" | "area" => self.has_attribute(node, "href"),
            _ => false,
        };
        natively
            || self.has_attribute(node, "tabindex")
            || self
                .attribute(node, "contenteditable")
                .map(|v| !v.eq_ignore_ascii_case("false"))
                .unwrap_or(false)
    }

    /// Nearest focusable inclusive ancestor.
    pub fn closest_focusable(&self, node: NodeId) -> Option<NodeId> {
        self.closest(node, |doc, n| doc.is_focusable(n))
    }

    /// Focusable elements reachable with Tab, in sequential navigation
    /// order.
    pub fn tab_order(&self) -> Vec<NodeId> {
        let mut candidates: Vec<(i32, usize, NodeId)> = self
            .descendants(self.root())
            .into_iter()
            .filter(|n| self.is_focusable(*n) && self.is_visible(*n))
            .enumerate()
            .filter_map(|(order, n)| {
                let index = self.tab_index(n).unwrap_or(0);
                (index >= 0).then_some((index, order, n))
            })
            .collect();
        // positive indices first in ascending order, then document order
        candidates.sort_by_key(|(index, order, _)| (if *index > 0 { 0 } else { 1 }, *index, *order));
        candidates.into_iter().map(|(_, _, n)| n).collect()
    }

    /// Form owner of a control.
    pub fn form_of(&self, node: NodeId) -> Option<NodeId> {
        if let Some(id) = self.attribute(node, "form") {
            return self.element_by_id(id).filter(|f| self.is_tag(*f, "form"));
        }
        self.inclusive_ancestors(node)
            .into_iter()
            .skip(1)
            .find(|a| self.is_tag(*a, "form"))
    }

    /// Element with the given `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    /// Returns whether `node` can be associated with a label.
    pub fn is_labelable(&self, node: NodeId) -> bool {
        match self.tag_name(node) {
            Some("input") => self.input_type(node) != Some(InputType::Hidden),
            Some(tag) => LABELABLE.contains(&tag),
            None => false,
        }
    }

    /// The control a `<label>` refers to.
    pub fn label_control(&self, label: NodeId) -> Option<NodeId> {
        if !self.is_tag(label, "label") {
            return None;
        }
        if let Some(target) = self.attribute(label, "for") {
            return self.element_by_id(target).filter(|n| self.is_labelable(*n));
        }
        self.descendants(label)
            .into_iter()
            .find(|n| self.is_labelable(*n))
    }

    /// The effective `maxlength` of a control, if it has one.
    pub fn max_length(&self, node: NodeId) -> Option<usize> {
        let applies = self.is_tag(node, "textarea")
            || self
                .input_type(node)
                .map(InputType::supports_max_length)
                .unwrap_or(false);
        if !applies {
            return None;
        }
        self.attribute(node, "maxlength")
            .and_then(|v| v.trim().parse::<usize>().ok())
    }

    /// Returns whether `node` is a submit button (`<button>` defaulting to
    /// submit or an input of type submit/image).
    pub fn is_submit_button(&self, node: NodeId) -> bool {
        if self.is_tag(node, "button") {
            return self
                .attribute(node, "type")
                .map(|t| t.eq_ignore_ascii_case("submit"))
                .unwrap_or(true);
        }
        matches!(
            self.input_type(node),
            Some(InputType::Submit | InputType::Image)
        )
    }

    /// Returns whether `node` is a reset button.
    pub fn is_reset_button(&self, node: NodeId) -> bool {
        if self.is_tag(node, "button") {
            return self
                .attribute(node, "type")
                .map(|t| t.eq_ignore_ascii_case("reset"))
                .unwrap_or(false);
        }
        self.input_type(node) == Some(InputType::Reset)
    }

    /// Controls owned by `form`, in tree order.
    pub fn form_controls(&self, form: NodeId) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|n| {
                matches!(
                    self.tag_name(*n),
                    Some("input" | "button" | "select" | "textarea")
                ) && self.form_of(*n) == Some(form)
            })
            .collect()
    }

    /// `<option>` elements of a select, in tree order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.is_tag(*n, "option"))
            .collect()
    }

    /// Returns whether a select accepts multiple selected options.
    pub fn is_multiple(&self, select: NodeId) -> bool {
        self.has_attribute(select, "multiple")
    }

    /// The value of an option: its `value` attribute or its text.
    pub fn option_value(&self, option: NodeId) -> String {
        self.attribute(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    /// Returns whether an option is selected. Single selects without an
    /// explicit selection select their first enabled option.
    pub fn is_option_selected(&self, option: NodeId) -> bool {
        if self.element(option).map(|e| e.selected).unwrap_or(false) {
            return true;
        }
        let Some(select) = self.closest(option, |d, n| d.is_tag(n, "select")) else {
            return false;
        };
        if self.is_multiple(select) {
            return false;
        }
        let options = self.options(select);
        let any_selected = options
            .iter()
            .any(|o| self.element(*o).map(|e| e.selected).unwrap_or(false));
        !any_selected && options.iter().find(|o| !self.is_disabled(**o)) == Some(&option)
    }

    /// Selected options of a select.
    pub fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        self.options(select)
            .into_iter()
            .filter(|o| self.is_option_selected(*o))
            .collect()
    }

    pub(crate) fn set_option_selected(&mut self, option: NodeId, selected: bool) {
        let select = self.closest(option, |d, n| d.is_tag(n, "select"));
        if selected {
            if let Some(select) = select.filter(|s| !self.is_multiple(*s)) {
                for other in self.options(select) {
                    if let Some(element) = self.element_mut(other) {
                        element.selected = false;
                    }
                }
            }
        }
        if let Some(element) = self.element_mut(option) {
            element.selected = selected;
        }
    }

    /// Radio buttons in the same group as `radio`.
    pub fn radio_group(&self, radio: NodeId) -> Vec<NodeId> {
        let Some(name) = self.attribute(radio, "name").filter(|n| !n.is_empty()) else {
            return vec![radio];
        };
        let form = self.form_of(radio);
        self.descendants(self.root())
            .into_iter()
            .filter(|n| {
                self.is_input_of_type(*n, InputType::Radio)
                    && self.attribute(*n, "name") == Some(name)
                    && self.form_of(*n) == form
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_parse() {
        assert_eq!(InputType::parse("NUMBER"), InputType::Number);
        assert_eq!(InputType::parse("datetime-local"), InputType::DatetimeLocal);
        assert_eq!(InputType::parse("bogus"), InputType::Text);
        assert!(InputType::Email.is_editable());
        assert!(!InputType::Email.supports_selection_api());
    }

    #[test]
    fn test_editability() {
        let doc = Document::from_markup(
            "<input id='a'><input id='b' readonly><input id='c' disabled>\
             <div id='d' contenteditable><p id='p'>x</p></div><fieldset disabled><input id='e'></fieldset>",
        )
        .unwrap();
        let q = |s| doc.query(s).unwrap();
        assert!(doc.is_editable(q("#a")));
        assert!(!doc.is_editable(q("#b")));
        assert!(!doc.is_editable(q("#c")));
        assert!(doc.is_editable(q("#p")));
        assert_eq!(doc.content_editable_host(q("#p")), Some(q("#d")));
        assert!(doc.is_disabled(q("#e")));
    }

    #[test]
    fn test_label_control() {
        let doc = Document::from_markup(
            "<label id='l1' for='x'>X</label><input id='x'><label id='l2'>Y <input id='y'></label>",
        )
        .unwrap();
        assert_eq!(doc.label_control(doc.query("#l1").unwrap()), doc.query("#x"));
        assert_eq!(doc.label_control(doc.query("#l2").unwrap()), doc.query("#y"));
    }

    #[test]
    fn test_tab_order_positive_first() {
        let doc = Document::from_markup(
            "<input id='a'><input id='b' tabindex='2'><input id='c' tabindex='-1'><input id='d' tabindex='1'>",
        )
        .unwrap();
        let ids: Vec<_> = doc
            .tab_order()
            .into_iter()
            .map(|n| doc.attribute(n, "id").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["d", "b", "a"]);
    }

    #[test]
    fn test_single_select_defaults_to_first_option() {
        let mut doc = Document::from_markup(
            "<select><option id='o1'>A</option><option id='o2' value='b'>B</option></select>",
        )
        .unwrap();
        let select = doc.query("select").unwrap();
        let o2 = doc.query("#o2").unwrap();
        assert_eq!(doc.value(select), "A");
        doc.set_option_selected(o2, true);
        assert_eq!(doc.value(select), "b");
    }
}
