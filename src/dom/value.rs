//! Control value state.
//!
//! Every `<input>` and `<textarea>` carries a [`ValueState`]. Besides the
//! sanitized value that scripts observe, it keeps a UI value shadow: the
//! literal text the user typed, which may be an invalid intermediate for
//! the control type (`"1e"` in a number field). Writes are tagged with a
//! [`WriteOrigin`] so simulated writes keep the shadow while writes from
//! application code reset it.

use super::{Document, DomError, DomResult, InputType, NodeId};
use tracing::trace;

/// Who performed a value or selection write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// The simulated user.
    Simulated,
    /// Application code.
    External,
}

/// Direction of a control's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionDirection {
    #[default]
    None,
    Forward,
    Backward,
}

/// How a UI selection write treats the existing anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Set both anchor and focus.
    Replace,
    /// Keep the existing anchor and move the focus.
    Modify,
}

/// Selection inside a control's UI value, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSelection {
    pub anchor: usize,
    pub focus: usize,
}

impl UiSelection {
    /// Collapsed selection at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            focus: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.focus)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone)]
struct TrackedWrites {
    previous: String,
    writes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ValueState {
    value: String,
    default_value: String,
    dirty: bool,
    ui_value: Option<String>,
    initial_value: Option<String>,
    ui_selection: Option<UiSelection>,
    selection: (usize, usize),
    direction: SelectionDirection,
    tracked: Option<TrackedWrites>,
    controlled: bool,
}

/// Character count used for all offsets in controls.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns whether `text` is a valid floating-point number string
/// (`-?(\d+|\d*\.\d+)([eE][+-]?\d+)?`).
pub(crate) fn is_valid_float(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            int.chars().all(|c| c.is_ascii_digit())
                && !frac.is_empty()
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    };
    let exponent_ok = exponent
        .map(|e| {
            let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(true);
    mantissa_ok && exponent_ok
}

fn parse_fixed(text: &str, digits: usize) -> Option<u32> {
    (text.len() == digits && text.chars().all(|c| c.is_ascii_digit()))
        .then(|| text.parse().ok())
        .flatten()
}

/// Returns whether `text` is a valid date string (`YYYY-MM-DD`).
pub(crate) fn is_valid_date(text: &str) -> bool {
    let mut parts = text.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let year = if year.len() >= 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year.parse::<u32>().ok()
    } else {
        None
    };
    let (Some(year), Some(month), Some(day)) = (year, parse_fixed(month, 2), parse_fixed(day, 2)) else {
        return false;
    };
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    year > 0 && day >= 1 && day <= days
}

/// Returns whether `text` is a valid time string
/// (`HH:MM`, `HH:MM:SS` or `HH:MM:SS.sss`).
pub(crate) fn is_valid_time(text: &str) -> bool {
    let mut parts = text.splitn(3, ':');
    let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
        return false;
    };
    let (Some(hours), Some(minutes)) = (parse_fixed(hours, 2), parse_fixed(minutes, 2)) else {
        return false;
    };
    if hours > 23 || minutes > 59 {
        return false;
    }
    match parts.next() {
        None => true,
        Some(seconds) => {
            let (whole, fraction) = match seconds.split_once('.') {
                Some((whole, fraction)) => (whole, Some(fraction)),
                None => (seconds, None),
            };
            let fraction_ok = fraction
                .map(|f| (1..=3).contains(&f.len()) && f.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(true);
            matches!(parse_fixed(whole, 2), Some(s) if s <= 59) && fraction_ok
        }
    }
}

fn sanitize(input_type: Option<InputType>, value: &str) -> String {
    match input_type {
        None => value.replace("\r\n", "\n"),
        Some(InputType::Number | InputType::Range) => {
            if is_valid_float(value) {
                value.to_string()
            } else {
                String::new()
            }
        }
        Some(InputType::Date) => {
            if is_valid_date(value) {
                value.to_string()
            } else {
                String::new()
            }
        }
        Some(InputType::Time) => {
            if is_valid_time(value) {
                value.to_string()
            } else {
                String::new()
            }
        }
        Some(InputType::Url | InputType::Email) => {
            value.replace(['\r', '\n'], "").trim().to_string()
        }
        Some(_) => value.replace(['\r', '\n'], ""),
    }
}

impl Document {
    fn control(&self, node: NodeId) -> Option<&ValueState> {
        self.element(node).and_then(|e| e.control.as_ref())
    }

    fn control_mut(&mut self, node: NodeId) -> Option<&mut ValueState> {
        self.element_mut(node).and_then(|e| e.control.as_mut())
    }

    /// Returns whether `node` is an input or textarea with value state.
    pub fn has_value_state(&self, node: NodeId) -> bool {
        self.control(node).is_some()
    }

    /// The value scripts observe.
    pub fn value(&self, node: NodeId) -> String {
        match self.input_type(node) {
            Some(InputType::Checkbox | InputType::Radio) => {
                return self.attribute(node, "value").unwrap_or("on").to_string();
            }
            Some(
                InputType::Submit
                | InputType::Reset
                | InputType::Button
                | InputType::Image
                | InputType::Hidden,
            ) => return self.attribute(node, "value").unwrap_or("").to_string(),
            _ => {}
        }
        if let Some(control) = self.control(node) {
            return control.value.clone();
        }
        if self.is_tag(node, "select") {
            return self
                .selected_options(node)
                .first()
                .map(|o| self.option_value(*o))
                .unwrap_or_default();
        }
        if self.is_tag(node, "option") {
            return self.option_value(node);
        }
        self.attribute(node, "value").unwrap_or("").to_string()
    }

    /// The text displayed in the control. Equals [`Document::value`]
    /// unless a simulated edit left an intermediate value.
    pub fn ui_value(&self, node: NodeId) -> String {
        self.control(node)
            .and_then(|c| c.ui_value.clone())
            .unwrap_or_else(|| self.value(node))
    }

    /// Sets the value from application code.
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.write_value(node, value, WriteOrigin::External);
    }

    /// Writes a control value.
    ///
    /// Simulated writes record the pre-edit value on first write, keep the
    /// literal text as UI value and start tracking application writes on
    /// controlled elements. External writes are recorded while tracking;
    /// otherwise they reset the UI value and move the UI caret to the end.
    pub fn write_value(&mut self, node: NodeId, value: &str, origin: WriteOrigin) {
        if self.is_tag(node, "select") {
            let target = self
                .options(node)
                .into_iter()
                .find(|o| self.option_value(*o) == value);
            for option in self.options(node) {
                if let Some(element) = self.element_mut(option) {
                    element.selected = Some(option) == target;
                }
            }
            return;
        }

        let input_type = self.input_type(node);
        let sanitized = sanitize(input_type, value);
        let describe = self.describe(node);
        let Some(control) = self.control_mut(node) else {
            return;
        };
        trace!(element = %describe, ?origin, value, "write value");

        let changed = control.value != sanitized;
        match origin {
            WriteOrigin::Simulated => {
                if control.initial_value.is_none() {
                    control.initial_value = Some(control.value.clone());
                }
                if control.controlled {
                    control.tracked = Some(TrackedWrites {
                        previous: control.value.clone(),
                        writes: Vec::new(),
                    });
                }
                control.ui_value = Some(value.to_string());
                control.value = sanitized;
                control.dirty = true;
            }
            WriteOrigin::External => {
                control.value = sanitized;
                control.dirty = true;
                let len = char_len(value);
                match control.tracked.as_mut() {
                    Some(tracked) => tracked.writes.push(value.to_string()),
                    None => {
                        control.ui_value = None;
                        control.ui_selection = Some(UiSelection::caret(len));
                    }
                }
            }
        }
        if changed {
            let len = char_len(&control.value);
            control.selection = (len, len);
            control.direction = SelectionDirection::None;
        }
    }

    /// Marks a control as driven by a framework that re-applies its state
    /// after each `input` event.
    pub fn set_controlled(&mut self, node: NodeId, controlled: bool) {
        if let Some(control) = self.control_mut(node) {
            control.controlled = controlled;
        }
    }

    /// Settles the UI value after the `input` event of a simulated edit.
    ///
    /// If exactly two application writes were observed, first restoring the
    /// previous value and then applying the new one, the UI value and
    /// `cursor` are kept. Any other set of writes resets the UI value and
    /// moves the caret to the end.
    pub(crate) fn commit_value_after_input(&mut self, node: NodeId, cursor: usize) {
        let Some(control) = self.control_mut(node) else {
            return;
        };
        let Some(tracked) = control.tracked.take() else {
            return;
        };
        if tracked.writes.is_empty() {
            return;
        }
        let state_update = tracked.writes.len() == 2
            && tracked.writes[0] == tracked.previous
            && tracked.writes[1] == control.value;
        if !state_update {
            control.ui_value = None;
        }
        if control.ui_selection.is_some() {
            let focus = if state_update {
                cursor
            } else {
                char_len(&control.value)
            };
            self.set_ui_selection(node, None, focus, SelectionMode::Replace);
        }
    }

    /// The value before the first simulated edit since the last commit.
    pub fn initial_value(&self, node: NodeId) -> Option<&str> {
        self.control(node).and_then(|c| c.initial_value.as_deref())
    }

    pub(crate) fn clear_initial_value(&mut self, node: NodeId) {
        if let Some(control) = self.control_mut(node) {
            control.initial_value = None;
        }
    }

    /// Numeric value of number and range inputs.
    pub fn value_as_number(&self, node: NodeId) -> Option<f64> {
        match self.input_type(node)? {
            InputType::Number | InputType::Range => self.value(node).parse().ok(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// The UI selection, falling back to the control's selection.
    pub fn ui_selection(&self, node: NodeId) -> UiSelection {
        match self.control(node) {
            Some(control) => control.ui_selection.unwrap_or(match control.direction {
                SelectionDirection::Backward => UiSelection {
                    anchor: control.selection.1,
                    focus: control.selection.0,
                },
                _ => UiSelection {
                    anchor: control.selection.0,
                    focus: control.selection.1,
                },
            }),
            None => UiSelection::caret(0),
        }
    }

    /// Returns whether a UI selection was recorded.
    pub fn has_ui_selection(&self, node: NodeId) -> bool {
        self.control(node)
            .map(|c| c.ui_selection.is_some())
            .unwrap_or(false)
    }

    /// Sets the UI selection. Offsets are clamped to the UI value. With
    /// [`SelectionMode::Modify`] the existing anchor is kept when present.
    pub fn set_ui_selection(
        &mut self,
        node: NodeId,
        anchor: Option<usize>,
        focus: usize,
        mode: SelectionMode,
    ) {
        let len = char_len(&self.ui_value(node));
        let Some(control) = self.control_mut(node) else {
            return;
        };
        let anchor = match (mode, control.ui_selection) {
            (SelectionMode::Modify, Some(existing)) => existing.anchor,
            _ => anchor.unwrap_or(focus).min(len),
        };
        let focus = focus.min(len);
        let selection = UiSelection { anchor, focus };
        control.ui_selection = Some(selection);
        control.selection = (selection.start(), selection.end());
        control.direction = if anchor > focus {
            SelectionDirection::Backward
        } else {
            SelectionDirection::None
        };
    }

    /// `(selectionStart, selectionEnd)` for controls exposing the selection
    /// API.
    pub fn selection_range(&self, node: NodeId) -> Option<(usize, usize)> {
        if !self.supports_selection_api(node) {
            return None;
        }
        self.control(node).map(|c| c.selection)
    }

    /// Direction of a control's selection.
    pub fn selection_direction(&self, node: NodeId) -> SelectionDirection {
        self.control(node)
            .map(|c| c.direction)
            .unwrap_or_default()
    }

    /// `setSelectionRange` from application code. Clears the UI selection.
    pub fn set_selection_range(
        &mut self,
        node: NodeId,
        start: usize,
        end: usize,
        direction: SelectionDirection,
    ) -> DomResult<()> {
        if !self.supports_selection_api(node) {
            return Err(DomError::InvalidState(format!(
                "{} does not support selection",
                self.describe(node)
            )));
        }
        let Some(control) = self.control_mut(node) else {
            return Err(DomError::NotAnElement(node));
        };
        let len = char_len(&control.value);
        let end = end.min(len);
        control.selection = (start.min(end), end);
        control.direction = direction;
        control.ui_selection = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Checkedness
    // ------------------------------------------------------------------

    /// Checkedness of checkboxes and radio buttons.
    pub fn checked(&self, node: NodeId) -> bool {
        self.element(node).map(|e| e.checked).unwrap_or(false)
    }

    /// Sets checkedness. Checking a radio button unchecks its group.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        if checked && self.is_input_of_type(node, InputType::Radio) {
            for other in self.radio_group(node) {
                if let Some(element) = self.element_mut(other) {
                    element.checked = false;
                }
            }
        }
        if let Some(element) = self.element_mut(node) {
            element.checked = checked;
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    pub(super) fn attribute_changed(&mut self, node: NodeId, name: &str) {
        match name {
            "value" => {
                let input_type = self.input_type(node);
                let attr = self.attribute(node, "value").unwrap_or("").to_string();
                if let Some(control) = self.control_mut(node) {
                    control.default_value = attr.clone();
                    if !control.dirty {
                        control.value = sanitize(input_type, &attr);
                        let len = char_len(&control.value);
                        control.selection = (len, len);
                    }
                }
            }
            "type" => {
                let input_type = self.input_type(node);
                if let Some(control) = self.control_mut(node) {
                    control.value = sanitize(input_type, &control.value);
                }
            }
            "checked" => {
                let checked = self.has_attribute(node, "checked");
                if let Some(element) = self.element_mut(node) {
                    element.default_checked = checked;
                }
                self.set_checked(node, checked);
            }
            "selected" if self.is_tag(node, "option") => {
                let selected = self.has_attribute(node, "selected");
                self.set_option_selected(node, selected);
            }
            _ => {}
        }
    }

    /// Called once an element and its children were loaded from markup.
    pub(super) fn finish_element(&mut self, node: NodeId) {
        if self.is_tag(node, "textarea") {
            let text = self.text_content(node);
            if let Some(control) = self.control_mut(node) {
                control.default_value = text.clone();
                if !control.dirty {
                    control.value = sanitize(None, &text);
                    let len = char_len(&control.value);
                    control.selection = (len, len);
                }
            }
        }
    }

    /// Restores every control of `form` to its default state.
    pub fn reset_form(&mut self, form: NodeId) {
        for control in self.form_controls(form) {
            let input_type = self.input_type(control);
            let default_checked = self.element(control).map(|e| e.default_checked).unwrap_or(false);
            if let Some(state) = self.control_mut(control) {
                state.value = sanitize(input_type, &state.default_value.clone());
                state.dirty = false;
                state.ui_value = None;
                state.ui_selection = None;
                state.initial_value = None;
                let len = char_len(&state.value);
                state.selection = (len, len);
            }
            if let Some(element) = self.element_mut(control) {
                element.checked = default_checked;
            }
            if self.is_tag(control, "select") {
                for option in self.options(control) {
                    let selected = self.has_attribute(option, "selected");
                    if let Some(element) = self.element_mut(option) {
                        element.selected = selected;
                    }
                }
            }
        }
    }
}
