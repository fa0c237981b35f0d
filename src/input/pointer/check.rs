//! `pointer-events: none` guard
//!
//! Pointer interactions with an element that has or inherits
//! `pointer-events: none` fail the gesture. Computing the style is the
//! expensive part, so results are cached per element and only re-evaluated
//! when the configured [`PointerEventsCheck`] level asks for it.

use crate::dom::{Document, NodeId, PointerEventsDeclaration};
use crate::input::{InputError, InputResult};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// How often the pointer-events guard re-evaluates an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerEventsCheck {
    /// Never check
    Never,
    /// Check each element once
    EachTarget,
    /// Check again in every API call
    #[default]
    EachApiCall,
    /// Check again for every pointer action
    EachTrigger,
}

impl PointerEventsCheck {
    fn bits(self) -> u8 {
        match self {
            Self::Never => 0,
            Self::EachTarget => 1,
            Self::EachApiCall => 2,
            Self::EachTrigger => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::EachTarget => "each-target",
            Self::EachApiCall => "each-api-call",
            Self::EachTrigger => "each-trigger",
        }
    }
}

impl fmt::Display for PointerEventsCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointerEventsCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "never" | "0" => Ok(Self::Never),
            "each-target" | "1" => Ok(Self::EachTarget),
            "each-api-call" | "2" => Ok(Self::EachApiCall),
            "each-trigger" | "4" => Ok(Self::EachTrigger),
            other => Err(format!("unknown pointer events check level: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
struct CheckRecord {
    call: u64,
    trigger: u64,
    result: PointerEventsDeclaration,
}

/// Per-session cache of pointer-events lookups
#[derive(Debug, Clone, Default)]
pub struct PointerEventsGuard {
    level: PointerEventsCheck,
    call: u64,
    trigger: u64,
    records: HashMap<NodeId, CheckRecord>,
}

impl PointerEventsGuard {
    pub fn new(level: PointerEventsCheck) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn level(&self) -> PointerEventsCheck {
        self.level
    }

    /// Starts a new API call
    pub fn next_call(&mut self) {
        self.call += 1;
    }

    /// Starts a new pointer action
    pub fn next_trigger(&mut self) {
        self.trigger += 1;
    }

    /// Forgets the cached result for one element, or for all of them
    pub fn invalidate(&mut self, node: Option<NodeId>) {
        match node {
            Some(node) => {
                self.records.remove(&node);
            }
            None => self.records.clear(),
        }
    }

    fn needs_check(&self, node: NodeId) -> bool {
        let bits = self.level.bits();
        if bits == 0 {
            return false;
        }
        match self.records.get(&node) {
            None => true,
            Some(record) => {
                (bits & PointerEventsCheck::EachApiCall.bits() != 0 && record.call != self.call)
                    || (bits & PointerEventsCheck::EachTrigger.bits() != 0
                        && record.trigger != self.trigger)
            }
        }
    }

    /// Resolved declaration for `node`, computing it only when the level
    /// requires it. `None` when checks are disabled and nothing is cached.
    pub fn check(&mut self, doc: &Document, node: NodeId) -> Option<PointerEventsDeclaration> {
        if !self.needs_check(node) {
            return self.records.get(&node).map(|r| r.result.clone());
        }
        let result = doc.pointer_events(node);
        trace!(element = %doc.describe(node), value = %result.value, "pointer-events lookup");
        self.records.insert(
            node,
            CheckRecord {
                call: self.call,
                trigger: self.trigger,
                result: result.clone(),
            },
        );
        Some(result)
    }
}

impl Session {
    /// Returns whether `node` receives pointer events.
    pub fn has_pointer_events(&mut self, doc: &Document, node: NodeId) -> bool {
        !self
            .pointer_guard
            .check(doc, node)
            .map(|d| d.is_none())
            .unwrap_or(false)
    }

    /// Fails with [`InputError::PointerEventsNone`] if `node` has or
    /// inherits `pointer-events: none`.
    pub fn assert_pointer_events(&mut self, doc: &Document, node: NodeId) -> InputResult<()> {
        match self.pointer_guard.check(doc, node) {
            Some(declaration) if declaration.is_none() => Err(InputError::PointerEventsNone {
                element: doc.describe(node),
                inherited_from: declaration
                    .declared_on
                    .filter(|d| *d != node)
                    .map(|d| doc.describe(d)),
            }),
            _ => Ok(()),
        }
    }

    /// Pointer-events cache of this session.
    pub fn pointer_guard_mut(&mut self) -> &mut PointerEventsGuard {
        &mut self.pointer_guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> (Document, NodeId, NodeId) {
        let doc = Document::from_markup(
            "<div id='off' style='pointer-events: none'><button id='b'>x</button></div><a id='on'>y</a>",
        )
        .unwrap();
        let button = doc.query("#b").unwrap();
        let link = doc.query("#on").unwrap();
        (doc, button, link)
    }

    #[test]
    fn test_each_target_checks_once() {
        let (doc, button, _) = doc();
        let mut guard = PointerEventsGuard::new(PointerEventsCheck::EachTarget);
        for _ in 0..3 {
            guard.next_call();
            guard.next_trigger();
            assert!(guard.check(&doc, button).unwrap().is_none());
        }
        assert_eq!(doc.style_lookups(), 1);

        guard.invalidate(Some(button));
        guard.check(&doc, button);
        assert_eq!(doc.style_lookups(), 2);
    }

    #[test]
    fn test_each_api_call_rechecks_per_call() {
        let (doc, _, link) = doc();
        let mut guard = PointerEventsGuard::new(PointerEventsCheck::EachApiCall);
        guard.check(&doc, link);
        guard.next_trigger();
        guard.check(&doc, link);
        assert_eq!(doc.style_lookups(), 1);
        guard.next_call();
        guard.check(&doc, link);
        assert_eq!(doc.style_lookups(), 2);
    }

    #[test]
    fn test_each_trigger_rechecks_per_action() {
        let (doc, _, link) = doc();
        let mut guard = PointerEventsGuard::new(PointerEventsCheck::EachTrigger);
        guard.check(&doc, link);
        guard.next_trigger();
        guard.check(&doc, link);
        assert_eq!(doc.style_lookups(), 2);
    }

    #[test]
    fn test_never_skips_lookup() {
        let (doc, button, _) = doc();
        let mut guard = PointerEventsGuard::new(PointerEventsCheck::Never);
        assert!(guard.check(&doc, button).is_none());
        assert_eq!(doc.style_lookups(), 0);
    }

    #[test]
    fn test_assert_names_declaring_ancestor() {
        let (doc, button, _) = doc();
        let mut session = Session::default();
        let err = session.assert_pointer_events(&doc, button).unwrap_err();
        match err {
            InputError::PointerEventsNone { inherited_from, .. } => {
                assert_eq!(inherited_from.as_deref(), Some("div#off"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("each-target".parse(), Ok(PointerEventsCheck::EachTarget));
        assert_eq!("EACH_TRIGGER".parse(), Ok(PointerEventsCheck::EachTrigger));
        assert!("sometimes".parse::<PointerEventsCheck>().is_err());
    }
}
