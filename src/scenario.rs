//! Scripted sessions
//!
//! A scenario is a document plus a list of user steps, stored as TOML or
//! JSON. Running it replays the steps through [`crate::api`] and reports
//! every dispatched event together with the final control values.
//!
//! ```toml
//! markup = "<form><input id='name'><button>Send</button></form>"
//!
//! [[steps]]
//! action = "type"
//! target = "#name"
//! text = "Ada{Enter}"
//! ```

use crate::api::{self, TypeOptions};
use crate::config::SessionSettings;
use crate::dom::{Document, DomError, NodeId};
use crate::input::clipboard::DataTransfer;
use crate::input::pointer::{PointerAction, PointerPosition};
use crate::input::InputError;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while loading or running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML scenario: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported scenario file format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Dom(#[from] DomError),

    /// A step failed.
    #[error("Step {step} ({action}) failed: {source}")]
    Step {
        step: usize,
        action: &'static str,
        #[source]
        source: InputError,
    },

    /// A selector matched no element.
    #[error("Step {step}: no element matches \"{selector}\"")]
    UnknownTarget { step: usize, selector: String },
}

/// One user step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Keyboard {
        text: String,
    },
    /// Raw pointer descriptors such as `[MouseLeft>]`. Without `keys` the
    /// pointer only moves.
    Pointer {
        #[serde(default)]
        keys: Option<String>,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        offset: Option<usize>,
    },
    Click {
        target: String,
    },
    DblClick {
        target: String,
    },
    TripleClick {
        target: String,
    },
    Hover {
        target: String,
    },
    Unhover {
        target: String,
    },
    Type {
        target: String,
        text: String,
        #[serde(default)]
        skip_click: Option<bool>,
    },
    Clear {
        target: String,
    },
    Tab {
        #[serde(default)]
        shift: bool,
    },
    SelectOptions {
        target: String,
        values: Vec<String>,
    },
    DeselectOptions {
        target: String,
        values: Vec<String>,
    },
    Copy,
    Cut,
    Paste {
        #[serde(default)]
        text: Option<String>,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Keyboard { .. } => "keyboard",
            Step::Pointer { .. } => "pointer",
            Step::Click { .. } => "click",
            Step::DblClick { .. } => "dbl_click",
            Step::TripleClick { .. } => "triple_click",
            Step::Hover { .. } => "hover",
            Step::Unhover { .. } => "unhover",
            Step::Type { .. } => "type",
            Step::Clear { .. } => "clear",
            Step::Tab { .. } => "tab",
            Step::SelectOptions { .. } => "select_options",
            Step::DeselectOptions { .. } => "deselect_options",
            Step::Copy => "copy",
            Step::Cut => "cut",
            Step::Paste { .. } => "paste",
        }
    }
}

/// A document and the steps to replay on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub markup: String,
    /// Session settings, defaults when absent
    #[serde(default)]
    pub settings: Option<SessionSettings>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event: String,
    pub target: String,
    pub default_prevented: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<u32>,
}

/// Final state of a form control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlValue {
    pub element: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub events: Vec<EventRecord>,
    pub values: Vec<ControlValue>,
    pub focused: Option<String>,
    pub submissions: usize,
}

impl Scenario {
    /// Loads a scenario, TOML or JSON by file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => Ok(toml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            ext => Err(ScenarioError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Replays the steps on a fresh document.
    ///
    /// `settings` replaces the scenario's own settings when given.
    pub async fn run(&self, settings: Option<SessionSettings>) -> Result<ScenarioReport, ScenarioError> {
        let settings = settings
            .or_else(|| self.settings.clone())
            .unwrap_or_default();
        let mut doc = Document::from_markup(&self.markup)?;
        doc.enable_event_log();
        let mut session = Session::new(settings);
        info!(steps = self.steps.len(), "running scenario");

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            debug!(step = number, action = step.name(), "step");
            run_step(&mut session, &mut doc, number, step)
                .await
                .map_err(|failure| match failure {
                    StepFailure::Target(selector) => ScenarioError::UnknownTarget {
                        step: number,
                        selector,
                    },
                    StepFailure::Input(source) => ScenarioError::Step {
                        step: number,
                        action: step.name(),
                        source,
                    },
                })?;
        }

        Ok(report(&doc))
    }
}

enum StepFailure {
    Target(String),
    Input(InputError),
}

impl From<InputError> for StepFailure {
    fn from(err: InputError) -> Self {
        StepFailure::Input(err)
    }
}

fn resolve(doc: &Document, selector: &str) -> Result<NodeId, StepFailure> {
    doc.query(selector)
        .ok_or_else(|| StepFailure::Target(selector.to_string()))
}

async fn run_step(
    session: &mut Session,
    doc: &mut Document,
    number: usize,
    step: &Step,
) -> Result<(), StepFailure> {
    match step {
        Step::Keyboard { text } => api::keyboard(session, doc, text).await?,
        Step::Pointer {
            keys,
            target,
            offset,
        } => {
            let mut position = PointerPosition::default();
            if let Some(selector) = target {
                position.target = Some(resolve(doc, selector)?);
            }
            if let Some(offset) = offset {
                position = position.with_offset(*offset);
            }
            let action = match keys {
                Some(keys) => PointerAction::Keys {
                    keys: keys.clone(),
                    position,
                },
                None => PointerAction::Move {
                    pointer: None,
                    position,
                },
            };
            api::pointer(session, doc, &[action]).await?
        }
        Step::Click { target } => {
            let element = resolve(doc, target)?;
            api::click(session, doc, element).await?
        }
        Step::DblClick { target } => {
            let element = resolve(doc, target)?;
            api::dbl_click(session, doc, element).await?
        }
        Step::TripleClick { target } => {
            let element = resolve(doc, target)?;
            api::triple_click(session, doc, element).await?
        }
        Step::Hover { target } => {
            let element = resolve(doc, target)?;
            api::hover(session, doc, element).await?
        }
        Step::Unhover { target } => {
            let element = resolve(doc, target)?;
            api::unhover(session, doc, element).await?
        }
        Step::Type {
            target,
            text,
            skip_click,
        } => {
            let element = resolve(doc, target)?;
            let options = TypeOptions {
                skip_click: *skip_click,
                ..TypeOptions::default()
            };
            api::type_text_with(session, doc, element, text, options).await?
        }
        Step::Clear { target } => {
            let element = resolve(doc, target)?;
            api::clear(session, doc, element).await?
        }
        Step::Tab { shift } => api::tab(session, doc, *shift).await?,
        Step::SelectOptions { target, values } => {
            let element = resolve(doc, target)?;
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            api::select_options(session, doc, element, &values).await?
        }
        Step::DeselectOptions { target, values } => {
            let element = resolve(doc, target)?;
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            api::deselect_options(session, doc, element, &values).await?
        }
        Step::Copy => {
            api::copy(session, doc).await?;
        }
        Step::Cut => {
            api::cut(session, doc).await?;
        }
        Step::Paste { text } => {
            let data = text.as_deref().map(DataTransfer::from_text);
            api::paste(session, doc, data).await?
        }
    }
    debug!(step = number, "step done");
    Ok(())
}

fn report(doc: &Document) -> ScenarioReport {
    let events = doc
        .event_log()
        .iter()
        .map(|event| EventRecord {
            event: event.event_type.to_string(),
            target: doc.describe(event.target),
            default_prevented: event.default_prevented,
            key: event.key().map(str::to_string),
            data: event.data().map(str::to_string),
            detail: (event.detail() > 0).then(|| event.detail()),
        })
        .collect();

    let values = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|n| doc.has_value_state(*n))
        .map(|n| ControlValue {
            element: doc.describe(n),
            value: doc.value(n),
            checked: doc
                .input_type(n)
                .filter(|t| t.is_checkable())
                .map(|_| doc.checked(n)),
        })
        .collect();

    ScenarioReport {
        events,
        values,
        focused: doc.active_element().map(|n| doc.describe(n)),
        submissions: doc.submissions().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r##"
markup = "<form><input id='name'><input id='agree' type='checkbox'></form>"

[[steps]]
action = "type"
target = "#name"
text = "Ada"

[[steps]]
action = "click"
target = "#agree"
"##;

    #[test]
    fn test_parse_toml_scenario() {
        let scenario: Scenario = toml::from_str(SCENARIO).unwrap();
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(
            scenario.steps[1],
            Step::Click {
                target: "#agree".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_run_reports_values_and_events() {
        let scenario: Scenario = toml::from_str(SCENARIO).unwrap();
        let report = scenario
            .run(Some(SessionSettings::default().with_delay(None)))
            .await
            .unwrap();

        let name = report.values.iter().find(|v| v.element.contains("name")).unwrap();
        assert_eq!(name.value, "Ada");
        let agree = report.values.iter().find(|v| v.element.contains("agree")).unwrap();
        assert_eq!(agree.checked, Some(true));
        assert!(report.events.iter().any(|e| e.event == "change"));
        assert_eq!(report.focused.as_deref().map(|f| f.contains("agree")), Some(true));
    }

    #[tokio::test]
    async fn test_unknown_target_is_reported() {
        let scenario = Scenario {
            markup: "<p>hi</p>".to_string(),
            settings: None,
            steps: vec![Step::Click {
                target: "#missing".to_string(),
            }],
        };
        let err = scenario.run(None).await.unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownTarget { step: 1, .. }));
    }

    #[test]
    fn test_json_scenario() {
        let json = r#"{"markup": "<input>", "steps": [{"action": "tab"}, {"action": "keyboard", "text": "x"}]}"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps[0], Step::Tab { shift: false });
    }
}
