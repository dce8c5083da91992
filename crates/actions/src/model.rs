use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagepilot_audit::ToolStatus;
use pagepilot_dom_cache::{ElementFilters, SelectorType};
use pagepilot_driver::{OptionBy, Selector, WaitCondition};

use crate::errors::ActionParseError;

/// Names of every declared action, in capability-listing order.
pub const ACTION_NAMES: &[&str] = &[
    "launch",
    "refresh_snapshot",
    "query_chunk",
    "find_one",
    "element_details",
    "click",
    "type_text",
    "select_option",
    "toggle_checkbox",
    "read_text",
    "read_table",
    "get_attribute",
    "wait_for",
];

/// One action request exactly as the oracle produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ActionRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// One executed step, kept in the session so the oracle can be reminded of
/// what already ran. `step_index` is 1-based and monotonic per goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_index: usize,
    pub action_name: String,
    pub status: ToolStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchArgs {
    pub address: String,
}

fn default_max_elements() -> usize {
    1000
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefreshSnapshotArgs {
    pub address: String,
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryChunkArgs {
    pub address: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub filters: ElementFilters,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FindOneArgs {
    pub address: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Common shape for actions that only target one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectorArgs {
    pub selector_type: SelectorType,
    pub selector: String,
}

impl SelectorArgs {
    pub fn to_selector(&self) -> Selector {
        Selector {
            selector_type: self.selector_type,
            selector: self.selector.clone(),
        }
    }
}

fn default_clear_first() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeTextArgs {
    pub selector_type: SelectorType,
    pub selector: String,
    pub text: String,
    #[serde(default = "default_clear_first")]
    pub clear_first: bool,
}

impl TypeTextArgs {
    pub fn to_selector(&self) -> Selector {
        Selector {
            selector_type: self.selector_type,
            selector: self.selector.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectOptionArgs {
    pub selector_type: SelectorType,
    pub selector: String,
    pub option: String,
    pub option_type: OptionBy,
}

impl SelectOptionArgs {
    pub fn to_selector(&self) -> Selector {
        Selector {
            selector_type: self.selector_type,
            selector: self.selector.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetAttributeArgs {
    pub selector_type: SelectorType,
    pub selector: String,
    pub attribute_name: String,
}

impl GetAttributeArgs {
    pub fn to_selector(&self) -> Selector {
        Selector {
            selector_type: self.selector_type,
            selector: self.selector.clone(),
        }
    }
}

fn default_condition() -> WaitCondition {
    WaitCondition::Visible
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitForArgs {
    pub selector_type: SelectorType,
    pub selector: String,
    #[serde(default = "default_condition")]
    pub condition: WaitCondition,
}

impl WaitForArgs {
    pub fn to_selector(&self) -> Selector {
        Selector {
            selector_type: self.selector_type,
            selector: self.selector.clone(),
        }
    }
}

/// The closed action set. Adding a capability means adding a variant here,
/// which forces the dispatcher match and the capability listing to follow.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Launch(LaunchArgs),
    RefreshSnapshot(RefreshSnapshotArgs),
    QueryChunk(QueryChunkArgs),
    FindOne(FindOneArgs),
    ElementDetails(SelectorArgs),
    Click(SelectorArgs),
    TypeText(TypeTextArgs),
    SelectOption(SelectOptionArgs),
    ToggleCheckbox(SelectorArgs),
    ReadText(SelectorArgs),
    ReadTable(SelectorArgs),
    GetAttribute(GetAttributeArgs),
    WaitFor(WaitForArgs),
}

impl Action {
    /// Map an oracle request onto the action set.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ActionParseError> {
        fn args<T: for<'de> Deserialize<'de>>(
            name: &str,
            value: &Value,
        ) -> Result<T, ActionParseError> {
            serde_json::from_value(value.clone()).map_err(|err| ActionParseError::BadArguments {
                name: name.to_string(),
                message: err.to_string(),
            })
        }

        let action = match name {
            "launch" => Self::Launch(args(name, arguments)?),
            "refresh_snapshot" => Self::RefreshSnapshot(args(name, arguments)?),
            "query_chunk" => Self::QueryChunk(args(name, arguments)?),
            "find_one" => Self::FindOne(args(name, arguments)?),
            "element_details" => Self::ElementDetails(args(name, arguments)?),
            "click" => Self::Click(args(name, arguments)?),
            "type_text" => Self::TypeText(args(name, arguments)?),
            "select_option" => Self::SelectOption(args(name, arguments)?),
            "toggle_checkbox" => Self::ToggleCheckbox(args(name, arguments)?),
            "read_text" => Self::ReadText(args(name, arguments)?),
            "read_table" => Self::ReadTable(args(name, arguments)?),
            "get_attribute" => Self::GetAttribute(args(name, arguments)?),
            "wait_for" => Self::WaitFor(args(name, arguments)?),
            other => return Err(ActionParseError::UnknownAction(other.to_string())),
        };
        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Launch(_) => "launch",
            Self::RefreshSnapshot(_) => "refresh_snapshot",
            Self::QueryChunk(_) => "query_chunk",
            Self::FindOne(_) => "find_one",
            Self::ElementDetails(_) => "element_details",
            Self::Click(_) => "click",
            Self::TypeText(_) => "type_text",
            Self::SelectOption(_) => "select_option",
            Self::ToggleCheckbox(_) => "toggle_checkbox",
            Self::ReadText(_) => "read_text",
            Self::ReadTable(_) => "read_table",
            Self::GetAttribute(_) => "get_attribute",
            Self::WaitFor(_) => "wait_for",
        }
    }

    /// Whether executing this action needs a live browser session.
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Self::Launch(_) | Self::QueryChunk(_) | Self::FindOne(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_every_declared_name() {
        let samples = vec![
            ("launch", json!({"address": "https://example.com"})),
            (
                "refresh_snapshot",
                json!({"address": "https://example.com"}),
            ),
            ("query_chunk", json!({"address": "https://example.com"})),
            ("find_one", json!({"address": "https://example.com"})),
            (
                "element_details",
                json!({"selector_type": "css", "selector": "#x"}),
            ),
            ("click", json!({"selector_type": "css", "selector": "#x"})),
            (
                "type_text",
                json!({"selector_type": "css", "selector": "#x", "text": "hi"}),
            ),
            (
                "select_option",
                json!({"selector_type": "css", "selector": "#x", "option": "UK", "option_type": "text"}),
            ),
            (
                "toggle_checkbox",
                json!({"selector_type": "css", "selector": "#x"}),
            ),
            ("read_text", json!({"selector_type": "css", "selector": "#x"})),
            ("read_table", json!({"selector_type": "xpath", "selector": "//table"})),
            (
                "get_attribute",
                json!({"selector_type": "css", "selector": "#x", "attribute_name": "href"}),
            ),
            ("wait_for", json!({"selector_type": "css", "selector": "#x"})),
        ];
        assert_eq!(samples.len(), ACTION_NAMES.len());
        for (name, arguments) in samples {
            let action = Action::parse(name, &arguments)
                .unwrap_or_else(|e| panic!("{name} failed to parse: {e}"));
            assert_eq!(action.name(), name);
        }
    }

    #[test]
    fn unknown_name_is_parse_error() {
        let err = Action::parse("rm_rf", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Tool 'rm_rf' not found");
    }

    #[test]
    fn malformed_arguments_are_parse_errors() {
        let err = Action::parse("click", &json!({"selector_type": "css"})).unwrap_err();
        assert!(err.to_string().contains("click"));
    }

    #[test]
    fn defaults_apply() {
        let action = Action::parse("query_chunk", &json!({"address": "https://a"})).unwrap();
        match action {
            Action::QueryChunk(args) => {
                assert_eq!(args.limit, 20);
                assert_eq!(args.offset, 0);
                assert!(args.filters.is_empty());
            }
            other => panic!("unexpected action: {other:?}"),
        }

        let action = Action::parse(
            "type_text",
            &json!({"selector_type": "css", "selector": "#x", "text": "hi"}),
        )
        .unwrap();
        match action {
            Action::TypeText(args) => assert!(args.clear_first),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn session_requirements() {
        let launch = Action::parse("launch", &json!({"address": "https://a"})).unwrap();
        assert!(!launch.needs_session());
        let query = Action::parse("query_chunk", &json!({"address": "https://a"})).unwrap();
        assert!(!query.needs_session());
        let click =
            Action::parse("click", &json!({"selector_type": "css", "selector": "#x"})).unwrap();
        assert!(click.needs_session());
    }
}
