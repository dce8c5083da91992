use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pagepilot_dom_cache::{ElementRecord, SelectorType};

use crate::errors::DriverError;

/// A resolved element reference: how to interpret the string plus the string
/// itself. Always produced by a scan, never invented by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub selector_type: SelectorType,
    pub selector: String,
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector_type: SelectorType::Css,
            selector: selector.into(),
        }
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self {
            selector_type: SelectorType::Xpath,
            selector: selector.into(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}

/// Readiness condition for `wait_for`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitCondition {
    Visible,
    Clickable,
    Present,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::Present => "present",
        };
        f.write_str(label)
    }
}

/// How a dropdown option is identified.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionBy {
    Text,
    Value,
    Index,
}

/// One `<option>` under a select element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectOptionItem {
    pub text: String,
    pub value: String,
}

/// Current value or option listing of an element the agent is about to act on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<SelectOptionItem>,
}

/// One table row: column header (or `col_N`) to cell text.
pub type TableRow = BTreeMap<String, String>;

/// Maximum characters of element text a scan may store per element.
pub const ELEMENT_TEXT_CAP: usize = 80;

/// Factory boundary: opens a browser session navigated to an address.
#[async_trait]
pub trait DriverPort: Send + Sync {
    /// Launch a session and navigate to `address`. The returned handle owns
    /// the underlying browser for exactly one conversation; dropping the last
    /// reference releases it.
    async fn launch(&self, address: &str) -> Result<Arc<dyn DriverSession>, DriverError>;
}

/// One live browser session. All element operations wait internally for the
/// target to reach a sensible readiness state before acting, bounded by the
/// implementation's configured wait budget.
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Address of the page the session currently shows.
    fn current_address(&self) -> String;

    /// Navigate the existing session to a new address.
    async fn navigate(&self, address: &str) -> Result<(), DriverError>;

    /// Scan the page for capture-worthy elements, in document order.
    ///
    /// Contract: only tags in the interactive allow-list; element must be
    /// visible and enabled; selector preference is an id-based CSS selector,
    /// then class/name-based CSS, then an absolute XPath; candidates that do
    /// not resolve on the live page are discarded and elements with no
    /// resolvable selector are dropped entirely. Element text is
    /// whitespace-trimmed and capped at [`ELEMENT_TEXT_CAP`] characters. At
    /// most `max_elements` records are returned.
    async fn scan_elements(&self, max_elements: usize) -> Result<Vec<ElementRecord>, DriverError>;

    async fn click(&self, selector: &Selector) -> Result<(), DriverError>;

    async fn type_text(
        &self,
        selector: &Selector,
        text: &str,
        clear_first: bool,
    ) -> Result<(), DriverError>;

    async fn select_option(
        &self,
        selector: &Selector,
        option: &str,
        by: OptionBy,
    ) -> Result<(), DriverError>;

    /// Check an unchecked checkbox; a checked one is left untouched.
    /// Returns the final checked state.
    async fn toggle_checkbox(&self, selector: &Selector) -> Result<bool, DriverError>;

    async fn read_text(&self, selector: &Selector) -> Result<String, DriverError>;

    async fn read_table(&self, selector: &Selector) -> Result<Vec<TableRow>, DriverError>;

    async fn get_attribute(
        &self,
        selector: &Selector,
        attribute: &str,
    ) -> Result<String, DriverError>;

    async fn wait_for(
        &self,
        selector: &Selector,
        condition: WaitCondition,
    ) -> Result<(), DriverError>;

    async fn element_details(&self, selector: &Selector) -> Result<ElementDetails, DriverError>;
}
