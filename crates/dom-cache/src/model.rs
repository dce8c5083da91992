use serde::{Deserialize, Serialize};

/// Tag kinds worth capturing; everything else is skipped at scan time.
pub const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "textarea", "select", "label", "form", "img", "table", "span",
];

/// How a stored selector string must be interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    Css,
    Xpath,
}

/// One captured element.
///
/// Invariant: `selector` is non-empty and resolved under `selector_type` at
/// capture time. Elements with no derivable selector are dropped before they
/// reach the cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub text: String,
    pub visible: bool,
    pub enabled: bool,
    pub selector_type: SelectorType,
    pub selector: String,
    #[serde(flatten)]
    pub extras: ElementExtras,
}

/// Tag-specific attributes carried alongside the common fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementExtras {
    /// `type` attribute of inputs and buttons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Placeholder of inputs and textareas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Number of options under a select.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_count: Option<u32>,
    /// Anchor target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Button value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Form action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Form method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// One entry of a chunk query result.
///
/// `idx` is the element's absolute position in the filtered ordering, so a
/// caller paging with a growing offset sees a stable, gap-free enumeration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementView {
    pub idx: usize,
    #[serde(flatten)]
    pub record: ElementRecord,
}

/// Conjunctive filters for a chunk query. All present fields must match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementFilters {
    /// Exact tag match, case-insensitive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Fuzzy match against element text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Fuzzy match against the element id attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Fuzzy match against the name attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ElementFilters {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.text.is_none() && self.id.is_none() && self.name.is_none()
    }
}
