//! Scriptable in-memory driver for tests and offline development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use pagepilot_dom_cache::ElementRecord;

use crate::errors::DriverError;
use crate::ports::{
    DriverPort, DriverSession, ElementDetails, OptionBy, Selector, TableRow, WaitCondition,
    ELEMENT_TEXT_CAP,
};

/// Scripted content for one mock page.
#[derive(Clone, Debug, Default)]
pub struct MockPage {
    pub elements: Vec<ElementRecord>,
    pub texts: HashMap<String, String>,
    pub tables: HashMap<String, Vec<TableRow>>,
    pub attributes: HashMap<String, HashMap<String, String>>,
    pub details: HashMap<String, ElementDetails>,
    /// Checkbox selectors mapped to their current checked state.
    pub checkboxes: HashMap<String, bool>,
}

#[derive(Default)]
struct MockState {
    pages: HashMap<String, MockPage>,
    /// Selectors whose element operations time out.
    failing: Vec<String>,
    actions: Vec<String>,
}

/// Driver whose pages are scripted up front. Every performed action is
/// recorded so tests can assert on ordering.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, address: impl Into<String>, page: MockPage) -> Self {
        self.state.lock().pages.insert(address.into(), page);
        self
    }

    pub fn with_elements(self, address: impl Into<String>, elements: Vec<ElementRecord>) -> Self {
        let page = MockPage {
            elements,
            ..Default::default()
        };
        self.with_page(address, page)
    }

    /// Make every element operation on `selector` fail with a timeout.
    pub fn failing_selector(self, selector: impl Into<String>) -> Self {
        self.state.lock().failing.push(selector.into());
        self
    }

    /// Actions performed so far, in order, formatted `op selector`.
    pub fn performed(&self) -> Vec<String> {
        self.state.lock().actions.clone()
    }
}

#[async_trait]
impl DriverPort for MockDriver {
    async fn launch(&self, address: &str) -> Result<Arc<dyn DriverSession>, DriverError> {
        if address.is_empty() {
            return Err(DriverError::Launch("empty address".into()));
        }
        debug!(address, "mock driver launched");
        self.state.lock().actions.push(format!("launch {address}"));
        Ok(Arc::new(MockSession {
            state: Arc::clone(&self.state),
            current: Mutex::new(address.to_string()),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    current: Mutex<String>,
}

impl MockSession {
    fn record(&self, op: &str, target: &str) {
        self.state.lock().actions.push(format!("{op} {target}"));
    }

    fn check_failure(&self, selector: &Selector, condition: &str) -> Result<(), DriverError> {
        let state = self.state.lock();
        if state.failing.iter().any(|s| s == &selector.selector) {
            return Err(DriverError::timeout(&selector.selector, condition, 10));
        }
        Ok(())
    }

    fn with_current_page<T>(
        &self,
        f: impl FnOnce(&mut MockPage) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let address = self.current.lock().clone();
        let mut state = self.state.lock();
        let page = state
            .pages
            .entry(address)
            .or_insert_with(MockPage::default);
        f(page)
    }
}

#[async_trait]
impl DriverSession for MockSession {
    fn current_address(&self) -> String {
        self.current.lock().clone()
    }

    async fn navigate(&self, address: &str) -> Result<(), DriverError> {
        self.record("navigate", address);
        *self.current.lock() = address.to_string();
        Ok(())
    }

    async fn scan_elements(&self, max_elements: usize) -> Result<Vec<ElementRecord>, DriverError> {
        let address = self.current.lock().clone();
        self.record("scan", &address);
        let state = self.state.lock();
        let mut elements = state
            .pages
            .get(&address)
            .map(|p| p.elements.clone())
            .unwrap_or_default();
        elements.truncate(max_elements);
        for element in &mut elements {
            element.text = element
                .text
                .trim()
                .chars()
                .take(ELEMENT_TEXT_CAP)
                .collect();
        }
        Ok(elements)
    }

    async fn click(&self, selector: &Selector) -> Result<(), DriverError> {
        self.check_failure(selector, "clickable")?;
        self.record("click", &selector.selector);
        Ok(())
    }

    async fn type_text(
        &self,
        selector: &Selector,
        text: &str,
        clear_first: bool,
    ) -> Result<(), DriverError> {
        self.check_failure(selector, "visible")?;
        self.record("type", &selector.selector);
        self.with_current_page(|page| {
            let details = page.details.entry(selector.selector.clone()).or_default();
            let value = details.value.get_or_insert_with(String::new);
            if clear_first {
                value.clear();
            }
            value.push_str(text);
            Ok(())
        })
    }

    async fn select_option(
        &self,
        selector: &Selector,
        option: &str,
        by: OptionBy,
    ) -> Result<(), DriverError> {
        self.check_failure(selector, "visible")?;
        if by == OptionBy::Index && option.parse::<usize>().is_err() {
            return Err(DriverError::InvalidOption(format!(
                "index option must be numeric, got '{option}'"
            )));
        }
        self.record("select", &selector.selector);
        Ok(())
    }

    async fn toggle_checkbox(&self, selector: &Selector) -> Result<bool, DriverError> {
        self.check_failure(selector, "clickable")?;
        self.record("check", &selector.selector);
        self.with_current_page(|page| {
            let checked = page
                .checkboxes
                .entry(selector.selector.clone())
                .or_insert(false);
            if !*checked {
                *checked = true;
            }
            Ok(*checked)
        })
    }

    async fn read_text(&self, selector: &Selector) -> Result<String, DriverError> {
        self.check_failure(selector, "visible")?;
        self.record("read_text", &selector.selector);
        self.with_current_page(|page| {
            page.texts
                .get(&selector.selector)
                .cloned()
                .ok_or_else(|| DriverError::NotFound(selector.selector.clone()))
        })
    }

    async fn read_table(&self, selector: &Selector) -> Result<Vec<TableRow>, DriverError> {
        self.check_failure(selector, "visible")?;
        self.record("read_table", &selector.selector);
        self.with_current_page(|page| {
            page.tables
                .get(&selector.selector)
                .cloned()
                .ok_or_else(|| DriverError::NotFound(selector.selector.clone()))
        })
    }

    async fn get_attribute(
        &self,
        selector: &Selector,
        attribute: &str,
    ) -> Result<String, DriverError> {
        self.check_failure(selector, "present")?;
        self.record("get_attribute", &selector.selector);
        self.with_current_page(|page| {
            page.attributes
                .get(&selector.selector)
                .and_then(|attrs| attrs.get(attribute))
                .cloned()
                .ok_or_else(|| DriverError::AttributeMissing {
                    attribute: attribute.to_string(),
                    selector: selector.selector.clone(),
                })
        })
    }

    async fn wait_for(
        &self,
        selector: &Selector,
        condition: WaitCondition,
    ) -> Result<(), DriverError> {
        self.check_failure(selector, &condition.to_string())?;
        self.record("wait_for", &selector.selector);
        Ok(())
    }

    async fn element_details(&self, selector: &Selector) -> Result<ElementDetails, DriverError> {
        self.check_failure(selector, "clickable")?;
        self.record("element_details", &selector.selector);
        self.with_current_page(|page| {
            Ok(page
                .details
                .get(&selector.selector)
                .cloned()
                .unwrap_or_default())
        })
    }
}
