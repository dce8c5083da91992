use dashmap::DashMap;
use tracing::debug;

use crate::fuzzy::partial_ratio;
use crate::model::{ElementFilters, ElementRecord, ElementView};
use crate::policy::FilterPolicy;

/// Shared store of captured elements, keyed by canonical page address.
///
/// The store is shared across sessions. `refresh` is the only write path and
/// replaces an address's element set wholesale; concurrent refresh and query
/// on the same address race under last-writer-wins, which is acceptable
/// because query results are advisory.
pub struct DomCache {
    pages: DashMap<String, Vec<ElementRecord>>,
    policy: FilterPolicy,
}

impl DomCache {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            pages: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// Replace the stored element set for `address`, keeping at most
    /// `max_elements` entries in scan order. Records with an empty selector
    /// never enter the cache. Returns the stored count.
    pub fn refresh(
        &self,
        address: &str,
        elements: Vec<ElementRecord>,
        max_elements: usize,
    ) -> usize {
        let mut kept: Vec<ElementRecord> = elements
            .into_iter()
            .filter(|e| !e.selector.is_empty())
            .collect();
        kept.truncate(max_elements);
        let count = kept.len();
        debug!(address, count, "dom cache refreshed");
        self.pages.insert(address.to_string(), kept);
        count
    }

    /// Whether `address` has ever been refreshed.
    pub fn has_page(&self, address: &str) -> bool {
        self.pages.contains_key(address)
    }

    /// Number of elements currently stored for `address`.
    pub fn element_count(&self, address: &str) -> usize {
        self.pages.get(address).map(|e| e.len()).unwrap_or(0)
    }

    /// Read the `[offset, offset + limit)` page of the filtered element set.
    ///
    /// Returns `None` when the address has never been refreshed or nothing
    /// survives the filters; an empty vec only occurs when the offset runs
    /// past the end of a non-empty filtered set.
    pub fn query(
        &self,
        address: &str,
        limit: usize,
        offset: usize,
        filters: &ElementFilters,
    ) -> Option<Vec<ElementView>> {
        let elements = self.pages.get(address)?;

        let filtered: Vec<(usize, &ElementRecord)> = elements
            .iter()
            .filter(|e| self.matches(e, filters))
            .enumerate()
            .collect();

        if filtered.is_empty() {
            return None;
        }

        let views = filtered
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(idx, record)| ElementView {
                idx,
                record: record.clone(),
            })
            .collect();
        Some(views)
    }

    /// First stored element matching every provided criterion.
    ///
    /// Unlike the chunk query this is an exact lookup: tag, id and name
    /// compare equal, text matches by substring.
    pub fn find_one(
        &self,
        address: &str,
        tag: Option<&str>,
        text: Option<&str>,
        name: Option<&str>,
        id: Option<&str>,
    ) -> Option<ElementRecord> {
        let elements = self.pages.get(address)?;
        elements
            .iter()
            .find(|e| {
                if let Some(tag) = tag {
                    if e.tag != tag {
                        return false;
                    }
                }
                if let Some(id) = id {
                    if e.element_id.as_deref() != Some(id) {
                        return false;
                    }
                }
                if let Some(name) = name {
                    if e.name.as_deref() != Some(name) {
                        return false;
                    }
                }
                if let Some(text) = text {
                    if !e.text.contains(text) {
                        return false;
                    }
                }
                true
            })
            .cloned()
    }

    fn matches(&self, element: &ElementRecord, filters: &ElementFilters) -> bool {
        if let Some(tag) = &filters.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(text) = &filters.text {
            let haystack = element.text.to_lowercase();
            if haystack.is_empty()
                || partial_ratio(&text.to_lowercase(), &haystack) <= self.policy.text_similarity
            {
                return false;
            }
        }
        if let Some(id) = &filters.id {
            let Some(element_id) = &element.element_id else {
                return false;
            };
            if partial_ratio(&id.to_lowercase(), &element_id.to_lowercase())
                <= self.policy.ident_similarity
            {
                return false;
            }
        }
        if let Some(name) = &filters.name {
            let Some(element_name) = &element.name else {
                return false;
            };
            if partial_ratio(&name.to_lowercase(), &element_name.to_lowercase())
                <= self.policy.ident_similarity
            {
                return false;
            }
        }
        true
    }
}

impl Default for DomCache {
    fn default() -> Self {
        Self::new(FilterPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementExtras, SelectorType};

    fn element(tag: &str, id: Option<&str>, text: &str) -> ElementRecord {
        ElementRecord {
            tag: tag.into(),
            element_id: id.map(Into::into),
            name: None,
            text: text.into(),
            visible: true,
            enabled: true,
            selector_type: SelectorType::Css,
            selector: id.map(|i| format!("#{i}")).unwrap_or_else(|| tag.into()),
            extras: ElementExtras::default(),
        }
    }

    fn seeded() -> DomCache {
        let cache = DomCache::default();
        cache.refresh(
            "https://example.com",
            vec![
                element("a", Some("home"), "Home"),
                element("button", Some("login-btn"), "Log in"),
                element("input", Some("username"), ""),
                element("button", Some("signup"), "Sign up for free"),
                element("span", None, "Welcome back"),
            ],
            100,
        );
        cache
    }

    #[test]
    fn refresh_replaces_not_merges() {
        let cache = seeded();
        let count = cache.refresh(
            "https://example.com",
            vec![element("button", Some("only"), "Only")],
            100,
        );
        assert_eq!(count, 1);

        let views = cache
            .query("https://example.com", 10, 0, &ElementFilters::default())
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].record.element_id.as_deref(), Some("only"));
    }

    #[test]
    fn refresh_caps_and_drops_empty_selectors() {
        let cache = DomCache::default();
        let mut broken = element("span", None, "ghost");
        broken.selector.clear();
        let count = cache.refresh(
            "https://example.com",
            vec![
                broken,
                element("a", Some("a1"), "one"),
                element("a", Some("a2"), "two"),
                element("a", Some("a3"), "three"),
            ],
            2,
        );
        assert_eq!(count, 2);
        assert_eq!(cache.element_count("https://example.com"), 2);
    }

    #[test]
    fn query_unknown_address_is_no_match() {
        let cache = DomCache::default();
        assert!(cache
            .query("https://nowhere", 10, 0, &ElementFilters::default())
            .is_none());
    }

    #[test]
    fn pagination_is_contiguous_and_gap_free() {
        let cache = DomCache::default();
        let elements = (0..10)
            .map(|i| element("a", Some(&format!("link{i}")), &format!("link {i}")))
            .collect();
        cache.refresh("https://example.com", elements, 100);

        let first = cache
            .query("https://example.com", 4, 0, &ElementFilters::default())
            .unwrap();
        let second = cache
            .query("https://example.com", 4, 4, &ElementFilters::default())
            .unwrap();

        let indexes: Vec<usize> = first
            .iter()
            .chain(second.iter())
            .map(|v| v.idx)
            .collect();
        assert_eq!(indexes, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn tag_filter_is_exact_case_insensitive() {
        let cache = seeded();
        let filters = ElementFilters {
            tag: Some("BUTTON".into()),
            ..Default::default()
        };
        let views = cache.query("https://example.com", 10, 0, &filters).unwrap();
        assert_eq!(views.len(), 2);
        // Indexes are positions within the filtered set, not the raw one.
        assert_eq!(views[0].idx, 0);
        assert_eq!(views[1].idx, 1);
    }

    #[test]
    fn text_filter_tolerates_typos() {
        let cache = seeded();
        let filters = ElementFilters {
            text: Some("sign up".into()),
            ..Default::default()
        };
        let views = cache.query("https://example.com", 10, 0, &filters).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].record.element_id.as_deref(), Some("signup"));
    }

    #[test]
    fn id_filter_rejects_unrelated() {
        let cache = seeded();
        let filters = ElementFilters {
            id: Some("zzzz-qqq".into()),
            ..Default::default()
        };
        assert!(cache.query("https://example.com", 10, 0, &filters).is_none());
    }

    #[test]
    fn conjunctive_filters() {
        let cache = seeded();
        let filters = ElementFilters {
            tag: Some("button".into()),
            text: Some("log in".into()),
            ..Default::default()
        };
        let views = cache.query("https://example.com", 10, 0, &filters).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].record.element_id.as_deref(), Some("login-btn"));
    }

    #[test]
    fn find_one_exact_lookup() {
        let cache = seeded();
        let found = cache
            .find_one("https://example.com", Some("button"), None, None, Some("signup"))
            .unwrap();
        assert_eq!(found.text, "Sign up for free");

        assert!(cache
            .find_one("https://example.com", Some("table"), None, None, None)
            .is_none());
    }

    #[test]
    fn addresses_are_independent() {
        let cache = seeded();
        cache.refresh(
            "https://other.com",
            vec![element("a", Some("other"), "elsewhere")],
            100,
        );
        assert_eq!(cache.element_count("https://example.com"), 5);
        assert_eq!(cache.element_count("https://other.com"), 1);
    }
}
