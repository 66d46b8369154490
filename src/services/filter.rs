use crate::models::{Catalog, Category, IconRecord};

/// Picker filter: a category plus a case-insensitive name substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    category: Category,
    search_text: String,
}

impl FilterQuery {
    /// Build a query. `search_text` is trimmed and lowercased.
    pub fn new(category: Category, search_text: &str) -> Self {
        Self {
            category,
            search_text: search_text.trim().to_lowercase(),
        }
    }

    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_search_text(mut self, search_text: &str) -> Self {
        self.search_text = search_text.trim().to_lowercase();
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The normalized search text.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn is_match_all(&self) -> bool {
        self.category == Category::All && self.search_text.is_empty()
    }
}

/// Whether `record` passes `query`.
pub fn matches(record: &IconRecord, query: &FilterQuery) -> bool {
    if query.category != Category::All && record.category != query.category {
        return false;
    }

    query.search_text.is_empty() || record.name.to_lowercase().contains(&query.search_text)
}

/// Lazily yield the records of `catalog` that pass `query`, in catalog order.
pub fn filter<'a>(
    catalog: &'a Catalog,
    query: &'a FilterQuery,
) -> impl Iterator<Item = &'a IconRecord> + 'a {
    catalog.iter().filter(move |record| matches(record, query))
}
