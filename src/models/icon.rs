use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Semantic group an icon belongs to.
///
/// The discriminants are stable and match the order of the picker's category
/// dropdown, so `Category::from_index(dropdown.selected)` round-trips.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Query-only wildcard. Never assigned to a record.
    #[default]
    All = 0,
    Custom = 1,
    Distro = 2,
    Actions = 3,
    Apps = 4,
    Categories = 5,
    Devices = 6,
    Emblems = 7,
    Emotes = 8,
    Mimetypes = 9,
    Other = 10,
    Places = 11,
    Scalable = 12,
    Status = 13,
}

impl Category {
    /// Every category in dropdown order, `All` first.
    pub const ALL: [Category; 14] = [
        Category::All,
        Category::Custom,
        Category::Distro,
        Category::Actions,
        Category::Apps,
        Category::Categories,
        Category::Devices,
        Category::Emblems,
        Category::Emotes,
        Category::Mimetypes,
        Category::Other,
        Category::Places,
        Category::Scalable,
        Category::Status,
    ];

    /// Stable numeric index.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase token, as it appears in theme directory names.
    pub fn token(self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Custom => "custom",
            Category::Distro => "distro",
            Category::Actions => "actions",
            Category::Apps => "apps",
            Category::Categories => "categories",
            Category::Devices => "devices",
            Category::Emblems => "emblems",
            Category::Emotes => "emotes",
            Category::Mimetypes => "mimetypes",
            Category::Other => "other",
            Category::Places => "places",
            Category::Scalable => "scalable",
            Category::Status => "status",
        }
    }

    /// Human readable label for picker menus.
    pub fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Custom => "Custom",
            Category::Distro => "Distros",
            Category::Actions => "Actions",
            Category::Apps => "Applications",
            Category::Categories => "Categories",
            Category::Devices => "Devices",
            Category::Emblems => "Emblems",
            Category::Emotes => "Emotes",
            Category::Mimetypes => "Mimetypes",
            Category::Other => "Other",
            Category::Places => "Places",
            Category::Scalable => "Scalable",
            Category::Status => "Status",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when a string names no known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown icon category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts either the token (`apps`) or the label (`Applications`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.token().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A single entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRecord {
    /// Identifier, unique within one source pass.
    pub name: String,
    /// Value handed to the renderer. Equals `name` for theme icons, a resource
    /// locator for bundled ones.
    pub display_icon: String,
    pub category: Category,
}

impl IconRecord {
    pub fn new(name: impl Into<String>, display_icon: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            display_icon: display_icon.into(),
            category,
        }
    }
}

/// Immutable, name-sorted list of icon records.
///
/// Cloning is cheap: every clone points at the same published records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Arc<[IconRecord]>,
}

impl Catalog {
    /// Freeze records in the order given. Use
    /// [`sort_records`](crate::services::sort_records) first to get catalog order.
    pub fn from_sorted(records: Vec<IconRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IconRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[IconRecord] {
        &self.records
    }

    /// Find a record by exact name.
    pub fn get(&self, name: &str) -> Option<&IconRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// True when both handles refer to the same published catalog.
    pub fn ptr_eq(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Record counts per category, in dropdown order. Categories with no
    /// records are omitted.
    pub fn category_counts(&self) -> IndexMap<Category, usize> {
        let mut counts: IndexMap<Category, usize> = Category::ALL
            .into_iter()
            .filter(|c| *c != Category::All)
            .map(|c| (c, 0))
            .collect();

        for record in self.records.iter() {
            *counts.entry(record.category).or_insert(0) += 1;
        }

        counts.retain(|_, n| *n > 0);
        counts
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a IconRecord;
    type IntoIter = std::slice::Iter<'a, IconRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
