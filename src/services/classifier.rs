use crate::models::Category;
use regex::Regex;
use std::sync::LazyLock;

/// Theme directory tokens, in match priority order.
const CATEGORY_TOKENS: [(Category, &str); 9] = [
    (Category::Actions, "actions"),
    (Category::Apps, "apps"),
    (Category::Categories, "categories"),
    (Category::Devices, "devices"),
    (Category::Emblems, "emblems"),
    (Category::Emotes, "emotes"),
    (Category::Mimetypes, "mimetypes"),
    (Category::Places, "places"),
    (Category::Status, "status"),
];

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::new);

/// Maps a resolved icon path to a [`Category`].
///
/// Each token must appear as a whole path segment, optionally followed
/// directly by a size segment (`48`, `48x48`, `48x48@2`, `scalable`):
///
/// - `/usr/share/icons/Adwaita/scalable/actions/edit-copy.svg` is `Actions`
/// - `/usr/share/icons/hicolor/apps/48/firefox.png` is `Apps`
/// - `/opt/x/other/bar.png` is `Other`
///
/// `scalable` alone is a size segment, not a category. It only yields
/// `Scalable` when the classifier is built with
/// [`with_scalable_category(true)`](Self::with_scalable_category).
#[derive(Debug, Clone)]
pub struct Classifier {
    /// One compiled pattern per category token, tried in order.
    patterns: Vec<(Category, Regex)>,

    /// Matches a bare `/scalable/` segment.
    scalable_pattern: Regex,

    scalable_category: bool,
}

impl Classifier {
    /// Create a classifier with compiled token patterns.
    pub fn new() -> Self {
        let patterns = CATEGORY_TOKENS
            .iter()
            .map(|(category, token)| {
                let pattern = format!(r"(?i)/{token}/?(?:[\dx@]+|scalable)?/");
                (*category, Regex::new(&pattern).expect("Invalid category regex"))
            })
            .collect();

        Self {
            patterns,
            scalable_pattern: Regex::new(r"(?i)/scalable/").expect("Invalid scalable regex"),
            scalable_category: false,
        }
    }

    pub fn with_scalable_category(mut self, enabled: bool) -> Self {
        self.scalable_category = enabled;
        self
    }

    /// Classify a resolved path or URI. First matching token wins.
    pub fn classify(&self, resolved_path: &str) -> Category {
        if let Some((category, _)) = self
            .patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(resolved_path))
        {
            return *category;
        }

        if self.scalable_category && self.scalable_pattern.is_match(resolved_path) {
            return Category::Scalable;
        }

        Category::Other
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the default rules (`scalable` alone is `Other`).
pub fn classify(resolved_path: &str) -> Category {
    DEFAULT_CLASSIFIER.classify(resolved_path)
}

/// Category of an icon shipped in the application's own bundle.
pub fn bundled_category(name: &str, distro_prefix: &str) -> Category {
    if !distro_prefix.is_empty() && name.starts_with(distro_prefix) {
        Category::Distro
    } else {
        Category::Custom
    }
}
