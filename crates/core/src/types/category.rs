//! Navigation categories and category filtering.

use std::fmt;

use serde::{Serialize, Serializer};

use super::catalog::Product;

/// Category names shown in navigation, in order.
pub const NAVIGATION_CATEGORIES: [&str; 3] = ["All", "Clothes", "Tech"];

/// Backend category spellings accepted for each navigation category.
const CATEGORY_ALIASES: &[(&str, &[&str])] = &[
    ("tech", &["tech", "phones", "mobiles", "electronics", "gadgets"]),
    ("clothes", &["clothes", "apparel", "wearables"]),
];

/// A storefront category selected from navigation or a URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    /// A named category, stored in display form (`Tech`).
    Named(String),
}

impl Category {
    /// Resolve a URL slug. Empty and `all` (any case) select everything;
    /// anything else is capitalised for display (`tech` → `Tech`).
    #[must_use]
    pub fn from_slug(slug: &str) -> Self {
        let slug = slug.trim().trim_matches('/');
        if slug.is_empty() || slug.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        let mut chars = slug.chars();
        let display = chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        });
        Self::Named(display)
    }

    /// The navigation categories, `All` first.
    #[must_use]
    pub fn navigation() -> Vec<Self> {
        NAVIGATION_CATEGORIES
            .iter()
            .map(|name| Self::from_slug(name))
            .collect()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Named(name) => name,
        }
    }

    /// Lowercase slug used in URLs.
    #[must_use]
    pub fn slug(&self) -> String {
        self.display_name().to_lowercase()
    }

    /// Whether a product's backend category belongs to this category.
    #[must_use]
    pub fn matches(&self, product_category: &str) -> bool {
        let Self::Named(_) = self else {
            return true;
        };
        let slug = self.slug();
        let product_category = product_category.to_lowercase();
        CATEGORY_ALIASES
            .iter()
            .find(|(name, _)| *name == slug)
            .map_or_else(
                || product_category == slug,
                |(_, aliases)| aliases.contains(&product_category.as_str()),
            )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// Products belonging to `category`, in their original order.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], category: &Category) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| category.matches(&p.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::catalog::fixtures::product;
    use super::*;

    #[test]
    fn test_from_slug() {
        assert_eq!(Category::from_slug(""), Category::All);
        assert_eq!(Category::from_slug("ALL"), Category::All);
        assert_eq!(
            Category::from_slug("/clothes"),
            Category::Named("Clothes".to_string())
        );
        assert_eq!(Category::from_slug("tech").slug(), "tech");
    }

    #[test]
    fn test_navigation_order() {
        let names: Vec<String> = Category::navigation()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["All", "Clothes", "Tech"]);
    }

    #[test]
    fn test_aliases() {
        let tech = Category::from_slug("tech");
        assert!(tech.matches("phones"));
        assert!(tech.matches("Electronics"));
        assert!(!tech.matches("apparel"));
        assert!(Category::from_slug("clothes").matches("wearables"));
        assert!(Category::All.matches("anything"));
    }

    #[test]
    fn test_unknown_category_matches_own_name() {
        let toys = Category::from_slug("toys");
        assert!(toys.matches("TOYS"));
        assert!(!toys.matches("tech"));
    }

    #[test]
    fn test_filter_products_keeps_order() {
        let products = vec![
            product("jacket", "clothes", Vec::new()),
            product("iphone", "phones", Vec::new()),
            product("ps5", "tech", Vec::new()),
        ];
        let tech: Vec<&str> = filter_products(&products, &Category::from_slug("tech"))
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(tech, vec!["iphone", "ps5"]);
        assert_eq!(filter_products(&products, &Category::All).len(), 3);
    }
}
