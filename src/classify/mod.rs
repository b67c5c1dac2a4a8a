//! Category and subcategory assignment for figure files.

use crate::config::CategoryRule;
use crate::domain::{FigureMetadata, MISC_CATEGORY};
use std::path::PathBuf;

/// Where a figure belongs, relative to the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub category: String,
    pub subdirectory: Option<String>,
}

impl Destination {
    pub fn is_misc(&self) -> bool {
        self.category == MISC_CATEGORY
    }

    /// `<category>/[<subdirectory>/]<filename>`
    pub fn relative_path(&self, filename: &str) -> PathBuf {
        let mut path = PathBuf::from(&self.category);
        if let Some(sub) = &self.subdirectory {
            path.push(sub);
        }
        path.push(filename);
        path
    }
}

/// Ordered category taxonomy plus the subcategory attributes used for nesting.
///
/// Declaration order is the tie-break everywhere: the first category with any
/// matching keyword wins, and the first subcategory attribute present in the
/// metadata picks the nested directory.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<CategoryRule>,
    subcategories: Vec<String>,
}

impl Taxonomy {
    pub fn new(categories: Vec<CategoryRule>, subcategories: Vec<String>) -> Self {
        let categories = categories
            .into_iter()
            .map(|rule| CategoryRule {
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
                name: rule.name,
            })
            .collect();
        Self { categories, subcategories }
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// First category with a keyword contained in the lowercased filename.
    pub fn category_for(&self, filename: &str) -> Option<&str> {
        let lowered = filename.to_lowercase();
        self.categories
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw.as_str())))
            .map(|rule| rule.name.as_str())
    }

    /// `{subcat}_{value}` for the first subcategory present in `metadata`.
    pub fn subdirectory_for(&self, metadata: &FigureMetadata) -> Option<String> {
        self.subcategories.iter().find_map(|subcat| {
            metadata.attribute(subcat).map(|value| format!("{subcat}_{value}"))
        })
    }

    pub fn destination(&self, metadata: &FigureMetadata) -> Destination {
        match self.category_for(&metadata.filename) {
            Some(category) => Destination {
                category: category.to_string(),
                subdirectory: self.subdirectory_for(metadata),
            },
            None => Destination { category: MISC_CATEGORY.to_string(), subdirectory: None },
        }
    }
}
