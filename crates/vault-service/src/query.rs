//! Search and ordering for the visible listing.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use vault_core::error::AppError;
use vault_entity::folder::Folder;
use vault_entity::item::Item;

/// Listing order for items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemSort {
    /// Newest first.
    #[default]
    DateDesc,
    /// Oldest first.
    DateAsc,
    /// Name A-Z, ignoring case.
    NameAsc,
    /// Name Z-A, ignoring case.
    NameDesc,
    /// Largest first.
    SizeDesc,
    /// Smallest first.
    SizeAsc,
}

impl ItemSort {
    /// Every order, in menu order.
    pub const ALL: [Self; 6] = [
        Self::DateDesc,
        Self::DateAsc,
        Self::NameAsc,
        Self::NameDesc,
        Self::SizeDesc,
        Self::SizeAsc,
    ];

    /// Compare two items under this order.
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        match self {
            Self::DateDesc => b.date_added.cmp(&a.date_added),
            Self::DateAsc => a.date_added.cmp(&b.date_added),
            Self::NameAsc => compare_names(&a.name, &b.name),
            Self::NameDesc => compare_names(&b.name, &a.name),
            Self::SizeDesc => b.size.cmp(&a.size),
            Self::SizeAsc => a.size.cmp(&b.size),
        }
    }

    /// Stable wire name, e.g. `"name-asc"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateDesc => "date-desc",
            Self::DateAsc => "date-asc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::SizeDesc => "size-desc",
            Self::SizeAsc => "size-asc",
        }
    }
}

impl fmt::Display for ItemSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown sort order '{s}'")))
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// A search term and an order applied to the visible listing.
///
/// The search is a case-insensitive substring match against item names and
/// tags, or folder names. A blank search matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Free-text search.
    pub search: String,
    /// Item order.
    pub sort: ItemSort,
}

impl ItemQuery {
    /// Query with a search term and the default order.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            sort: ItemSort::default(),
        }
    }

    /// Set the order.
    pub fn sorted(mut self, sort: ItemSort) -> Self {
        self.sort = sort;
        self
    }

    fn needle(&self) -> Option<String> {
        let term = self.search.trim();
        (!term.is_empty()).then(|| term.to_lowercase())
    }

    /// Whether an item's name or one of its tags contains the search term.
    pub fn matches_item(&self, item: &Item) -> bool {
        let Some(needle) = self.needle() else {
            return true;
        };
        item.name.to_lowercase().contains(&needle)
            || item.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Whether a folder's name contains the search term.
    pub fn matches_folder(&self, folder: &Folder) -> bool {
        self.needle()
            .is_none_or(|needle| folder.name.to_lowercase().contains(&needle))
    }

    /// Filter and order items. Ties keep their incoming order.
    pub fn apply<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a Item> {
        let mut matched: Vec<&Item> = items
            .into_iter()
            .filter(|item| self.matches_item(item))
            .collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));
        matched
    }

    /// Filter folders and order them by name.
    pub fn apply_folders<'a>(
        &self,
        folders: impl IntoIterator<Item = &'a Folder>,
    ) -> Vec<&'a Folder> {
        let mut matched: Vec<&Folder> = folders
            .into_iter()
            .filter(|folder| self.matches_folder(folder))
            .collect();
        matched.sort_by(|a, b| compare_names(&a.name, &b.name));
        matched
    }
}
