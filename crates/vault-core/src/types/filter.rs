//! The active folder filter (navigation context).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{ALL_FOLDERS, FolderId, IdError};

/// Which folder the library view is currently scoped to.
///
/// `All` is the `"all"` pseudo-folder: no filter, the library root. It is
/// never a storage location and never a parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FolderFilter {
    /// No filter; every item is visible.
    #[default]
    All,
    /// Only items directly inside this folder are visible.
    Folder(FolderId),
}

impl FolderFilter {
    /// Return the concrete folder, if the filter names one.
    pub fn folder(&self) -> Option<&FolderId> {
        match self {
            Self::All => None,
            Self::Folder(id) => Some(id),
        }
    }

    /// Whether this is the unfiltered library root.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<FolderId> for FolderFilter {
    fn from(id: FolderId) -> Self {
        Self::Folder(id)
    }
}

impl FromStr for FolderFilter {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_FOLDERS {
            Ok(Self::All)
        } else {
            FolderId::parse(s).map(Self::Folder)
        }
    }
}

impl TryFrom<String> for FolderFilter {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FolderFilter> for String {
    fn from(filter: FolderFilter) -> String {
        filter.to_string()
    }
}

impl fmt::Display for FolderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_FOLDERS),
            Self::Folder(id) => write!(f, "{id}"),
        }
    }
}
