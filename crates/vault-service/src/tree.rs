//! In-memory folder tree: a flat arena of folders plus derived indexes.
//!
//! Folders are stored once, in a `Vec`, and every relation is expressed
//! through ids. Two indexes are rebuilt whenever the backing collection is
//! replaced: id → slot and parent → child slots. Queries never panic on
//! unknown ids; they return `None`, `false`, zero, or an empty list.

use std::collections::{HashMap, HashSet};

use vault_core::error::AppError;
use vault_core::result::AppResult;
use vault_core::types::FolderId;
use vault_entity::folder::{Folder, FolderNode};

/// Arena-backed folder hierarchy.
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    /// Backing collection, in store order.
    folders: Vec<Folder>,
    /// Folder id → slot in `folders`.
    by_id: HashMap<FolderId, usize>,
    /// Parent id (None for root level) → child slots, sorted by name.
    children: HashMap<Option<FolderId>, Vec<usize>>,
}

impl FolderTree {
    /// Build a tree from a flat folder list.
    pub fn new(folders: Vec<Folder>) -> Self {
        let mut tree = Self::default();
        tree.replace(folders);
        tree
    }

    /// Swap the backing collection and rebuild both indexes.
    pub fn replace(&mut self, folders: Vec<Folder>) {
        self.folders = folders;
        self.by_id = self
            .folders
            .iter()
            .enumerate()
            .map(|(slot, f)| (f.id.clone(), slot))
            .collect();

        let mut children: HashMap<Option<FolderId>, Vec<usize>> = HashMap::new();
        for (slot, folder) in self.folders.iter().enumerate() {
            children
                .entry(folder.parent_id.clone())
                .or_default()
                .push(slot);
        }
        for slots in children.values_mut() {
            slots.sort_by(|a, b| compare_names(&self.folders[*a], &self.folders[*b]));
        }
        self.children = children;
    }

    /// All folders, in store order.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Number of folders.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Whether the tree holds no folders.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Look up a folder by id.
    pub fn get(&self, id: &FolderId) -> Option<&Folder> {
        self.by_id.get(id).map(|slot| &self.folders[*slot])
    }

    /// Whether a folder with this id exists.
    pub fn contains(&self, id: &FolderId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Direct children of `folder` (root level for `None`), sorted by name
    /// case-insensitively.
    pub fn children_of(&self, folder: Option<&FolderId>) -> Vec<&Folder> {
        self.children
            .get(&folder.cloned())
            .map(|slots| slots.iter().map(|slot| &self.folders[*slot]).collect())
            .unwrap_or_default()
    }

    /// Number of direct child folders.
    pub fn count_direct_children(&self, id: &FolderId) -> usize {
        self.children
            .get(&Some(id.clone()))
            .map_or(0, |slots| slots.len())
    }

    /// Ancestors of `id` from the root down to (and including) `id` itself.
    ///
    /// Returns an empty list for unknown ids. The walk is bounded by the
    /// folder count, so a corrupted (cyclic) parent graph cannot hang it.
    pub fn path_to_root(&self, id: &FolderId) -> Vec<&Folder> {
        let mut path = Vec::new();
        let mut current = self.get(id);
        while let Some(folder) = current {
            if path.len() >= self.folders.len() {
                break;
            }
            path.push(folder);
            current = folder.parent_id.as_ref().and_then(|p| self.get(p));
        }
        path.reverse();
        path
    }

    /// Ancestors that must be expanded to reveal `id`, root first,
    /// excluding the folder itself.
    pub fn expansion_path(&self, id: &FolderId) -> Vec<FolderId> {
        let mut path: Vec<FolderId> = self
            .path_to_root(id)
            .into_iter()
            .map(|f| f.id.clone())
            .collect();
        path.pop();
        path
    }

    /// Whether `candidate` lies strictly below `ancestor`.
    pub fn is_descendant(&self, candidate: &FolderId, ancestor: &FolderId) -> bool {
        if candidate == ancestor {
            return false;
        }
        self.path_to_root(candidate)
            .iter()
            .any(|folder| &folder.id == ancestor)
    }

    /// Number of folders anywhere below `id`.
    pub fn descendant_count(&self, id: &FolderId) -> usize {
        let mut count = 0;
        let mut seen = HashSet::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            for child in self.children_of(Some(&current)) {
                if seen.insert(child.id.clone()) {
                    count += 1;
                    stack.push(child.id.clone());
                }
            }
        }
        count
    }

    /// Check that every parent reference resolves and the parent graph is
    /// acyclic.
    pub fn validate(&self) -> AppResult<()> {
        for folder in &self.folders {
            if let Some(parent) = &folder.parent_id {
                if !self.contains(parent) {
                    return Err(AppError::validation(format!(
                        "Folder '{}' references unknown parent '{parent}'",
                        folder.id
                    )));
                }
            }

            let mut steps = 0;
            let mut current = folder.parent_id.as_ref();
            while let Some(parent) = current {
                steps += 1;
                if steps > self.folders.len() {
                    return Err(AppError::validation(format!(
                        "Folder '{}' is part of a parent cycle",
                        folder.id
                    )));
                }
                current = self.get(parent).and_then(|f| f.parent_id.as_ref());
            }
        }
        Ok(())
    }

    /// Build the nested view used for tree rendering.
    ///
    /// `item_counts` maps folder ids to the number of items they directly
    /// contain; missing entries count as zero.
    pub fn build_nodes(&self, item_counts: &HashMap<FolderId, usize>) -> Vec<FolderNode> {
        let mut visited = HashSet::new();
        self.children_of(None)
            .into_iter()
            .filter_map(|root| self.build_node(root, 0, item_counts, &mut visited))
            .collect()
    }

    fn build_node(
        &self,
        folder: &Folder,
        depth: usize,
        item_counts: &HashMap<FolderId, usize>,
        visited: &mut HashSet<FolderId>,
    ) -> Option<FolderNode> {
        if !visited.insert(folder.id.clone()) {
            return None;
        }
        let children: Vec<FolderNode> = self
            .children_of(Some(&folder.id))
            .into_iter()
            .filter_map(|child| self.build_node(child, depth + 1, item_counts, visited))
            .collect();

        Some(FolderNode {
            id: folder.id.clone(),
            name: folder.name.clone(),
            depth,
            child_count: children.len(),
            item_count: item_counts.get(&folder.id).copied().unwrap_or(0),
            children,
        })
    }
}

fn compare_names(a: &Folder, b: &Folder) -> std::cmp::Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}
