use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::{error::ShelfError, ids::FolderId};

pub mod db;
pub mod tree;

pub use tree::{build_tree, collect_descendant_ids, find_node, folder_path, PATH_SEPARATOR};

/// Raw folder row as handed over by the provider.
/// Any of the columns may be missing, [Folder::from_record] decides what is usable.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct FolderRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub parent: Option<i64>,
    pub attachment_count: Option<i64>,
}

#[cfg(test)]
impl FolderRecord {
    pub fn new(id: FolderId, name: &str, parent: FolderId) -> Self {
        Self {
            id: Some(id),
            name: Some(name.to_string()),
            parent: Some(parent),
            attachment_count: None,
        }
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.attachment_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// `0` for top level folders
    pub parent: FolderId,
}

impl Folder {
    pub fn from_record(record: &FolderRecord) -> Option<Self> {
        let FolderRecord {
            id, name, parent, ..
        } = record;

        let id = (*id)?;
        let parent = (*parent)?;

        if id <= 0 || parent < 0 {
            return None;
        }

        Some(Self {
            id,
            name: name.clone()?,
            parent,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: Folder,

    /// Attachments filed directly in this folder
    pub attachment_count: i64,

    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn id(&self) -> FolderId {
        self.folder.id
    }

    /// Ids of this node and its whole subtree, parents before children.
    pub fn preorder_ids(&self) -> Vec<FolderId> {
        let mut ids = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(node.id());
            stack.extend(node.children.iter().rev());
        }
        ids
    }
}

impl Drop for FolderNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Levels in the forest, `0` when empty.
pub fn tree_depth(tree: &[FolderNode]) -> usize {
    let mut deepest = 0;
    let mut stack: Vec<(&FolderNode, usize)> = tree.iter().map(|node| (node, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(node.children.iter().map(|child| (child, depth + 1)));
    }
    deepest
}

/// The external folder taxonomy.
pub trait FolderProvider: Send + Sync {
    /// When this is false every folder read degrades to an empty result.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    fn list_all_folders(
        &self,
    ) -> impl Future<Output = Result<Vec<FolderRecord>, ShelfError>> + Send;

    fn folder_exists(
        &self,
        id: FolderId,
    ) -> impl Future<Output = Result<bool, ShelfError>> + Send;

    fn get_folder_by_id(
        &self,
        id: FolderId,
    ) -> impl Future<Output = Result<Option<Folder>, ShelfError>> + Send;
}

/// Load the whole folder forest, or nothing if the provider is gone.
pub async fn load_tree(provider: &impl FolderProvider) -> Result<Vec<FolderNode>, ShelfError> {
    if !provider.is_available().await {
        tracing::warn!("Folder provider unavailable, using an empty folder tree");
        return Ok(vec![]);
    }
    let records = provider.list_all_folders().await?;
    Ok(build_tree(&records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_without_required_fields_is_rejected() {
        let missing_name = FolderRecord {
            id: Some(1),
            parent: Some(0),
            ..Default::default()
        };
        let missing_parent = FolderRecord {
            id: Some(1),
            name: Some("A".to_string()),
            ..Default::default()
        };

        assert!(Folder::from_record(&missing_name).is_none());
        assert!(Folder::from_record(&missing_parent).is_none());
        assert!(Folder::from_record(&FolderRecord::new(0, "Root", 0)).is_none());
        assert!(Folder::from_record(&FolderRecord::new(-4, "Neg", 0)).is_none());
        assert_eq!(
            Some(Folder {
                id: 3,
                name: "C".to_string(),
                parent: 1
            }),
            Folder::from_record(&FolderRecord::new(3, "C", 1))
        );
    }

    #[test]
    fn preorder_lists_parents_first() {
        let tree = build_tree(&[
            FolderRecord::new(1, "A", 0),
            FolderRecord::new(2, "B", 1),
            FolderRecord::new(4, "D", 2),
            FolderRecord::new(3, "C", 1),
        ]);

        assert_eq!(vec![1, 2, 4, 3], tree[0].preorder_ids());
    }
}
