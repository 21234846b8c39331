use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::{Folder, FolderNode, FolderRecord};
use crate::ids::FolderId;

pub const PATH_SEPARATOR: &str = " / ";

/// Turn the flat provider listing into a forest.
///
/// Children keep the order of `records`. Unusable records are skipped, folders whose parent
/// is unknown become roots, and folders caught in a parent cycle are promoted to roots.
pub fn build_tree(records: &[FolderRecord]) -> Vec<FolderNode> {
    let mut folders: Vec<(Folder, i64)> = Vec::with_capacity(records.len());
    let mut index: HashMap<FolderId, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let Some(folder) = Folder::from_record(record) else {
            debug!("Skipping incomplete folder record {record:?}");
            continue;
        };

        if index.contains_key(&folder.id) {
            debug!("Skipping duplicate folder {}", folder.id);
            continue;
        }

        index.insert(folder.id, folders.len());
        folders.push((folder, record.attachment_count.unwrap_or(0).max(0)));
    }

    let mut children: Vec<Vec<usize>> = vec![vec![]; folders.len()];
    let mut roots = vec![];

    for (i, (folder, _)) in folders.iter().enumerate() {
        match index.get(&folder.parent) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let mut slots: Vec<Option<(Folder, i64)>> = folders.into_iter().map(Some).collect();

    let mut tree: Vec<FolderNode> = roots
        .into_iter()
        .filter_map(|i| assemble(i, &mut slots, &children))
        .collect();

    // Whatever is left is only reachable through a parent cycle
    for i in 0..slots.len() {
        if let Some((folder, _)) = &slots[i] {
            warn!(
                "Folder {} ({}) sits on a parent cycle, promoting it to a root",
                folder.id, folder.name
            );
            if let Some(node) = assemble(i, &mut slots, &children) {
                tree.push(node);
            }
        }
    }

    tree
}

/// Take the subtree under `root` out of `slots`, children before their parents.
fn assemble(
    root: usize,
    slots: &mut [Option<(Folder, i64)>],
    children: &[Vec<usize>],
) -> Option<FolderNode> {
    let mut visited = vec![];
    let mut stack = vec![root];

    while let Some(i) = stack.pop() {
        let Some(entry) = slots[i].take() else {
            continue;
        };
        visited.push((i, entry));
        stack.extend(children[i].iter().copied());
    }

    let mut built: HashMap<usize, FolderNode> = HashMap::with_capacity(visited.len());

    for (i, (folder, attachment_count)) in visited.into_iter().rev() {
        let nested = children[i]
            .iter()
            .filter_map(|child| built.remove(child))
            .collect();

        built.insert(
            i,
            FolderNode {
                folder,
                attachment_count,
                children: nested,
            },
        );
    }

    built.remove(&root)
}

/// Depth first search for `id`.
pub fn find_node(tree: &[FolderNode], id: FolderId) -> Option<&FolderNode> {
    let mut stack: Vec<&FolderNode> = tree.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if node.id() == id {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }

    None
}

/// All ids below `node`, excluding `node` itself.
pub fn collect_descendant_ids(node: &FolderNode) -> HashSet<FolderId> {
    let mut ids = HashSet::new();
    let mut stack: Vec<&FolderNode> = node.children.iter().collect();

    while let Some(current) = stack.pop() {
        ids.insert(current.id());
        stack.extend(current.children.iter());
    }

    ids
}

/// Names from the root down to `id`, joined by [PATH_SEPARATOR].
/// Empty when the folder is not in the tree.
pub fn folder_path(tree: &[FolderNode], id: FolderId) -> String {
    let mut segments: Vec<&str> = vec![];
    let mut stack: Vec<(&FolderNode, usize)> = tree.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        segments.truncate(depth);
        segments.push(&node.folder.name);

        if node.id() == id {
            return segments.join(PATH_SEPARATOR);
        }

        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    String::new()
}
