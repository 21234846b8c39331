use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::{
    document::{sort_documents, ContentStore, Document, DocumentQuery, Limit, QueryOptions},
    error::ShelfError,
    folder::{
        collect_descendant_ids, find_node, folder_path, load_tree, FolderNode, FolderProvider,
        PATH_SEPARATOR,
    },
    ids::FolderId,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    #[serde(flatten)]
    pub query: QueryOptions,

    pub include_subfolders: bool,

    /// Mirror the folder tree instead of returning one flat list
    pub group_by_folder: bool,
}

/// One folder of a grouped result. Only present if it or a descendant holds documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderGroup {
    pub folder_id: FolderId,
    pub folder_name: String,
    pub folder_path: String,
    pub documents: Vec<Document>,
    pub children: Vec<FolderGroup>,
}

impl FolderGroup {
    pub fn document_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(group) = stack.pop() {
            count += group.documents.len();
            stack.extend(group.children.iter());
        }
        count
    }

    /// Levels in this group, `1` for a group without children.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((group, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(group.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

impl Drop for FolderGroup {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut group) = stack.pop() {
            stack.append(&mut group.children);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "items", rename_all = "lowercase")]
pub enum Aggregated {
    Flat(Vec<Document>),
    Grouped(Vec<FolderGroup>),
}

impl Aggregated {
    fn empty(grouped: bool) -> Self {
        if grouped {
            Aggregated::Grouped(vec![])
        } else {
            Aggregated::Flat(vec![])
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Aggregated::Flat(documents) => documents.is_empty(),
            Aggregated::Grouped(groups) => groups.is_empty(),
        }
    }

    pub fn document_count(&self) -> usize {
        match self {
            Aggregated::Flat(documents) => documents.len(),
            Aggregated::Grouped(groups) => groups.iter().map(FolderGroup::document_count).sum(),
        }
    }

    /// Nesting levels of the result, `0` when empty and `1` for flat results.
    pub fn depth(&self) -> usize {
        match self {
            Aggregated::Flat(documents) => usize::from(!documents.is_empty()),
            Aggregated::Grouped(groups) => groups.iter().map(FolderGroup::depth).max().unwrap_or(0),
        }
    }
}

/// Combines the folder tree with per folder document queries.
pub struct Aggregator<'a, P, S> {
    query: DocumentQuery<'a, P, S>,
}

impl<'a, P, S> Aggregator<'a, P, S>
where
    P: FolderProvider,
    S: ContentStore,
{
    pub fn new(folders: &'a P, store: &'a S) -> Self {
        Self {
            query: DocumentQuery::new(folders, store),
        }
    }

    pub async fn folder_tree(&self) -> Result<Vec<FolderNode>, ShelfError> {
        load_tree(self.query.folders()).await
    }

    pub async fn get_documents_recursive(
        &self,
        root: FolderId,
        options: &AggregateOptions,
    ) -> Result<Aggregated, ShelfError> {
        let tree = self.folder_tree().await?;
        self.documents_recursive_in(&tree, root, options).await
    }

    /// Like [Self::get_documents_recursive] on an already loaded tree.
    pub async fn documents_recursive_in(
        &self,
        tree: &[FolderNode],
        root: FolderId,
        options: &AggregateOptions,
    ) -> Result<Aggregated, ShelfError> {
        let Some(node) = find_node(tree, root) else {
            debug!("Folder {root} not in tree");
            return Ok(Aggregated::empty(options.group_by_folder));
        };

        if options.query.limit.is_zero() {
            return Ok(Aggregated::empty(options.group_by_folder));
        }

        if options.group_by_folder {
            self.grouped(node, folder_path(tree, root), options).await
        } else {
            self.flat(node, options).await
        }
    }

    async fn flat(
        &self,
        node: &FolderNode,
        options: &AggregateOptions,
    ) -> Result<Aggregated, ShelfError> {
        let QueryOptions {
            order_by,
            order,
            limit,
            exclude_folder_ids,
        } = &options.query;

        let mut working = if options.include_subfolders {
            collect_descendant_ids(node)
        } else {
            HashSet::new()
        };
        working.insert(node.id());
        working.retain(|id| !exclude_folder_ids.contains(id));

        // Fetched in tree order so equal sort keys keep a stable order.
        let mut documents = vec![];
        for id in node.preorder_ids().into_iter().filter(|id| working.contains(id)) {
            let found = self
                .query
                .fetch_folder(id, *order_by, *order, Limit::Unlimited)
                .await?;
            documents.extend(found);
        }

        sort_documents(&mut documents, *order_by, *order);
        limit.apply(&mut documents);

        Ok(Aggregated::Flat(documents))
    }

    async fn grouped(
        &self,
        node: &FolderNode,
        path: String,
        options: &AggregateOptions,
    ) -> Result<Aggregated, ShelfError> {
        let QueryOptions {
            order_by,
            order,
            limit,
            exclude_folder_ids,
        } = &options.query;

        if exclude_folder_ids.contains(&node.id()) {
            return Ok(Aggregated::Grouped(vec![]));
        }

        let retained = retained(node, path, exclude_folder_ids, options.include_subfolders);

        let mut documents = Vec::with_capacity(retained.len());
        for entry in retained.iter() {
            let found = self
                .query
                .fetch_folder(entry.node.id(), *order_by, *order, *limit)
                .await?;
            documents.push(found);
        }

        let group = assemble_groups(retained, documents);

        Ok(Aggregated::Grouped(group.into_iter().collect()))
    }
}

/// A folder kept for grouping, listed in tree order.
struct Retained<'t> {
    node: &'t FolderNode,
    path: String,
    /// Positions of the kept children in the retained list
    children: Vec<usize>,
}

/// The subtree under `root` with excluded folders and everything below them pruned.
/// The root comes first, parents always precede their children.
fn retained<'t>(
    root: &'t FolderNode,
    path: String,
    excluded: &BTreeSet<FolderId>,
    recurse: bool,
) -> Vec<Retained<'t>> {
    let mut retained: Vec<Retained<'t>> = vec![];
    let mut stack: Vec<(&FolderNode, String, Option<usize>)> = vec![(root, path, None)];

    while let Some((node, path, parent)) = stack.pop() {
        if excluded.contains(&node.id()) {
            continue;
        }

        let position = retained.len();
        if let Some(parent) = parent {
            retained[parent].children.push(position);
        }

        if recurse {
            for child in node.children.iter().rev() {
                let child_path = format!("{path}{PATH_SEPARATOR}{}", child.folder.name);
                stack.push((child, child_path, Some(position)));
            }
        }

        retained.push(Retained {
            node,
            path,
            children: vec![],
        });
    }

    retained
}

/// Fold the retained folders into groups bottom up, dropping branches without documents.
/// `documents` holds the fetched documents of each retained folder by position.
fn assemble_groups(
    retained: Vec<Retained>,
    documents: Vec<Vec<Document>>,
) -> Option<FolderGroup> {
    let mut groups: Vec<Option<FolderGroup>> = Vec::with_capacity(retained.len());
    groups.resize_with(retained.len(), || None);

    for (position, (entry, own)) in retained.into_iter().zip(documents).enumerate().rev() {
        let children: Vec<FolderGroup> = entry
            .children
            .iter()
            .filter_map(|child| groups[*child].take())
            .collect();

        if own.is_empty() && children.is_empty() {
            continue;
        }

        groups[position] = Some(FolderGroup {
            folder_id: entry.node.id(),
            folder_name: entry.node.folder.name.clone(),
            folder_path: entry.path,
            documents: own,
            children,
        });
    }

    groups.into_iter().next().flatten()
}
