use std::future::Future;
use tracing::debug;

use crate::{
    error::ShelfError,
    folder::FolderProvider,
    ids::{DocumentId, FolderId},
};

pub mod db;
pub mod models;

pub use models::{
    sort_documents, AttachmentRecord, Document, Limit, OrderBy, OrderDirection, QueryOptions,
};

/// Where attachments and their `menu_order` live.
pub trait ContentStore: Send + Sync {
    type Transaction: OrderTransaction;

    /// Attachments filed in any of `folder_ids`, sorted and capped by the store.
    fn query_attachments(
        &self,
        folder_ids: &[FolderId],
        order_by: OrderBy,
        order: OrderDirection,
        limit: Limit,
    ) -> impl Future<Output = Result<Vec<AttachmentRecord>, ShelfError>> + Send;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, ShelfError>> + Send;
}

/// A unit of order writes. Dropping it without [OrderTransaction::commit] discards the writes.
pub trait OrderTransaction: Send {
    /// Returns `false` when no document with `id` was updated.
    fn set_menu_order(
        &mut self,
        id: DocumentId,
        order: i32,
    ) -> impl Future<Output = Result<bool, ShelfError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), ShelfError>> + Send;

    fn rollback(self) -> impl Future<Output = Result<(), ShelfError>> + Send;
}

/// Read only access to the documents of single folders.
pub struct DocumentQuery<'a, P, S> {
    folders: &'a P,
    store: &'a S,
}

impl<'a, P, S> DocumentQuery<'a, P, S>
where
    P: FolderProvider,
    S: ContentStore,
{
    pub fn new(folders: &'a P, store: &'a S) -> Self {
        Self { folders, store }
    }

    pub fn folders(&self) -> &'a P {
        self.folders
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Documents filed directly in `folder_id`.
    ///
    /// Unknown or excluded folders and a missing provider all yield an empty list.
    pub async fn get_documents(
        &self,
        folder_id: FolderId,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, ShelfError> {
        if options.limit.is_zero() || options.exclude_folder_ids.contains(&folder_id) {
            return Ok(vec![]);
        }

        if !self.folders.is_available().await {
            debug!("Folder provider unavailable, no documents for {folder_id}");
            return Ok(vec![]);
        }

        if !self.folders.folder_exists(folder_id).await? {
            debug!("Folder {folder_id} does not exist");
            return Ok(vec![]);
        }

        self.fetch_folder(folder_id, options.order_by, options.order, options.limit)
            .await
    }

    /// Same as [Self::get_documents] without the existence checks, for folders already
    /// resolved from the tree.
    pub(crate) async fn fetch_folder(
        &self,
        folder_id: FolderId,
        order_by: OrderBy,
        order: OrderDirection,
        limit: Limit,
    ) -> Result<Vec<Document>, ShelfError> {
        if limit.is_zero() {
            return Ok(vec![]);
        }

        let records = self
            .store
            .query_attachments(&[folder_id], order_by, order, limit)
            .await?;

        debug!("Fetched {} documents from folder {folder_id}", records.len());

        Ok(records.into_iter().map(Document::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{self, MemoryFolders};

    #[tokio::test]
    async fn lists_documents_of_one_folder() {
        let (folders, store) = memory::scenario();
        let query = DocumentQuery::new(&folders, &store);

        let docs = query.get_documents(2, &QueryOptions::default()).await.unwrap();

        assert_eq!(vec![10], docs.iter().map(|d| d.id).collect::<Vec<_>>());
        assert_eq!(2, docs[0].source_folder_id);
    }

    #[tokio::test]
    async fn missing_folder_is_empty() {
        let (folders, store) = memory::scenario();
        let query = DocumentQuery::new(&folders, &store);

        assert!(query
            .get_documents(404, &QueryOptions::default())
            .await
            .unwrap()
            .is_empty());

        // Exists, but has nothing of its own
        assert!(query
            .get_documents(1, &QueryOptions::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unavailable_provider_is_empty() {
        let (_, store) = memory::scenario();
        let folders = MemoryFolders::unavailable();
        let query = DocumentQuery::new(&folders, &store);

        assert!(query
            .get_documents(2, &QueryOptions::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn limit_and_exclusion() {
        let (folders, store) = memory::scenario();
        store.add(memory::attachment(11, 2, "Second in B", 0));
        store.add(memory::attachment(12, 2, "Third in B", 0));
        let query = DocumentQuery::new(&folders, &store);

        let zero = QueryOptions {
            limit: Limit::Max(0),
            ..Default::default()
        };
        assert!(query.get_documents(2, &zero).await.unwrap().is_empty());

        let two = QueryOptions {
            limit: Limit::Max(2),
            ..Default::default()
        };
        assert_eq!(2, query.get_documents(2, &two).await.unwrap().len());

        let unlimited = QueryOptions {
            limit: Limit::from(-5),
            ..Default::default()
        };
        assert_eq!(3, query.get_documents(2, &unlimited).await.unwrap().len());

        let excluded = QueryOptions {
            exclude_folder_ids: [2].into(),
            ..Default::default()
        };
        assert!(query.get_documents(2, &excluded).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn honours_order_options() {
        let (folders, store) = memory::scenario();
        store.add(memory::attachment(11, 2, "alpha", 0));
        store.add(memory::attachment(12, 2, "Zulu", 0));
        let query = DocumentQuery::new(&folders, &store);

        let options = QueryOptions {
            order_by: OrderBy::Title,
            order: OrderDirection::Desc,
            ..Default::default()
        };
        let docs = query.get_documents(2, &options).await.unwrap();

        assert_eq!(
            vec!["Zulu", "doc10", "alpha"],
            docs.iter().map(|d| d.title.as_str()).collect::<Vec<_>>()
        );
    }
}
