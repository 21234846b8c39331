use std::collections::HashSet;
use tracing::{error, info};

use crate::{
    document::{
        sort_documents, ContentStore, Document, DocumentQuery, Limit, OrderBy, OrderDirection,
        OrderTransaction, QueryOptions,
    },
    error::ShelfError,
    folder::FolderProvider,
    ids::{join_id_list, DocumentId, FolderId},
};

/// Reads and rewrites the `menu_order` of documents.
///
/// Order values are folder scoped: only [OrderManager::update_folder_order] is meant to be
/// reachable from the outside, views combining several folders only ever read them.
pub struct OrderManager<'a, P, S> {
    query: DocumentQuery<'a, P, S>,
}

impl<'a, P, S> OrderManager<'a, P, S>
where
    P: FolderProvider,
    S: ContentStore,
{
    pub fn new(folders: &'a P, store: &'a S) -> Self {
        Self {
            query: DocumentQuery::new(folders, store),
        }
    }

    /// Documents of `folder_id` by ascending order.
    /// Reloading this is also how an unsaved rearrangement gets reset.
    pub async fn get_ordered_documents(
        &self,
        folder_id: FolderId,
    ) -> Result<Vec<Document>, ShelfError> {
        self.query.get_documents(folder_id, &ordered()).await
    }

    /// Documents of several folders merged by their order values, for display only.
    /// Values from different folders may collide, in which case folder order decides.
    pub async fn get_ordered_documents_across(
        &self,
        folder_ids: &[FolderId],
    ) -> Result<Vec<Document>, ShelfError> {
        let options = ordered();
        let mut documents = vec![];
        for folder_id in folder_ids {
            documents.extend(self.query.get_documents(*folder_id, &options).await?);
        }
        sort_documents(&mut documents, OrderBy::Order, OrderDirection::Asc);
        Ok(documents)
    }

    /// Assign `1..=N` to `document_ids` in the given order, all or nothing.
    ///
    /// Documents not listed keep their current order value.
    pub async fn update_order(&self, document_ids: &[DocumentId]) -> Result<(), ShelfError> {
        validate_permutation(document_ids)?;

        let mut tx = self
            .query
            .store()
            .begin()
            .await
            .map_err(|e| ShelfError::Persistence(format!("could not start transaction: {e}")))?;

        for (i, id) in document_ids.iter().enumerate() {
            let order = i32::try_from(i + 1).map_err(|_| {
                ShelfError::InvalidInput(format!("too many documents to order ({})", i + 1))
            })?;

            let reason = match tx.set_menu_order(*id, order).await {
                Ok(true) => continue,
                Ok(false) => format!("document {id} could not be updated"),
                Err(e) => format!("document {id}: {e}"),
            };

            error!("Order update failed, rolling back: {reason}");
            if let Err(e) = tx.rollback().await {
                error!("Rollback failed: {e}");
            }
            return Err(ShelfError::Persistence(reason));
        }

        tx.commit()
            .await
            .map_err(|e| ShelfError::Persistence(format!("commit failed: {e}")))?;

        info!("Reordered {} documents", document_ids.len());

        Ok(())
    }

    /// [Self::update_order] restricted to documents of one folder.
    pub async fn update_folder_order(
        &self,
        folder_id: FolderId,
        document_ids: &[DocumentId],
    ) -> Result<(), ShelfError> {
        validate_permutation(document_ids)?;

        if self.query.folders().get_folder_by_id(folder_id).await?.is_none() {
            return Err(ShelfError::InvalidInput(format!(
                "folder {folder_id} does not exist"
            )));
        }

        let current: HashSet<DocumentId> = self
            .get_ordered_documents(folder_id)
            .await?
            .into_iter()
            .map(|document| document.id)
            .collect();

        if let Some(stray) = document_ids.iter().find(|id| !current.contains(id)) {
            return Err(ShelfError::InvalidInput(format!(
                "document {stray} is not in folder {folder_id}"
            )));
        }

        self.update_order(document_ids).await?;

        info!("Folder {folder_id} order is now {}", join_id_list(document_ids));

        Ok(())
    }
}

fn ordered() -> QueryOptions {
    QueryOptions {
        order_by: OrderBy::Order,
        order: OrderDirection::Asc,
        limit: Limit::Unlimited,
        ..Default::default()
    }
}

fn validate_permutation(document_ids: &[DocumentId]) -> Result<(), ShelfError> {
    if document_ids.is_empty() {
        return Err(ShelfError::InvalidInput("no documents to order".to_string()));
    }

    let mut seen = HashSet::with_capacity(document_ids.len());
    for id in document_ids {
        if *id <= 0 {
            return Err(ShelfError::InvalidInput(format!("invalid document id {id}")));
        }
        if !seen.insert(*id) {
            return Err(ShelfError::InvalidInput(format!("document {id} listed twice")));
        }
    }

    Ok(())
}
