//! In-memory folder provider and content store used by the test suite.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use crate::{
    document::{
        AttachmentRecord, ContentStore, Limit, OrderBy, OrderDirection, OrderTransaction,
    },
    error::ShelfError,
    folder::{Folder, FolderProvider, FolderRecord},
    ids::{DocumentId, FolderId},
};

#[derive(Debug, Clone)]
pub struct MemoryFolders {
    available: bool,
    records: Vec<FolderRecord>,
}

impl MemoryFolders {
    pub fn new(records: Vec<FolderRecord>) -> Self {
        Self {
            available: true,
            records,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            records: vec![],
        }
    }
}

impl FolderProvider for MemoryFolders {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn list_all_folders(&self) -> Result<Vec<FolderRecord>, ShelfError> {
        Ok(self.records.clone())
    }

    async fn folder_exists(&self, id: FolderId) -> Result<bool, ShelfError> {
        Ok(self.records.iter().any(|r| r.id == Some(id)))
    }

    async fn get_folder_by_id(&self, id: FolderId) -> Result<Option<Folder>, ShelfError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.id == Some(id))
            .and_then(Folder::from_record))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryContent {
    attachments: Arc<Mutex<Vec<AttachmentRecord>>>,
    /// 1-based index of the write that fails inside a transaction
    fail_on_write: Option<usize>,
    fail_on_begin: bool,
}

impl MemoryContent {
    pub fn new(attachments: Vec<AttachmentRecord>) -> Self {
        Self {
            attachments: Arc::new(Mutex::new(attachments)),
            fail_on_write: None,
            fail_on_begin: false,
        }
    }

    pub fn failing_on_write(mut self, write: usize) -> Self {
        self.fail_on_write = Some(write);
        self
    }

    pub fn failing_on_begin(mut self) -> Self {
        self.fail_on_begin = true;
        self
    }

    pub fn add(&self, attachment: AttachmentRecord) {
        self.attachments.lock().unwrap().push(attachment);
    }

    pub fn order_of(&self, id: DocumentId) -> Option<i32> {
        self.attachments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.menu_order)
    }
}

impl ContentStore for MemoryContent {
    type Transaction = MemoryTransaction;

    async fn query_attachments(
        &self,
        folder_ids: &[FolderId],
        order_by: OrderBy,
        order: OrderDirection,
        limit: Limit,
    ) -> Result<Vec<AttachmentRecord>, ShelfError> {
        let mut found: Vec<AttachmentRecord> = self
            .attachments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| folder_ids.contains(&a.folder_id))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            let ordering = match order_by {
                OrderBy::Date => a.created_at.cmp(&b.created_at),
                OrderBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                OrderBy::Order => a.menu_order.cmp(&b.menu_order),
                OrderBy::Id => a.id.cmp(&b.id),
            };
            match order {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });

        limit.apply(&mut found);
        Ok(found)
    }

    async fn begin(&self) -> Result<MemoryTransaction, ShelfError> {
        if self.fail_on_begin {
            return Err(ShelfError::IO(std::io::Error::other("store offline")));
        }
        Ok(MemoryTransaction {
            attachments: self.attachments.clone(),
            fail_on_write: self.fail_on_write,
            writes: 0,
            staged: vec![],
        })
    }
}

/// Writes are staged and only land on commit.
#[derive(Debug)]
pub struct MemoryTransaction {
    attachments: Arc<Mutex<Vec<AttachmentRecord>>>,
    fail_on_write: Option<usize>,
    writes: usize,
    staged: Vec<(DocumentId, i32)>,
}

impl OrderTransaction for MemoryTransaction {
    async fn set_menu_order(&mut self, id: DocumentId, order: i32) -> Result<bool, ShelfError> {
        self.writes += 1;

        if self.fail_on_write == Some(self.writes) {
            return Err(ShelfError::Persistence(format!("injected failure at {id}")));
        }

        let exists = self.attachments.lock().unwrap().iter().any(|a| a.id == id);
        if exists {
            self.staged.push((id, order));
        }
        Ok(exists)
    }

    async fn commit(self) -> Result<(), ShelfError> {
        let mut attachments = self.attachments.lock().unwrap();
        for (id, order) in self.staged {
            if let Some(attachment) = attachments.iter_mut().find(|a| a.id == id) {
                attachment.menu_order = order;
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), ShelfError> {
        Ok(())
    }
}

pub fn attachment(id: DocumentId, folder_id: FolderId, title: &str, order: i32) -> AttachmentRecord {
    AttachmentRecord {
        id,
        folder_id,
        title: title.to_string(),
        file_path: format!("uploads/{}.pdf", title.replace(' ', "-")),
        mime_type: Some("application/pdf".to_string()),
        file_size: Some(1024),
        menu_order: order,
        url: format!("https://files.test/{id}.pdf"),
        thumbnail_url: None,
        created_at: uploaded(id),
    }
}

pub fn uploaded(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

/// Folders A(1) > {B(2), C(3)} with doc 10 in B and doc 20 in C.
pub fn scenario() -> (MemoryFolders, MemoryContent) {
    let folders = MemoryFolders::new(vec![
        FolderRecord::new(1, "A", 0),
        FolderRecord::new(2, "B", 1).with_count(1),
        FolderRecord::new(3, "C", 1).with_count(1),
    ]);
    let store = MemoryContent::new(vec![attachment(10, 2, "doc10", 0), attachment(20, 3, "doc20", 0)]);
    (folders, store)
}
