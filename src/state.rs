use sqlx::PgPool;

use crate::{
    aggregate::{AggregateOptions, Aggregator},
    document::db::ContentDb,
    folder::db::FolderDb,
    library::db::LibraryDb,
    ordering::OrderManager,
};

/// Everything the handlers need, cloned into each request.
#[derive(Debug, Clone)]
pub struct Shelf {
    pub title: Option<String>,

    pub folders: FolderDb,

    pub content: ContentDb,

    pub libraries: LibraryDb,

    pub defaults: AggregateOptions,
}

impl Shelf {
    pub fn new(pool: PgPool, title: Option<String>, defaults: AggregateOptions) -> Self {
        Self {
            title,
            folders: FolderDb::new(pool.clone()),
            content: ContentDb::new(pool.clone()),
            libraries: LibraryDb::new(pool),
            defaults,
        }
    }

    pub fn aggregator(&self) -> Aggregator<'_, FolderDb, ContentDb> {
        Aggregator::new(&self.folders, &self.content)
    }

    pub fn order_manager(&self) -> OrderManager<'_, FolderDb, ContentDb> {
        OrderManager::new(&self.folders, &self.content)
    }
}
