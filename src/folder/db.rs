use super::{Folder, FolderProvider, FolderRecord};
use crate::{error::ShelfError, ids::FolderId};
use sqlx::PgPool;
use tracing::warn;

/// Folder taxonomy stored in the `folders` table.
#[derive(Debug, Clone)]
pub struct FolderDb {
    pool: sqlx::PgPool,
}

impl FolderDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl FolderProvider for FolderDb {
    async fn is_available(&self) -> bool {
        let result =
            sqlx::query_scalar::<_, bool>("SELECT to_regclass('folders') IS NOT NULL")
                .fetch_one(&self.pool)
                .await;

        match result {
            Ok(available) => available,
            Err(e) => {
                warn!("Unable to check folder table: {e}");
                false
            }
        }
    }

    async fn list_all_folders(&self) -> Result<Vec<FolderRecord>, ShelfError> {
        sqlx::query_as::<_, FolderRecord>(
            r#"
                SELECT f.id, f.name, f.parent,
                    (SELECT COUNT(*) FROM attachment_folders af WHERE af.folder_id = f.id) AS attachment_count
                FROM folders f
                ORDER BY f.ord ASC, f.name ASC, f.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ShelfError::from)
    }

    async fn folder_exists(&self, id: FolderId) -> Result<bool, ShelfError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM folders WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(ShelfError::from)
    }

    async fn get_folder_by_id(&self, id: FolderId) -> Result<Option<Folder>, ShelfError> {
        let record = sqlx::query_as::<_, FolderRecord>(
            "SELECT id, name, parent, NULL::BIGINT AS attachment_count FROM folders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.as_ref().and_then(Folder::from_record))
    }
}
