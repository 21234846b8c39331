use super::{AttachmentRecord, ContentStore, Limit, OrderBy, OrderDirection, OrderTransaction};
use crate::{
    error::ShelfError,
    ids::{DocumentId, FolderId},
};
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone)]
pub struct ContentDb {
    pool: sqlx::PgPool,
}

impl ContentDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(order_by: OrderBy, order: OrderDirection) -> String {
    let column = match order_by {
        OrderBy::Date => "a.created_at",
        // Code point order, the same order `sort_documents` uses
        OrderBy::Title => r#"LOWER(a.title) COLLATE "C""#,
        OrderBy::Order => "a.menu_order",
        OrderBy::Id => "a.id",
    };
    let direction = match order {
        OrderDirection::Asc => "ASC",
        OrderDirection::Desc => "DESC",
    };
    // Ties fall back to insertion order
    format!("{column} {direction}, a.id ASC")
}

impl ContentStore for ContentDb {
    type Transaction = OrderTx;

    async fn query_attachments(
        &self,
        folder_ids: &[FolderId],
        order_by: OrderBy,
        order: OrderDirection,
        limit: Limit,
    ) -> Result<Vec<AttachmentRecord>, ShelfError> {
        let sql = format!(
            r#"
                SELECT a.id, af.folder_id, a.title, a.file_path, a.mime_type, a.file_size,
                    a.menu_order, a.url, a.thumbnail_url, a.created_at
                FROM attachments a
                INNER JOIN attachment_folders af ON af.attachment_id = a.id
                WHERE af.folder_id = ANY($1)
                ORDER BY {}
                LIMIT $2
            "#,
            order_clause(order_by, order)
        );

        sqlx::query_as::<_, AttachmentRecord>(&sql)
            .bind(folder_ids)
            .bind(limit.as_sql())
            .fetch_all(&self.pool)
            .await
            .map_err(ShelfError::from)
    }

    async fn begin(&self) -> Result<OrderTx, ShelfError> {
        Ok(OrderTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// Order writes running inside a Postgres transaction.
#[derive(Debug)]
pub struct OrderTx {
    tx: Transaction<'static, Postgres>,
}

impl OrderTransaction for OrderTx {
    async fn set_menu_order(&mut self, id: DocumentId, order: i32) -> Result<bool, ShelfError> {
        let result = sqlx::query("UPDATE attachments SET menu_order = $1 WHERE id = $2")
            .bind(order)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self) -> Result<(), ShelfError> {
        self.tx.commit().await.map_err(ShelfError::from)
    }

    async fn rollback(self) -> Result<(), ShelfError> {
        self.tx.rollback().await.map_err(ShelfError::from)
    }
}
