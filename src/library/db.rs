use super::{Library, LibraryInput, LibrarySettings};
use crate::error::ShelfError;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use tracing::info;

#[derive(Debug, Clone)]
pub struct LibraryDb {
    pool: sqlx::PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct LibraryRow {
    id: i64,
    title: String,
    settings: Json<LibrarySettings>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LibraryRow> for Library {
    fn from(value: LibraryRow) -> Self {
        let LibraryRow {
            id,
            title,
            settings,
            created_at,
            updated_at,
        } = value;
        Self {
            id,
            title,
            settings: settings.0,
            created_at,
            updated_at,
        }
    }
}

impl LibraryDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Library>, ShelfError> {
        Ok(sqlx::query_as::<_, LibraryRow>(
            "SELECT id, title, settings, created_at, updated_at FROM libraries ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Library::from)
        .collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Library>, ShelfError> {
        Ok(sqlx::query_as::<_, LibraryRow>(
            "SELECT id, title, settings, created_at, updated_at FROM libraries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Library::from))
    }

    pub async fn insert(&self, input: &LibraryInput) -> Result<Library, ShelfError> {
        let library: Library = sqlx::query_as::<_, LibraryRow>(
            r#"
                INSERT INTO libraries(title, settings) VALUES($1, $2)
                RETURNING id, title, settings, created_at, updated_at
            "#,
        )
        .bind(&input.title)
        .bind(Json(&input.settings))
        .fetch_one(&self.pool)
        .await?
        .into();

        info!("Created library {} ({})", library.id, library.title);
        Ok(library)
    }

    pub async fn update(&self, id: i64, input: &LibraryInput) -> Result<Option<Library>, ShelfError> {
        let library = sqlx::query_as::<_, LibraryRow>(
            r#"
                UPDATE libraries SET title = $1, settings = $2, updated_at = NOW()
                WHERE id = $3
                RETURNING id, title, settings, created_at, updated_at
            "#,
        )
        .bind(&input.title)
        .bind(Json(&input.settings))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Library::from);

        if library.is_some() {
            info!("Updated library {id}");
        }
        Ok(library)
    }

    pub async fn remove(&self, id: i64) -> Result<bool, ShelfError> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(removed(id, result.rows_affected()))
    }
}

fn removed(id: i64, rows_affected: u64) -> bool {
    if rows_affected == 0 {
        return false;
    }
    info!("Deleted library {id}");
    true
}
