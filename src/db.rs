use crate::error::ShelfError;
use sqlx::PgPool;
use tracing::info;

pub async fn create_pool(url: &str) -> Result<PgPool, ShelfError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await?;
    info!("Connected to database");
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), ShelfError> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}
