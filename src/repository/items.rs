//! Items repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::ItemDirectory;
use crate::{error::AppResult, models::Item};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemDirectory for ItemsRepository {
    /// Get item by ID
    async fn find_by_id(&self, item_id: i64) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, name, description, available, owner_id FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }
}
