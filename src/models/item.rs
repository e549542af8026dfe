//! Shared item model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Item listed for loan by its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Whether the owner currently accepts booking requests
    pub available: bool,
    pub owner_id: i64,
}

impl Item {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    pub fn short(&self) -> ItemShort {
        ItemShort {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Item reference embedded in booking responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemShort {
    pub id: i64,
    pub name: String,
}
