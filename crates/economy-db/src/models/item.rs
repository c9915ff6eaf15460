use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use economy_core::types::{Item, Rarity};

use crate::{DatabaseError, Result};

/// Database model for the items catalog table. Read-only to the core.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbItem {
    /// Item id (primary key)
    pub id: String,
    pub name: String,
    pub rarity: String,
    pub score_value: i64,
    pub image_url: Option<String>,
}

impl DbItem {
    pub fn into_item(self) -> Result<Item> {
        let rarity = Rarity::parse(&self.rarity).ok_or_else(|| DatabaseError::Corrupt {
            entity: "item.rarity",
            reason: format!("unknown rarity {:?} for item {}", self.rarity, self.id),
        })?;
        Ok(Item {
            id: self.id,
            name: self.name,
            rarity,
            score_value: self.score_value,
            image_url: self.image_url,
        })
    }
}
