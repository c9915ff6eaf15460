use dashmap::DashMap;
use tracing::info;

use crate::types::{Item, Rarity};

/// Thread-safe in-memory cache of the immutable item catalog.
///
/// Only read-only catalog data may live in memory; balances and inventories
/// never do. Loaded once at startup from the items table and replaced
/// wholesale on reload.
#[derive(Debug, Default)]
pub struct CatalogStore {
    /// item id -> Item
    items: DashMap<String, Item>,

    /// rarity -> item ids (for uniform draws within a rarity)
    by_rarity: DashMap<Rarity, Vec<String>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            by_rarity: DashMap::new(),
        }
    }

    /// Replace the catalog contents.
    pub fn load(&self, items: Vec<Item>) {
        self.items.clear();
        self.by_rarity.clear();
        for item in items {
            self.by_rarity
                .entry(item.rarity)
                .or_default()
                .push(item.id.clone());
            self.items.insert(item.id.clone(), item);
        }
        info!(items = self.items.len(), "Item catalog loaded");
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.items.get(id).map(|i| i.clone())
    }

    pub fn items_of_rarity(&self, rarity: Rarity) -> Vec<Item> {
        self.by_rarity
            .get(&rarity)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Rarities that have at least one catalog item.
    pub fn populated_rarities(&self) -> Vec<Rarity> {
        Rarity::ALL
            .into_iter()
            .filter(|r| {
                self.by_rarity
                    .get(r)
                    .map(|ids| !ids.is_empty())
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, rarity: Rarity, value: i64) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_string(),
            rarity,
            score_value: value,
            image_url: None,
        }
    }

    #[test]
    fn load_indexes_by_rarity() {
        let store = CatalogStore::new();
        store.load(vec![
            item("a", Rarity::Common, 1),
            item("b", Rarity::Common, 2),
            item("c", Rarity::Mythic, 500),
        ]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.items_of_rarity(Rarity::Common).len(), 2);
        assert_eq!(store.items_of_rarity(Rarity::Rare).len(), 0);
        assert_eq!(
            store.populated_rarities(),
            vec![Rarity::Common, Rarity::Mythic]
        );
    }

    #[test]
    fn reload_replaces_contents() {
        let store = CatalogStore::new();
        store.load(vec![item("a", Rarity::Common, 1)]);
        store.load(vec![item("b", Rarity::Rare, 10)]);

        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
        assert_eq!(store.len(), 1);
    }
}
