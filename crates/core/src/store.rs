//! Inventory state and the operations that mutate it.
//!
//! Every mutation rewrites the whole collection to storage under
//! [`STORAGE_KEY`] before returning.

use tracing::{debug, info};

use crate::{
    error::{StoreError, StoreResult},
    game_data::GameDataLoader,
    models::{default_items, GameData, Item},
    storage::KeyValueStorage,
};

/// Storage key holding the serialized item list.
pub const STORAGE_KEY: &str = "inventory";

/// Items on the grid, the current selection and fetched game data.
#[derive(Debug)]
pub struct InventoryStore<S> {
    storage: S,
    items: Vec<Item>,
    selected_item_id: Option<u64>,
    game_data: Option<GameData>,
}

impl<S: KeyValueStorage> InventoryStore<S> {
    /// Create an empty store over the given storage. Call [`Self::load_from_storage`] to populate it.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            items: Vec::new(),
            selected_item_id: None,
            game_data: None,
        }
    }

    /// Restore items from storage, seeding and persisting the defaults when nothing (or an empty value) is stored.
    pub fn load_from_storage(&mut self) -> StoreResult<()> {
        match self.storage.get_item(STORAGE_KEY)? {
            Some(saved) if !saved.is_empty() => {
                let parsed: Vec<Item> =
                    serde_json::from_str(&saved).map_err(|source| StoreError::Malformed {
                        key: STORAGE_KEY.to_string(),
                        source,
                    })?;
                info!(items = parsed.len(), "inventory restored from storage");
                self.items = parsed;
            }
            _ => {
                info!("no saved inventory; seeding defaults");
                self.items = default_items();
                self.persist()?;
            }
        }
        self.drop_dangling_selection();
        Ok(())
    }

    /// Wait for the loader and store the game data it yields.
    pub async fn load_game_data(&mut self, loader: &GameDataLoader) {
        let data = loader.fetch().await;
        self.set_game_data(data);
    }

    /// Replace the collection with the starter items.
    pub fn reset_to_default(&mut self) -> StoreResult<()> {
        self.items = default_items();
        self.drop_dangling_selection();
        info!("inventory reset to defaults");
        self.persist()
    }

    /// Remove the item with `id`. Returns `false` if no such item exists.
    pub fn delete_item(&mut self, id: u64) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            debug!(id, "delete ignored: unknown item");
            return Ok(false);
        };
        self.items.remove(index);
        self.drop_dangling_selection();
        debug!(id, "item deleted");
        self.persist()?;
        Ok(true)
    }

    /// Move the item with `id` to `(x, y)`.
    ///
    /// Returns `false` when the item is unknown or another item already holds the cell.
    /// Coordinates are not range-checked here.
    pub fn move_item(&mut self, id: u64, x: i32, y: i32) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            debug!(id, "move ignored: unknown item");
            return Ok(false);
        };
        if self
            .items
            .iter()
            .any(|other| other.id != id && other.occupies(x, y))
        {
            debug!(id, x, y, "move ignored: cell occupied");
            return Ok(false);
        }
        let item = &mut self.items[index];
        item.x = x;
        item.y = y;
        debug!(id, x, y, "item moved");
        self.persist()?;
        Ok(true)
    }

    /// Take `quantity` from the item with `id`, removing it once nothing is left.
    pub fn remove_item_quantity(&mut self, id: u64, quantity: i64) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            debug!(id, "quantity removal ignored: unknown item");
            return Ok(false);
        };
        let remaining = self.items[index].count.saturating_sub(quantity);
        if remaining > 0 {
            self.items[index].count = remaining;
            debug!(id, remaining, "item quantity reduced");
        } else {
            self.items.remove(index);
            if self.selected_item_id == Some(id) {
                self.selected_item_id = None;
            }
            debug!(id, "item exhausted and removed");
        }
        self.persist()?;
        Ok(true)
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item with the given id.
    pub fn item(&self, id: u64) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Item occupying `(x, y)`.
    pub fn item_at(&self, x: i32, y: i32) -> Option<&Item> {
        self.items.iter().find(|item| item.occupies(x, y))
    }

    /// Id of the selected item, if any.
    pub fn selected_item_id(&self) -> Option<u64> {
        self.selected_item_id
    }

    /// The selected item, if it still exists.
    pub fn selected_item(&self) -> Option<&Item> {
        self.selected_item_id.and_then(|id| self.item(id))
    }

    /// Select the item with `id`. Unknown ids leave the selection untouched.
    pub fn select_item(&mut self, id: u64) -> bool {
        if self.item(id).is_none() {
            return false;
        }
        self.selected_item_id = Some(id);
        true
    }

    /// Forget the current selection.
    pub fn clear_selection(&mut self) {
        self.selected_item_id = None;
    }

    /// Game data, once the fetch has completed.
    pub fn game_data(&self) -> Option<&GameData> {
        self.game_data.as_ref()
    }

    /// Store fetched game data.
    pub fn set_game_data(&mut self, data: GameData) {
        self.game_data = Some(data);
    }

    /// Backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn drop_dangling_selection(&mut self) {
        if let Some(id) = self.selected_item_id {
            if self.item(id).is_none() {
                self.selected_item_id = None;
            }
        }
    }

    fn persist(&mut self) -> StoreResult<()> {
        let serialized = serde_json::to_string(&self.items)?;
        self.storage.set_item(STORAGE_KEY, &serialized)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration};

    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::tempdir;

    fn loaded() -> (InventoryStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let mut store = InventoryStore::new(storage.clone());
        store.load_from_storage().expect("load defaults");
        (store, storage)
    }

    fn stored_items(storage: &MemoryStorage) -> Vec<Item> {
        let raw = storage
            .get_item(STORAGE_KEY)
            .expect("read storage")
            .expect("inventory persisted");
        serde_json::from_str(&raw).expect("valid json")
    }

    #[test]
    fn first_load_seeds_and_persists_defaults() {
        let (store, storage) = loaded();
        assert_eq!(store.items(), default_items().as_slice());
        assert_eq!(stored_items(&storage), default_items());
        assert_eq!(store.selected_item_id(), None);
        assert!(store.game_data().is_none());
    }

    #[test]
    fn load_restores_saved_items() -> StoreResult<()> {
        let mut storage = MemoryStorage::new();
        let saved = vec![Item {
            id: 42,
            color: "#000000".to_string(),
            count: 9,
            x: 3,
            y: 4,
            name: "Stone".to_string(),
            description: "Heavy".to_string(),
        }];
        storage.set_item(STORAGE_KEY, &serde_json::to_string(&saved)?)?;

        let mut store = InventoryStore::new(storage);
        store.load_from_storage()?;
        assert_eq!(store.items(), saved.as_slice());
        Ok(())
    }

    #[test]
    fn empty_stored_value_seeds_defaults() -> StoreResult<()> {
        let mut storage = MemoryStorage::new();
        storage.set_item(STORAGE_KEY, "")?;
        let mut store = InventoryStore::new(storage.clone());
        store.load_from_storage()?;
        assert_eq!(store.items(), default_items().as_slice());
        assert_eq!(stored_items(store.storage()), default_items());
        Ok(())
    }

    #[test]
    fn reset_clears_selection_of_removed_item() -> StoreResult<()> {
        let mut storage = MemoryStorage::new();
        let mut extra = default_items();
        extra.push(Item {
            id: 9,
            color: "#101010".to_string(),
            count: 1,
            x: 4,
            y: 4,
            name: "Key".to_string(),
            description: "Opens a door".to_string(),
        });
        storage.set_item(STORAGE_KEY, &serde_json::to_string(&extra)?)?;
        let mut store = InventoryStore::new(storage);
        store.load_from_storage()?;
        assert!(store.select_item(9));

        store.reset_to_default()?;
        assert_eq!(store.selected_item_id(), None);

        store.select_item(1);
        store.reset_to_default()?;
        assert_eq!(store.selected_item_id(), Some(1));
        Ok(())
    }

    #[test]
    fn reload_clears_selection_missing_from_storage() -> StoreResult<()> {
        let (mut store, mut storage) = loaded();
        assert!(store.select_item(3));
        let remaining: Vec<Item> = default_items().into_iter().filter(|item| item.id != 3).collect();
        storage.set_item(STORAGE_KEY, &serde_json::to_string(&remaining)?)?;

        store.load_from_storage()?;
        assert_eq!(store.items(), remaining.as_slice());
        assert_eq!(store.selected_item_id(), None);
        Ok(())
    }

    #[test]
    fn malformed_storage_is_reported() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(STORAGE_KEY, "{not json")
            .expect("write storage");
        let mut store = InventoryStore::new(storage);
        let err = store.load_from_storage().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { ref key, .. } if key == STORAGE_KEY));
    }

    #[test]
    fn move_to_free_cell_updates_and_persists() -> StoreResult<()> {
        let (mut store, storage) = loaded();
        assert!(store.move_item(1, 4, 4)?);
        assert_eq!(store.item_at(4, 4).map(|item| item.id), Some(1));
        assert!(store.item_at(0, 0).is_none());
        let persisted = stored_items(&storage);
        let moved = persisted.iter().find(|item| item.id == 1).unwrap();
        assert_eq!((moved.x, moved.y), (4, 4));
        Ok(())
    }

    #[test]
    fn move_onto_occupied_cell_is_rejected() -> StoreResult<()> {
        let (mut store, _storage) = loaded();
        assert!(!store.move_item(1, 1, 0)?);
        assert_eq!(store.items(), default_items().as_slice());

        assert!(!store.move_item(99, 3, 3)?);
        assert!(store.item_at(3, 3).is_none());

        // Dropping an item back onto its own cell is allowed.
        assert!(store.move_item(2, 1, 0)?);
        Ok(())
    }

    #[test]
    fn moves_never_stack_items() -> StoreResult<()> {
        let (mut store, _storage) = loaded();
        let targets = [(1, 0), (2, 0), (0, 0), (1, 1), (1, 1), (2, 1), (0, 0)];
        for (step, (x, y)) in targets.into_iter().enumerate() {
            let id = (step % 3) as u64 + 1;
            store.move_item(id, x, y)?;
            let cells: HashSet<(i32, i32)> =
                store.items().iter().map(|item| (item.x, item.y)).collect();
            assert_eq!(cells.len(), store.items().len());
        }
        Ok(())
    }

    #[test]
    fn partial_quantity_removal_keeps_item() -> StoreResult<()> {
        let (mut store, storage) = loaded();
        store.select_item(3);
        assert!(store.remove_item_quantity(3, 2)?);
        assert_eq!(store.item(3).map(|item| item.count), Some(4));
        assert_eq!(store.selected_item_id(), Some(3));
        let persisted = stored_items(&storage);
        assert_eq!(persisted.iter().find(|item| item.id == 3).unwrap().count, 4);
        Ok(())
    }

    #[test]
    fn exhausting_quantity_removes_item_and_selection() -> StoreResult<()> {
        let (mut store, storage) = loaded();
        assert!(store.select_item(2));
        assert!(store.remove_item_quantity(2, 5)?);
        assert!(store.item(2).is_none());
        assert_eq!(store.selected_item_id(), None);
        assert_eq!(stored_items(&storage).len(), 2);

        store.select_item(1);
        assert!(store.remove_item_quantity(3, 6)?);
        assert_eq!(store.selected_item_id(), Some(1));
        Ok(())
    }

    #[test]
    fn quantity_removal_on_unknown_item_is_noop() -> StoreResult<()> {
        let (mut store, _storage) = loaded();
        assert!(!store.remove_item_quantity(7, 1)?);
        assert_eq!(store.items(), default_items().as_slice());
        Ok(())
    }

    #[test]
    fn delete_unknown_leaves_collection() -> StoreResult<()> {
        let (mut store, storage) = loaded();
        assert!(!store.delete_item(404)?);
        assert_eq!(store.items(), default_items().as_slice());
        assert_eq!(stored_items(&storage), default_items());
        Ok(())
    }

    #[test]
    fn delete_removes_item_and_clears_selection() -> StoreResult<()> {
        let (mut store, storage) = loaded();
        store.select_item(1);
        assert!(store.delete_item(1)?);
        assert!(store.item(1).is_none());
        assert_eq!(store.selected_item_id(), None);
        assert_eq!(stored_items(&storage).len(), 2);
        Ok(())
    }

    #[test]
    fn reset_restores_defaults() -> StoreResult<()> {
        let (mut store, storage) = loaded();
        store.delete_item(1)?;
        store.move_item(2, 3, 3)?;
        store.reset_to_default()?;
        assert_eq!(store.items(), default_items().as_slice());
        assert_eq!(stored_items(&storage), default_items());
        Ok(())
    }

    #[test]
    fn selection_ignores_unknown_ids() {
        let (mut store, _storage) = loaded();
        assert!(!store.select_item(10));
        assert_eq!(store.selected_item_id(), None);
        assert!(store.select_item(2));
        assert_eq!(store.selected_item().map(|item| item.name.as_str()), Some("Желтый"));
        store.clear_selection();
        assert!(store.selected_item().is_none());
    }

    #[test]
    fn reload_from_files_round_trips() -> StoreResult<()> {
        let dir = tempdir().expect("tempdir");

        let mut store = InventoryStore::new(FileStorage::new(dir.path()));
        store.load_from_storage()?;
        store.move_item(3, 2, 2)?;
        store.remove_item_quantity(1, 1)?;
        let expected = store.items().to_vec();

        let mut reopened = InventoryStore::new(FileStorage::new(dir.path()));
        reopened.load_from_storage()?;
        assert_eq!(reopened.items(), expected.as_slice());
        Ok(())
    }

    #[tokio::test]
    async fn game_data_arrives_after_fetch() {
        let (mut store, _storage) = loaded();
        let loader = GameDataLoader::new(Duration::from_millis(1));
        store.load_game_data(&loader).await;
        assert_eq!(
            store.game_data().map(|data| data.description.as_str()),
            Some("Some decription")
        );
    }
}
