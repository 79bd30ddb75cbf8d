//! Shared domain models.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A single inventory entry placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier, unique within a collection.
    pub id: u64,
    /// Hex colour used to paint the cell (e.g. `#7FAA65`).
    pub color: String,
    /// Quantity held. Always positive while the item is stored.
    pub count: i64,
    /// Grid column.
    pub x: i32,
    /// Grid row.
    pub y: i32,
    /// Display name.
    pub name: String,
    /// Free-form description shown in the item modal.
    pub description: String,
}

impl Item {
    /// Whether the item sits at the given cell.
    pub fn occupies(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }

    /// Parse the hex colour into an RGB triple, if it is well formed.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.color.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some((r, g, b))
    }
}

/// Metadata about the game, fetched once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    /// Image reference for the game banner.
    pub image: String,
    /// Game title.
    pub name: String,
    /// Game blurb.
    pub description: String,
}

static DEFAULT_ITEMS: Lazy<Vec<Item>> = Lazy::new(|| {
    [
        (1, "#7FAA65", 4, 0, "Зеленый"),
        (2, "#AA9765", 2, 1, "Желтый"),
        (3, "#656CAA", 6, 2, "Синий"),
    ]
    .into_iter()
    .map(|(id, color, count, x, name)| Item {
        id,
        color: color.to_string(),
        count,
        x,
        y: 0,
        name: name.to_string(),
        description: "Какое-то описание".to_string(),
    })
    .collect()
});

/// Starter inventory used on first launch and on reset.
pub fn default_items() -> Vec<Item> {
    DEFAULT_ITEMS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_on_first_row() {
        let items = default_items();
        assert_eq!(items.len(), 3);
        let cells: Vec<(i32, i32)> = items.iter().map(|item| (item.x, item.y)).collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0)]);
        assert_eq!(
            items.iter().map(|item| item.count).collect::<Vec<_>>(),
            vec![4, 2, 6]
        );
    }

    #[test]
    fn parses_hex_colours() {
        let mut item = default_items().remove(0);
        assert_eq!(item.rgb(), Some((0x7F, 0xAA, 0x65)));
        item.color = "#zz0000".to_string();
        assert_eq!(item.rgb(), None);
        item.color = "fff".to_string();
        assert_eq!(item.rgb(), None);
    }

    #[test]
    fn serializes_with_storage_field_names() {
        let item = default_items().remove(1);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["color"], "#AA9765");
        assert_eq!(value["count"], 2);
        assert_eq!(value["x"], 1);
        assert_eq!(value["y"], 0);
        assert_eq!(value["name"], "Желтый");
    }
}
