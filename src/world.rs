//! World geometry and item identifiers shared by the registry and routers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric item id as reported by the host (e.g. `271` for a wooden axe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemType(pub u32);

impl ItemType {
    /// Bare hand / no item.
    pub const AIR: ItemType = ItemType(0);
    pub const WOOD_AXE: ItemType = ItemType(271);
    pub const COMPASS: ItemType = ItemType(345);

    pub const WOOD_PICKAXE: ItemType = ItemType(270);
    pub const STONE_PICKAXE: ItemType = ItemType(274);
    pub const IRON_PICKAXE: ItemType = ItemType(257);
    pub const GOLD_PICKAXE: ItemType = ItemType(285);
    pub const DIAMOND_PICKAXE: ItemType = ItemType(278);

    /// Whether this item belongs to the pickaxe class.
    pub fn is_pickaxe(self) -> bool {
        matches!(
            self,
            Self::WOOD_PICKAXE
                | Self::STONE_PICKAXE
                | Self::IRON_PICKAXE
                | Self::GOLD_PICKAXE
                | Self::DIAMOND_PICKAXE
        )
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockVector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockVector {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl From<[i32; 3]> for BlockVector {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A block position inside a named world.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub world: String,
    pub position: BlockVector,
}

impl Location {
    pub fn new(world: impl Into<String>, position: BlockVector) -> Self {
        Self {
            world: world.into(),
            position,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.world, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickaxe_class() {
        assert!(ItemType::DIAMOND_PICKAXE.is_pickaxe());
        assert!(ItemType::WOOD_PICKAXE.is_pickaxe());
        assert!(!ItemType::WOOD_AXE.is_pickaxe());
        assert!(!ItemType::AIR.is_pickaxe());
    }

    #[test]
    fn item_type_is_transparent_in_json() {
        let item: ItemType = serde_json::from_str("271").unwrap();
        assert_eq!(item, ItemType::WOOD_AXE);
        assert_eq!(serde_json::to_string(&item).unwrap(), "271");
    }

    #[test]
    fn location_display() {
        let loc = Location::new("world", BlockVector::new(1, -2, 3));
        assert_eq!(loc.to_string(), "world@(1, -2, 3)");
    }
}
