//! The room catalog: the ordered list of room types a chain is built from.

use roomchain_core::error::ChainError;
use roomchain_core::handles::AssetRef;
use serde::{Deserialize, Serialize};

/// One room type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    /// Display name, used in popups and logs.
    pub name: String,
    /// The asset instantiated for this room.
    pub asset: AssetRef,
}

impl RoomDefinition {
    /// Creates a room definition.
    #[must_use]
    pub fn new(name: impl Into<String>, asset: AssetRef) -> Self {
        Self {
            name: name.into(),
            asset,
        }
    }
}

/// Ordered, non-empty list of room definitions. A room's position in the
/// catalog is its room index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RoomDefinition>", into = "Vec<RoomDefinition>")]
pub struct RoomCatalog {
    rooms: Vec<RoomDefinition>,
}

impl RoomCatalog {
    /// Creates a catalog from its definitions.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Validation` if `rooms` is empty.
    pub fn new(rooms: Vec<RoomDefinition>) -> Result<Self, ChainError> {
        if rooms.is_empty() {
            return Err(ChainError::Validation(
                "room catalog must contain at least one room".to_owned(),
            ));
        }
        Ok(Self { rooms })
    }

    /// Returns the definition at `index`, if it exists.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RoomDefinition> {
        self.rooms.get(index)
    }

    /// Returns the number of room types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if the catalog holds no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Index of the final room.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.rooms.len() - 1
    }

    /// Name of the room at `index`, or a placeholder for an index outside
    /// the catalog.
    #[must_use]
    pub fn name_of(&self, index: usize) -> &str {
        self.get(index).map_or("unknown room", |room| room.name.as_str())
    }

    /// Iterates over the definitions in index order.
    pub fn iter(&self) -> impl Iterator<Item = &RoomDefinition> {
        self.rooms.iter()
    }
}

impl TryFrom<Vec<RoomDefinition>> for RoomCatalog {
    type Error = ChainError;

    fn try_from(rooms: Vec<RoomDefinition>) -> Result<Self, Self::Error> {
        Self::new(rooms)
    }
}

impl From<RoomCatalog> for Vec<RoomDefinition> {
    fn from(catalog: RoomCatalog) -> Self {
        catalog.rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> RoomDefinition {
        RoomDefinition::new(name, AssetRef::new(format!("rooms/{name}")))
    }

    #[test]
    fn test_new_rejects_empty_catalog() {
        let result = RoomCatalog::new(Vec::new());

        assert!(matches!(result, Err(ChainError::Validation(_))));
    }

    #[test]
    fn test_lookup_by_index() {
        // Arrange
        let catalog = RoomCatalog::new(vec![room("Dining Room"), room("Bathroom")]).unwrap();

        // Act / Assert
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_empty());
        assert_eq!(catalog.last_index(), 1);
        assert_eq!(catalog.name_of(1), "Bathroom");
        assert_eq!(catalog.name_of(2), "unknown room");
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_deserialize_from_json_list() {
        // Arrange
        let json = r#"[
            {"name": "Mudroom", "asset": "rooms/mudroom"},
            {"name": "Living Room", "asset": "rooms/living_room"}
        ]"#;

        // Act
        let catalog: RoomCatalog = serde_json::from_str(json).unwrap();

        // Assert
        let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Mudroom", "Living Room"]);
        assert_eq!(catalog.get(0).unwrap().asset, AssetRef::new("rooms/mudroom"));
    }

    #[test]
    fn test_deserialize_rejects_empty_list() {
        let result: Result<RoomCatalog, _> = serde_json::from_str("[]");

        assert!(result.is_err());
    }
}
