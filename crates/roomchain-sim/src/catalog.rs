//! The house's built-in room catalog.

use roomchain_core::error::ChainError;
use roomchain_core::handles::AssetRef;
use roomchain_rooms::domain::catalog::{RoomCatalog, RoomDefinition};

const DEFAULT_ROOMS: [(&str, &str); 7] = [
    ("Dining Room", "rooms/dining_room"),
    ("Zig Zag Hallway", "rooms/zig_zag_hallway"),
    ("Bathroom", "rooms/bathroom"),
    ("Neverending Hallway", "rooms/neverending_hallway"),
    ("Living Room", "rooms/living_room"),
    ("Split Hallway", "rooms/split_hallway"),
    ("Mudroom", "rooms/mudroom"),
];

/// The seven rooms of the house, in walking order.
///
/// # Errors
///
/// Never fails for the built-in list; the signature follows
/// `RoomCatalog::new`.
pub fn default_catalog() -> Result<RoomCatalog, ChainError> {
    RoomCatalog::new(
        DEFAULT_ROOMS
            .iter()
            .map(|(name, asset)| RoomDefinition::new(*name, AssetRef::new(*asset)))
            .collect(),
    )
}
