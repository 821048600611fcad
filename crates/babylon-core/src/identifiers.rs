//! Identifier types and fixed entry names.
//!
//! A room's layout never changes: four bookcases named `b0`..`b3`, each with
//! shelves `0`..`4`, one `desk`, and two doors named after the room index
//! they lead to (`k<index>`).

use std::fmt;

use crate::{BOOKCASES_PER_ROOM, SHELVES_PER_BOOKCASE};

/// Index of a room in the library graph. The root is room 0.
pub type RoomIndex = i64;

/// Room index of the mount root.
pub const ROOT_ROOM: RoomIndex = 0;

/// Prefix of the entries leading to neighboring rooms.
pub const ROOM_PREFIX: &str = "k";

/// Prefix of bookcase entries.
pub const BOOKCASE_PREFIX: &str = "b";

/// Name of the desk entry in every room.
pub const DESK_NAME: &str = "desk";

/// Returns the entry name of the door leading to room `index`.
pub fn room_entry_name(index: RoomIndex) -> String {
    format!("{}{}", ROOM_PREFIX, index)
}

/// Parses a door entry name back into the room index it leads to.
///
/// Only the canonical spelling is accepted (`k7`, `k-3`; not `k07`, `k+7`).
pub fn parse_room_entry(name: &str) -> Option<RoomIndex> {
    let index: RoomIndex = name.strip_prefix(ROOM_PREFIX)?.parse().ok()?;
    (room_entry_name(index) == name).then_some(index)
}

/// Bookcase within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookcaseId(pub u8);

impl BookcaseId {
    /// All bookcases of a room, in listing order.
    pub fn all() -> impl Iterator<Item = BookcaseId> {
        (0..BOOKCASES_PER_ROOM).map(BookcaseId)
    }

    /// Parses a bookcase entry name such as `b2`.
    pub fn parse(name: &str) -> Option<Self> {
        let id: u8 = name.strip_prefix(BOOKCASE_PREFIX)?.parse().ok()?;
        let id = BookcaseId(id);
        (id.0 < BOOKCASES_PER_ROOM && id.name() == name).then_some(id)
    }

    /// Returns the entry name of this bookcase.
    pub fn name(self) -> String {
        format!("{}{}", BOOKCASE_PREFIX, self.0)
    }

    /// Returns the shelves of this bookcase, in listing order.
    pub fn shelves(self) -> impl Iterator<Item = ShelfId> {
        (0..SHELVES_PER_BOOKCASE).map(move |shelf| ShelfId {
            bookcase: self,
            shelf,
        })
    }

    /// Parses a shelf entry name inside this bookcase.
    pub fn shelf(self, name: &str) -> Option<ShelfId> {
        let shelf: u8 = name.parse().ok()?;
        let id = ShelfId {
            bookcase: self,
            shelf,
        };
        (shelf < SHELVES_PER_BOOKCASE && id.slot_name() == name).then_some(id)
    }
}

impl fmt::Display for BookcaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", BOOKCASE_PREFIX, self.0)
    }
}

/// Shelf within a room, identified by its bookcase and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShelfId {
    /// Bookcase holding the shelf
    pub bookcase: BookcaseId,
    /// Slot of the shelf within its bookcase
    pub shelf: u8,
}

impl ShelfId {
    /// Every shelf of a room, bookcase by bookcase.
    pub fn all() -> impl Iterator<Item = ShelfId> {
        BookcaseId::all().flat_map(BookcaseId::shelves)
    }

    /// Returns the entry name of this shelf within its bookcase.
    pub fn slot_name(self) -> String {
        self.shelf.to_string()
    }
}

impl fmt::Display for ShelfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bookcase, self.shelf)
    }
}

/// Seed string for the name of the book in `slot` of `shelf` in `room`.
pub fn book_name_seed(mount_seed: &str, room: RoomIndex, shelf: ShelfId, slot: usize) -> String {
    // The mount seed goes last so free-form seeds cannot alias the numeric fields.
    format!(
        "name:{}:{}:{}:{}:{}",
        room, shelf.bookcase.0, shelf.shelf, slot, mount_seed
    )
}

/// Seed string for the content of the book called `book_name`.
pub fn book_content_seed(mount_seed: &str, book_name: &str) -> String {
    format!("book:{}:{}", book_name, mount_seed)
}
