//! Rooms and their read-only furniture: bookcases, shelves and books.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::fmt;

use babylon_core::{
    book_content_seed, generate_range, parse_room_entry, room_entry_name, BookcaseId, ShelfId,
    BOOK_SIZE, DESK_NAME,
};
use tracing::warn;

use crate::desk::Desk;
use crate::entity::{clamp, Directory, Entity, File, Node};
use crate::registry::RoomHandle;
use crate::{FsError, FsResult};

/// A room: two doors, four bookcases and a desk.
#[derive(Debug)]
pub struct Room {
    room: RoomHandle,
    name: String,
}

impl Room {
    /// Creates a view of `room` reached through entry `name`.
    pub fn new(room: RoomHandle, name: impl Into<String>) -> Self {
        Self {
            room,
            name: name.into(),
        }
    }

    /// Returns the room handle.
    pub fn handle(&self) -> &RoomHandle {
        &self.room
    }
}

impl Node for Room {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Directory for Room {
    fn list(&self) -> Vec<String> {
        let n = self.room.neighbors();
        let mut entries = vec![room_entry_name(n.left)];
        // Rings of one or two rooms lead to the same room on both sides
        if n.right != n.left {
            entries.push(room_entry_name(n.right));
        }
        entries.extend(BookcaseId::all().map(BookcaseId::name));
        entries.push(DESK_NAME.to_string());
        entries
    }

    fn child(&self, name: &str) -> Option<Entity> {
        if name == DESK_NAME {
            return Some(Entity::Desk(Desk::new(self.room.clone())));
        }
        if let Some(bookcase) = BookcaseId::parse(name) {
            return Some(Entity::Bookcase(Bookcase::new(self.room.clone(), bookcase)));
        }
        let index = parse_room_entry(name)?;
        let neighbor = self.room.neighbor(index).ok()?;
        Some(Entity::Room(Room::new(neighbor, name)))
    }
}

/// A bookcase holding five shelves.
#[derive(Debug)]
pub struct Bookcase {
    room: RoomHandle,
    id: BookcaseId,
    name: String,
}

impl Bookcase {
    /// Creates a view of bookcase `id` in `room`.
    pub fn new(room: RoomHandle, id: BookcaseId) -> Self {
        Self {
            room,
            id,
            name: id.name(),
        }
    }

    /// Returns the bookcase id.
    pub fn id(&self) -> BookcaseId {
        self.id
    }
}

impl Node for Bookcase {
    fn name(&self) -> &str {
        &self.name
    }

    /// Bookcases never leave their room; a move back into it is a no-op.
    fn relocate(&self, to: &Entity, _new_name: &str) -> FsResult<()> {
        match to {
            Entity::Room(room) if room.handle().same_room(&self.room) => Ok(()),
            _ => Err(FsError::invalid(format!(
                "bookcase {} cannot leave room {}",
                self.id,
                self.room.index()
            ))),
        }
    }
}

impl Directory for Bookcase {
    fn list(&self) -> Vec<String> {
        self.id.shelves().map(ShelfId::slot_name).collect()
    }

    fn child(&self, name: &str) -> Option<Entity> {
        let shelf = self.id.shelf(name)?;
        Some(Entity::Shelf(Shelf::new(self.room.clone(), shelf)))
    }
}

/// A shelf of generated books.
#[derive(Debug)]
pub struct Shelf {
    room: RoomHandle,
    id: ShelfId,
    name: String,
}

impl Shelf {
    /// Creates a view of shelf `id` in `room`.
    pub fn new(room: RoomHandle, id: ShelfId) -> Self {
        Self {
            room,
            id,
            name: id.slot_name(),
        }
    }

    /// Returns the shelf id.
    pub fn id(&self) -> ShelfId {
        self.id
    }

    /// Returns the room handle.
    pub fn handle(&self) -> &RoomHandle {
        &self.room
    }
}

impl Node for Shelf {
    fn name(&self) -> &str {
        &self.name
    }

    /// Shelves stay in their bookcase. A rename inside it is accepted as a
    /// no-op as long as the new name still starts with the slot name.
    fn relocate(&self, to: &Entity, new_name: &str) -> FsResult<()> {
        match to {
            Entity::Bookcase(bookcase)
                if bookcase.room.same_room(&self.room)
                    && bookcase.id() == self.id.bookcase
                    && new_name.starts_with(&self.name) =>
            {
                Ok(())
            }
            _ => Err(FsError::invalid(format!(
                "shelf {} cannot be moved to {}/{}",
                self.id,
                to.name(),
                new_name
            ))),
        }
    }
}

impl Directory for Shelf {
    fn list(&self) -> Vec<String> {
        self.room.lock().shelf_books(self.id).to_vec()
    }

    fn child(&self, name: &str) -> Option<Entity> {
        if !self.room.lock().is_on_shelf(self.id, name) {
            return None;
        }
        Some(Entity::Book(Book::new(self.room.clone(), self.id, name)))
    }
}

/// A generated, read-only book.
///
/// Content is derived from the mount seed and the book name, so every copy
/// of a book reads the same. The full text is generated at most once per
/// view; ranged reads on a fresh view only generate the requested window.
pub struct Book {
    room: RoomHandle,
    origin: ShelfId,
    name: String,
    content: OnceCell<Vec<u8>>,
}

impl Book {
    /// Creates a view of book `name` whose home is `origin` in `room`.
    pub fn new(room: RoomHandle, origin: ShelfId, name: impl Into<String>) -> Self {
        Self {
            room,
            origin,
            name: name.into(),
            content: OnceCell::new(),
        }
    }

    fn seed(&self) -> String {
        book_content_seed(self.room.seed(), &self.name)
    }
}

impl fmt::Debug for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Book")
            .field("room", &self.room)
            .field("origin", &self.origin)
            .field("name", &self.name)
            .finish()
    }
}

impl Node for Book {
    fn name(&self) -> &str {
        &self.name
    }

    /// Books only travel between their own shelf and their room's desk.
    /// The name never changes.
    fn relocate(&self, to: &Entity, _new_name: &str) -> FsResult<()> {
        let result = match to {
            Entity::Shelf(shelf) if shelf.handle().same_room(&self.room) => {
                if shelf.id() != self.origin {
                    Err(FsError::invalid(format!(
                        "{} belongs on shelf {}, not {}",
                        self.name,
                        self.origin,
                        shelf.id()
                    )))
                } else {
                    self.room.lock().return_book(self.origin, &self.name)
                }
            }
            Entity::Desk(desk) if desk.handle().same_room(&self.room) => {
                self.room.lock().take_book(self.origin, &self.name)
            }
            _ => Err(FsError::invalid(format!(
                "{} cannot leave room {}",
                self.name,
                self.room.index()
            ))),
        };

        if let Err(e) = &result {
            warn!(book = %self.name, to = %to.name(), error = %e, "Rejected book move");
        }
        result
    }
}

impl File for Book {
    fn contents(&self) -> FsResult<Cow<'_, [u8]>> {
        let content = self
            .content
            .get_or_init(|| generate_range(&self.seed(), 0, BOOK_SIZE as usize));
        Ok(Cow::Borrowed(content.as_slice()))
    }

    fn size(&self) -> FsResult<u64> {
        Ok(BOOK_SIZE)
    }

    fn read_at(&self, offset: u64, size: usize) -> FsResult<Vec<u8>> {
        if let Some(content) = self.content.get() {
            return Ok(clamp(content, offset, size).to_vec());
        }
        if offset >= BOOK_SIZE {
            return Ok(Vec::new());
        }
        let len = (size as u64).min(BOOK_SIZE - offset) as usize;
        Ok(generate_range(&self.seed(), offset, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoomRegistry;
    use babylon_core::{Cycle, BOOKS_PER_SHELF};

    fn root(cycle: Cycle) -> Room {
        let registry = RoomRegistry::new("test_seed", cycle);
        Room::new(registry.root(), "")
    }

    fn shelf(room: &Room, bookcase: &str, slot: &str) -> Shelf {
        let Some(Entity::Bookcase(case)) = room.child(bookcase) else {
            panic!("no bookcase {}", bookcase);
        };
        let Some(Entity::Shelf(shelf)) = case.child(slot) else {
            panic!("no shelf {}", slot);
        };
        shelf
    }

    #[test]
    fn test_room_listing() {
        let room = root(Cycle::Unbounded);
        assert_eq!(
            room.list(),
            vec!["k-1", "k1", "b0", "b1", "b2", "b3", "desk"]
        );
    }

    #[test]
    fn test_small_ring_lists_single_door() {
        let room = root(Cycle::from_size(Some(2)));
        assert_eq!(room.list()[0], "k1");
        assert_eq!(room.list()[1], "b0");

        let room = root(Cycle::from_size(Some(1)));
        assert_eq!(room.list()[0], "k0");
        assert!(matches!(room.child("k0"), Some(Entity::Room(_))));
    }

    #[test]
    fn test_room_children() {
        let room = root(Cycle::Unbounded);
        assert!(matches!(room.child("k1"), Some(Entity::Room(_))));
        assert!(matches!(room.child("k-1"), Some(Entity::Room(_))));
        assert!(room.child("k2").is_none());
        assert!(matches!(room.child("b3"), Some(Entity::Bookcase(_))));
        assert!(room.child("b4").is_none());
        assert!(matches!(room.child("desk"), Some(Entity::Desk(_))));
        assert!(room.child("nope").is_none());
    }

    #[test]
    fn test_shelf_lists_32_books() {
        let room = root(Cycle::Unbounded);
        let shelf = shelf(&room, "b1", "3");
        let books = shelf.list();
        assert_eq!(books.len(), BOOKS_PER_SHELF);
        assert!(matches!(shelf.child(&books[0]), Some(Entity::Book(_))));
        assert!(shelf.child("not-a-book").is_none());
    }

    #[test]
    fn test_book_contents_and_ranges() {
        let room = root(Cycle::Unbounded);
        let shelf = shelf(&room, "b0", "0");
        let name = shelf.list()[0].clone();
        let Some(Entity::Book(book)) = shelf.child(&name) else {
            panic!("no book");
        };

        assert_eq!(book.size().unwrap(), BOOK_SIZE);
        assert!(!book.is_writeable());

        let window = book.read_at(1000, 64).unwrap();
        let full = book.contents().unwrap();
        assert_eq!(full.len() as u64, BOOK_SIZE);
        assert_eq!(&full[1000..1064], window.as_slice());

        // Served from the cached text now
        assert_eq!(book.read_at(BOOK_SIZE - 10, 1000).unwrap().len(), 10);
        assert!(book.read_at(BOOK_SIZE, 10).unwrap().is_empty());
    }

    #[test]
    fn test_fresh_book_clamps_reads() {
        let room = root(Cycle::Unbounded);
        let shelf = shelf(&room, "b0", "0");
        let name = shelf.list()[1].clone();
        let book = Book::new(room.handle().clone(), shelf.id(), name);
        assert_eq!(book.read_at(BOOK_SIZE - 10, 1000).unwrap().len(), 10);
        assert!(book.read_at(BOOK_SIZE + 5, 1).unwrap().is_empty());
    }

    #[test]
    fn test_book_is_read_only() {
        let room = root(Cycle::Unbounded);
        let shelf = shelf(&room, "b0", "0");
        let book = Book::new(room.handle().clone(), shelf.id(), shelf.list()[0].clone());
        assert!(matches!(book.write(b"x", 0), Err(FsError::PermissionDenied(_))));
        assert!(matches!(book.truncate(0), Err(FsError::PermissionDenied(_))));
    }

    #[test]
    fn test_structural_moves() {
        let room = root(Cycle::Unbounded);
        let Some(Entity::Bookcase(case)) = room.child("b0") else {
            panic!("no bookcase");
        };
        let here = Entity::Room(Room::new(room.handle().clone(), ""));
        let next = room.child("k1").unwrap();

        assert!(case.relocate(&here, "b0n").is_ok());
        assert!(matches!(case.relocate(&next, "b0"), Err(FsError::InvalidArgument(_))));

        let shelf = shelf(&room, "b0", "2");
        let own_case = room.child("b0").unwrap();
        let other_case = room.child("b1").unwrap();
        assert!(shelf.relocate(&own_case, "2n").is_ok());
        assert!(matches!(shelf.relocate(&own_case, "x"), Err(FsError::InvalidArgument(_))));
        assert!(matches!(shelf.relocate(&other_case, "2"), Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn test_rooms_cannot_move() {
        let room = root(Cycle::Unbounded);
        let next = room.child("k1").unwrap();
        assert!(matches!(room.relocate(&next, "x"), Err(FsError::PermissionDenied(_))));
    }
}
