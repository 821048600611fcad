//! Room registry.
//!
//! Rooms are generated on first visit and then kept for the lifetime of the
//! mount. Every path that reaches a given room index observes the same
//! [`RoomData`], so books taken off a shelf or notes left on a desk are still
//! there when the room is entered again from another direction.
//!
//! Entities never own room state. They hold a [`RoomHandle`], which pairs
//! the registry with the shared cell of one room.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use babylon_core::{
    book_name_seed, generate, Cycle, Neighbors, RoomIndex, ShelfId, BOOKS_PER_SHELF,
    BOOK_NAME_LEN, ROOT_ROOM,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use crate::{FsError, FsResult};

/// A note: a name and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSlot {
    /// Entry name
    pub name: String,
    /// Note contents
    pub data: Vec<u8>,
}

impl NoteSlot {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: Vec::new(),
        }
    }
}

/// The list of notes a note belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteContainer {
    /// Loose notes lying on the desk
    Desk,
    /// Notes inside the named basket
    Basket(String),
}

impl fmt::Display for NoteContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteContainer::Desk => write!(f, "desk"),
            NoteContainer::Basket(name) => write!(f, "basket {}", name),
        }
    }
}

/// Mutable state of one room.
///
/// A book name is always in exactly one of its shelf's list and that
/// shelf's taken list. Names inside any note container are unique.
#[derive(Debug)]
pub struct RoomData {
    index: RoomIndex,
    cycle: Cycle,
    neighbors: Neighbors,
    shelf_to_book: BTreeMap<ShelfId, Vec<String>>,
    taken_books: BTreeMap<ShelfId, Vec<String>>,
    notes: Vec<NoteSlot>,
    baskets: BTreeMap<String, Vec<NoteSlot>>,
}

impl RoomData {
    /// Generates a fresh room: full shelves, an empty desk.
    pub fn generate(seed: &str, index: RoomIndex, cycle: Cycle) -> Self {
        let shelf_to_book = ShelfId::all()
            .map(|shelf| {
                let books = (0..BOOKS_PER_SHELF)
                    .map(|slot| generate(&book_name_seed(seed, index, shelf, slot), BOOK_NAME_LEN))
                    .collect();
                (shelf, books)
            })
            .collect();

        Self {
            index,
            cycle,
            neighbors: cycle.neighbors(index),
            shelf_to_book,
            taken_books: BTreeMap::new(),
            notes: Vec::new(),
            baskets: BTreeMap::new(),
        }
    }

    /// Returns the room index.
    pub fn index(&self) -> RoomIndex {
        self.index
    }

    /// Returns the topology this room was generated under.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Returns the neighbor indices.
    pub fn neighbors(&self) -> Neighbors {
        self.neighbors
    }

    // ------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------

    /// Books currently standing on `shelf`, in generation order.
    pub fn shelf_books(&self, shelf: ShelfId) -> &[String] {
        self.shelf_to_book
            .get(&shelf)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if `name` currently stands on `shelf`.
    pub fn is_on_shelf(&self, shelf: ShelfId, name: &str) -> bool {
        self.shelf_books(shelf).iter().any(|b| b == name)
    }

    /// Returns the shelf a book lying on the desk was taken from.
    pub fn taken_origin(&self, name: &str) -> Option<ShelfId> {
        self.taken_books
            .iter()
            .find(|(_, books)| books.iter().any(|b| b == name))
            .map(|(shelf, _)| *shelf)
    }

    /// Books lying on the desk, with the shelf each came from.
    pub fn taken_books(&self) -> impl Iterator<Item = (ShelfId, &str)> + '_ {
        self.taken_books
            .iter()
            .flat_map(|(shelf, books)| books.iter().map(move |b| (*shelf, b.as_str())))
    }

    /// Moves a book from `shelf` onto the desk.
    pub fn take_book(&mut self, shelf: ShelfId, name: &str) -> FsResult<()> {
        if self.desk_contains(name) {
            return Err(FsError::invalid(format!("{} already exists on the desk", name)));
        }
        let books = self
            .shelf_to_book
            .get_mut(&shelf)
            .ok_or_else(|| FsError::not_found(format!("shelf {}", shelf)))?;
        let pos = books
            .iter()
            .position(|b| b == name)
            .ok_or_else(|| FsError::invalid(format!("{} is not on shelf {}", name, shelf)))?;

        let book = books.remove(pos);
        self.taken_books.entry(shelf).or_default().push(book);
        Ok(())
    }

    /// Puts a book from the desk back onto `shelf`, its shelf of origin.
    pub fn return_book(&mut self, shelf: ShelfId, name: &str) -> FsResult<()> {
        let taken = self
            .taken_books
            .get_mut(&shelf)
            .ok_or_else(|| FsError::invalid(format!("nothing was taken from shelf {}", shelf)))?;
        let pos = taken
            .iter()
            .position(|b| b == name)
            .ok_or_else(|| FsError::invalid(format!("{} was not taken from shelf {}", name, shelf)))?;

        let book = taken.remove(pos);
        if taken.is_empty() {
            self.taken_books.remove(&shelf);
        }
        self.shelf_to_book.entry(shelf).or_default().push(book);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Desk
    // ------------------------------------------------------------------

    /// Everything on the desk: loose notes, baskets, then taken books.
    pub fn desk_listing(&self) -> Vec<String> {
        self.notes
            .iter()
            .map(|n| n.name.clone())
            .chain(self.baskets.keys().cloned())
            .chain(self.taken_books().map(|(_, b)| b.to_string()))
            .collect()
    }

    /// Returns true if `name` is already used by anything on the desk.
    pub fn desk_contains(&self, name: &str) -> bool {
        self.notes.iter().any(|n| n.name == name)
            || self.baskets.contains_key(name)
            || self.taken_origin(name).is_some()
    }

    /// Returns true if the basket exists.
    pub fn has_basket(&self, name: &str) -> bool {
        self.baskets.contains_key(name)
    }

    /// Notes held by `container`.
    pub fn notes(&self, container: &NoteContainer) -> FsResult<&[NoteSlot]> {
        match container {
            NoteContainer::Desk => Ok(&self.notes),
            NoteContainer::Basket(name) => self
                .baskets
                .get(name)
                .map(Vec::as_slice)
                .ok_or_else(|| FsError::not_found(format!("basket {}", name))),
        }
    }

    fn notes_mut(&mut self, container: &NoteContainer) -> FsResult<&mut Vec<NoteSlot>> {
        match container {
            NoteContainer::Desk => Ok(&mut self.notes),
            NoteContainer::Basket(name) => self
                .baskets
                .get_mut(name)
                .ok_or_else(|| FsError::not_found(format!("basket {}", name))),
        }
    }

    /// Position of the note called `name` in `container`.
    pub fn find_note(&self, container: &NoteContainer, name: &str) -> Option<usize> {
        self.notes(container)
            .ok()?
            .iter()
            .position(|n| n.name == name)
    }

    /// The note at `index` of `container`, provided it is still called `name`.
    pub fn note(&self, container: &NoteContainer, index: usize, name: &str) -> FsResult<&NoteSlot> {
        self.notes(container)?
            .get(index)
            .filter(|n| n.name == name)
            .ok_or_else(|| FsError::not_found(format!("note {} in {}", name, container)))
    }

    /// Mutable access to the note at `index` of `container`.
    pub fn note_mut(
        &mut self,
        container: &NoteContainer,
        index: usize,
        name: &str,
    ) -> FsResult<&mut NoteSlot> {
        self.notes_mut(container)?
            .get_mut(index)
            .filter(|n| n.name == name)
            .ok_or_else(|| FsError::not_found(format!("note {} in {}", name, container)))
    }

    fn name_taken(&self, container: &NoteContainer, name: &str) -> bool {
        match container {
            NoteContainer::Desk => self.desk_contains(name),
            NoteContainer::Basket(_) => self.find_note(container, name).is_some(),
        }
    }

    /// Creates an empty note.
    pub fn create_note(&mut self, container: &NoteContainer, name: &str) -> FsResult<()> {
        if self.name_taken(container, name) {
            return Err(FsError::invalid(format!("{} already exists in {}", name, container)));
        }
        self.notes_mut(container)?.push(NoteSlot::empty(name));
        Ok(())
    }

    /// Removes the note called `name`.
    pub fn delete_note(&mut self, container: &NoteContainer, name: &str) -> FsResult<NoteSlot> {
        let pos = self
            .find_note(container, name)
            .ok_or_else(|| FsError::invalid(format!("no note {} in {}", name, container)))?;
        Ok(self.notes_mut(container)?.remove(pos))
    }

    /// Creates an empty basket on the desk.
    pub fn create_basket(&mut self, name: &str) -> FsResult<()> {
        if self.desk_contains(name) {
            return Err(FsError::invalid(format!("{} already exists on the desk", name)));
        }
        self.baskets.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Removes a basket together with its notes.
    pub fn delete_basket(&mut self, name: &str) -> FsResult<Vec<NoteSlot>> {
        self.baskets
            .remove(name)
            .ok_or_else(|| FsError::invalid(format!("no basket {}", name)))
    }

    /// Renames a basket.
    pub fn rename_basket(&mut self, from: &str, to: &str) -> FsResult<()> {
        if from == to {
            return Ok(());
        }
        if self.desk_contains(to) {
            return Err(FsError::invalid(format!("{} already exists on the desk", to)));
        }
        let notes = self
            .baskets
            .remove(from)
            .ok_or_else(|| FsError::not_found(format!("basket {}", from)))?;
        self.baskets.insert(to.to_string(), notes);
        Ok(())
    }

    /// Moves (or renames) a note.
    ///
    /// The note is identified by `index` and `name` in `from`; it ends up
    /// appended to `to` under `new_name`. Within one container the note
    /// keeps its position.
    pub fn move_note(
        &mut self,
        from: &NoteContainer,
        index: usize,
        name: &str,
        to: &NoteContainer,
        new_name: &str,
    ) -> FsResult<()> {
        self.note(from, index, name)?;

        if from == to {
            if name != new_name {
                if self.name_taken(to, new_name) {
                    return Err(FsError::invalid(format!("{} already exists in {}", new_name, to)));
                }
                self.note_mut(from, index, name)?.name = new_name.to_string();
            }
            return Ok(());
        }

        // Destination must be valid before the note is detached
        self.notes(to)?;
        if self.name_taken(to, new_name) {
            return Err(FsError::invalid(format!("{} already exists in {}", new_name, to)));
        }

        let mut slot = self.notes_mut(from)?.remove(index);
        slot.name = new_name.to_string();
        self.notes_mut(to)?.push(slot);
        Ok(())
    }
}

/// Registry of every room visited during the mount.
pub struct RoomRegistry {
    seed: String,
    cycle: Cycle,
    rooms: RwLock<HashMap<RoomIndex, Arc<Mutex<RoomData>>>>,
    generated: AtomicU64,
}

impl RoomRegistry {
    /// Creates an empty registry for the given mount seed and topology.
    pub fn new(seed: impl Into<String>, cycle: Cycle) -> Arc<Self> {
        Arc::new(Self {
            seed: seed.into(),
            cycle,
            rooms: RwLock::new(HashMap::new()),
            generated: AtomicU64::new(0),
        })
    }

    /// Returns the mount seed.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Returns the room topology.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Number of rooms generated so far.
    pub fn rooms_generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Number of rooms currently held.
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Returns the room at the mount root.
    pub fn root(self: &Arc<Self>) -> RoomHandle {
        RoomHandle {
            registry: Arc::clone(self),
            index: ROOT_ROOM,
            data: self.get_or_create(ROOT_ROOM),
        }
    }

    /// Returns a handle to room `index`, generating the room if needed.
    pub fn room(self: &Arc<Self>, index: RoomIndex) -> FsResult<RoomHandle> {
        if !self.cycle.contains(index) {
            return Err(FsError::not_found(format!("room {} in {}", index, self.cycle)));
        }
        Ok(RoomHandle {
            registry: Arc::clone(self),
            index,
            data: self.get_or_create(index),
        })
    }

    fn get_or_create(&self, index: RoomIndex) -> Arc<Mutex<RoomData>> {
        if let Some(room) = self.rooms.read().get(&index) {
            return Arc::clone(room);
        }

        let mut rooms = self.rooms.write();
        // Another request may have generated it between the two locks
        if let Some(room) = rooms.get(&index) {
            return Arc::clone(room);
        }

        let room = Arc::new(Mutex::new(RoomData::generate(&self.seed, index, self.cycle)));
        rooms.insert(index, Arc::clone(&room));
        self.generated.fetch_add(1, Ordering::Relaxed);
        debug!(room = index, total = rooms.len(), "Generated room");
        room
    }
}

impl fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("seed", &self.seed)
            .field("cycle", &self.cycle)
            .field("rooms", &self.room_count())
            .finish()
    }
}

/// Shared handle to one room of a registry.
#[derive(Clone)]
pub struct RoomHandle {
    registry: Arc<RoomRegistry>,
    index: RoomIndex,
    data: Arc<Mutex<RoomData>>,
}

impl RoomHandle {
    /// Returns the room index.
    pub fn index(&self) -> RoomIndex {
        self.index
    }

    /// Returns the registry the room belongs to.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Returns the mount seed.
    pub fn seed(&self) -> &str {
        self.registry.seed()
    }

    /// Returns the neighbor indices.
    pub fn neighbors(&self) -> Neighbors {
        self.registry.cycle().neighbors(self.index)
    }

    /// Locks the room for reading or mutation.
    pub fn lock(&self) -> MutexGuard<'_, RoomData> {
        self.data.lock()
    }

    /// Returns true if both handles point at the same room.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Walks to a neighboring room.
    pub fn neighbor(&self, index: RoomIndex) -> FsResult<RoomHandle> {
        let n = self.neighbors();
        if index != n.left && index != n.right {
            return Err(FsError::not_found(format!(
                "room {} is not next to room {}",
                index, self.index
            )));
        }
        self.registry.room(index)
    }
}

impl fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomHandle").field("index", &self.index).finish()
    }
}
