//! The desk: the writable corner of every room.
//!
//! A desk holds loose notes, baskets of notes, and whatever books were
//! taken off the room's shelves. Notes and baskets are created, written,
//! renamed and deleted freely; books only come and go through moves.

use std::borrow::Cow;

use babylon_core::{DESK_NAME, MAX_NOTE_SIZE};
use tracing::debug;

use crate::entity::{clamp, Directory, Entity, File, Node};
use crate::registry::{NoteContainer, RoomHandle};
use crate::room::Book;
use crate::{FsError, FsResult};

/// The desk of a room.
#[derive(Debug)]
pub struct Desk {
    room: RoomHandle,
}

impl Desk {
    /// Creates a view of the desk in `room`.
    pub fn new(room: RoomHandle) -> Self {
        Self { room }
    }

    /// Returns the room handle.
    pub fn handle(&self) -> &RoomHandle {
        &self.room
    }
}

impl Node for Desk {
    fn name(&self) -> &str {
        DESK_NAME
    }
}

impl Directory for Desk {
    fn list(&self) -> Vec<String> {
        self.room.lock().desk_listing()
    }

    fn child(&self, name: &str) -> Option<Entity> {
        let room = self.room.lock();
        if let Some(index) = room.find_note(&NoteContainer::Desk, name) {
            return Some(Entity::Note(Note::new(
                self.room.clone(),
                NoteContainer::Desk,
                index,
                name,
            )));
        }
        if room.has_basket(name) {
            return Some(Entity::Basket(NotesBasket::new(self.room.clone(), name)));
        }
        let origin = room.taken_origin(name)?;
        Some(Entity::Book(Book::new(self.room.clone(), origin, name)))
    }

    fn create_file(&self, name: &str) -> FsResult<()> {
        self.room.lock().create_note(&NoteContainer::Desk, name)?;
        debug!(room = self.room.index(), name = name, "Created note");
        Ok(())
    }

    fn delete_file(&self, name: &str) -> FsResult<()> {
        self.room.lock().delete_note(&NoteContainer::Desk, name)?;
        debug!(room = self.room.index(), name = name, "Deleted note");
        Ok(())
    }

    fn create_directory(&self, name: &str) -> FsResult<()> {
        self.room.lock().create_basket(name)?;
        debug!(room = self.room.index(), name = name, "Created basket");
        Ok(())
    }

    fn delete_directory(&self, name: &str) -> FsResult<()> {
        let notes = self.room.lock().delete_basket(name)?;
        debug!(room = self.room.index(), name = name, notes = notes.len(), "Deleted basket");
        Ok(())
    }
}

/// A basket of notes standing on a desk.
#[derive(Debug)]
pub struct NotesBasket {
    room: RoomHandle,
    container: NoteContainer,
    name: String,
}

impl NotesBasket {
    /// Creates a view of basket `name` on the desk of `room`.
    pub fn new(room: RoomHandle, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            room,
            container: NoteContainer::Basket(name.clone()),
            name,
        }
    }

    /// Returns the room handle.
    pub fn handle(&self) -> &RoomHandle {
        &self.room
    }
}

impl Node for NotesBasket {
    fn name(&self) -> &str {
        &self.name
    }

    /// Baskets can be renamed but never leave their desk.
    fn relocate(&self, to: &Entity, new_name: &str) -> FsResult<()> {
        match to {
            Entity::Desk(desk) if desk.handle().same_room(&self.room) => {
                self.room.lock().rename_basket(&self.name, new_name)
            }
            _ => Err(FsError::invalid(format!(
                "basket {} cannot leave its desk",
                self.name
            ))),
        }
    }
}

impl Directory for NotesBasket {
    fn list(&self) -> Vec<String> {
        self.room
            .lock()
            .notes(&self.container)
            .map(|notes| notes.iter().map(|n| n.name.clone()).collect())
            .unwrap_or_default()
    }

    fn child(&self, name: &str) -> Option<Entity> {
        let index = self.room.lock().find_note(&self.container, name)?;
        Some(Entity::Note(Note::new(
            self.room.clone(),
            self.container.clone(),
            index,
            name,
        )))
    }

    fn create_file(&self, name: &str) -> FsResult<()> {
        self.room.lock().create_note(&self.container, name)?;
        debug!(room = self.room.index(), basket = %self.name, name = name, "Created note");
        Ok(())
    }

    fn delete_file(&self, name: &str) -> FsResult<()> {
        self.room.lock().delete_note(&self.container, name)?;
        debug!(room = self.room.index(), basket = %self.name, name = name, "Deleted note");
        Ok(())
    }
}

/// A note, bound to a slot of the desk or of a basket.
///
/// The slot index is captured when the note is looked up. Every access
/// checks the slot still carries the same name and reports NotFound if the
/// note went away in between.
#[derive(Debug)]
pub struct Note {
    room: RoomHandle,
    container: NoteContainer,
    index: usize,
    name: String,
}

impl Note {
    /// Creates a view of the note at `index` of `container`.
    pub fn new(
        room: RoomHandle,
        container: NoteContainer,
        index: usize,
        name: impl Into<String>,
    ) -> Self {
        Self {
            room,
            container,
            index,
            name: name.into(),
        }
    }

    /// Renames the note within its container.
    pub fn rename(&self, to: &str) -> FsResult<()> {
        self.room
            .lock()
            .move_note(&self.container, self.index, &self.name, &self.container, to)
    }
}

impl Node for Note {
    fn name(&self) -> &str {
        &self.name
    }

    /// Notes move freely between the desk and the baskets of their room.
    fn relocate(&self, to: &Entity, new_name: &str) -> FsResult<()> {
        let target = match to {
            Entity::Desk(desk) if desk.handle().same_room(&self.room) => NoteContainer::Desk,
            Entity::Basket(basket) if basket.handle().same_room(&self.room) => {
                NoteContainer::Basket(basket.name().to_string())
            }
            _ => {
                return Err(FsError::invalid(format!(
                    "note {} can only move between the desk and baskets of room {}",
                    self.name,
                    self.room.index()
                )))
            }
        };

        if target == self.container {
            return self.rename(new_name);
        }

        self.room
            .lock()
            .move_note(&self.container, self.index, &self.name, &target, new_name)?;
        debug!(
            room = self.room.index(),
            from = %self.container,
            to = %target,
            name = new_name,
            "Moved note"
        );
        Ok(())
    }
}

impl File for Note {
    fn contents(&self) -> FsResult<Cow<'_, [u8]>> {
        let room = self.room.lock();
        let note = room.note(&self.container, self.index, &self.name)?;
        Ok(Cow::Owned(note.data.clone()))
    }

    fn size(&self) -> FsResult<u64> {
        let room = self.room.lock();
        Ok(room.note(&self.container, self.index, &self.name)?.data.len() as u64)
    }

    fn is_writeable(&self) -> bool {
        true
    }

    fn write(&self, data: &[u8], offset: u64) -> FsResult<usize> {
        let end = offset
            .checked_add(data.len() as u64)
            .filter(|end| *end <= MAX_NOTE_SIZE)
            .ok_or_else(|| too_large(&self.name))?;
        // Both fit in usize once bounded by MAX_NOTE_SIZE
        let (offset, end) = (offset as usize, end as usize);

        let mut room = self.room.lock();
        let note = room.note_mut(&self.container, self.index, &self.name)?;
        if note.data.len() < end {
            note.data.resize(end, 0);
        }
        note.data[offset..end].copy_from_slice(data);
        Ok(data.len())
    }

    fn truncate(&self, size: u64) -> FsResult<()> {
        if size > MAX_NOTE_SIZE {
            return Err(too_large(&self.name));
        }
        let size = size as usize;
        let mut room = self.room.lock();
        room.note_mut(&self.container, self.index, &self.name)?
            .data
            .resize(size, 0);
        Ok(())
    }

    fn read_at(&self, offset: u64, size: usize) -> FsResult<Vec<u8>> {
        let room = self.room.lock();
        let note = room.note(&self.container, self.index, &self.name)?;
        Ok(clamp(&note.data, offset, size).to_vec())
    }
}

fn too_large(name: &str) -> FsError {
    FsError::FileTooLarge(format!("note {} is limited to {} bytes", name, MAX_NOTE_SIZE))
}
