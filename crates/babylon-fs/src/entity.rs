//! Entity model.
//!
//! Every entry of the library is an [`Entity`]. Entities are cheap,
//! per-request views over registry state; they carry no identity of their
//! own beyond the room they point at.
//!
//! Capabilities are split over three traits. Their default methods are the
//! "forbidden" behavior, so each kind only implements what it permits:
//! - [`Node`]: naming and moving (`rename` is a move into the same parent)
//! - [`Directory`]: listing, lookup, creating and deleting children
//! - [`File`]: reading, writing, truncating

use std::borrow::Cow;

use crate::desk::{Desk, Note, NotesBasket};
use crate::room::{Book, Bookcase, Room, Shelf};
use crate::{FsError, FsResult};

/// Kind of an entity as seen through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Directory
    Directory,
    /// Regular file
    File,
}

/// Attributes of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Entity kind
    pub kind: EntityKind,
    /// Permission bits
    pub perm: u16,
    /// Size in bytes
    pub size: u64,
}

impl Stat {
    /// Attributes of a directory.
    pub fn directory() -> Self {
        Self {
            kind: EntityKind::Directory,
            perm: 0o755,
            size: 0,
        }
    }

    /// Attributes of a file.
    pub fn file(size: u64, writeable: bool) -> Self {
        Self {
            kind: EntityKind::File,
            perm: if writeable { 0o644 } else { 0o444 },
            size,
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntityKind::Directory
    }
}

/// Behavior shared by every entity.
pub trait Node {
    /// Entry name the entity was reached through.
    fn name(&self) -> &str;

    /// Moves the entity into directory `to` under `new_name`.
    fn relocate(&self, to: &Entity, new_name: &str) -> FsResult<()> {
        let _ = (to, new_name);
        Err(FsError::permission_denied(format!("{} cannot be moved", self.name())))
    }
}

/// Directory capability.
pub trait Directory: Node {
    /// Child names in listing order.
    fn list(&self) -> Vec<String>;

    /// Looks up a child by name.
    fn child(&self, name: &str) -> Option<Entity>;

    /// Creates an empty file.
    fn create_file(&self, name: &str) -> FsResult<()> {
        Err(FsError::permission_denied(format!(
            "cannot create {} in {}",
            name,
            self.name()
        )))
    }

    /// Deletes a file.
    fn delete_file(&self, name: &str) -> FsResult<()> {
        Err(FsError::permission_denied(format!(
            "cannot delete {} from {}",
            name,
            self.name()
        )))
    }

    /// Creates an empty directory.
    fn create_directory(&self, name: &str) -> FsResult<()> {
        Err(FsError::permission_denied(format!(
            "cannot create directory {} in {}",
            name,
            self.name()
        )))
    }

    /// Deletes a directory.
    fn delete_directory(&self, name: &str) -> FsResult<()> {
        Err(FsError::permission_denied(format!(
            "cannot delete directory {} from {}",
            name,
            self.name()
        )))
    }
}

/// File capability.
pub trait File: Node {
    /// Full file contents.
    fn contents(&self) -> FsResult<Cow<'_, [u8]>>;

    /// Size in bytes.
    fn size(&self) -> FsResult<u64>;

    /// Returns true if the file accepts writes.
    fn is_writeable(&self) -> bool {
        false
    }

    /// Writes `data` at `offset`, returning the number of bytes written.
    fn write(&self, data: &[u8], offset: u64) -> FsResult<usize> {
        let _ = (data, offset);
        Err(FsError::permission_denied(format!("{} is read-only", self.name())))
    }

    /// Sets the file length.
    fn truncate(&self, size: u64) -> FsResult<()> {
        let _ = size;
        Err(FsError::permission_denied(format!("{} is read-only", self.name())))
    }

    /// Reads up to `size` bytes at `offset`.
    ///
    /// Reads past the end return fewer bytes, or none at all.
    fn read_at(&self, offset: u64, size: usize) -> FsResult<Vec<u8>> {
        let contents = self.contents()?;
        Ok(clamp(&contents, offset, size).to_vec())
    }
}

/// Returns the part of `data` covered by a read of `size` bytes at `offset`.
pub(crate) fn clamp(data: &[u8], offset: u64, size: usize) -> &[u8] {
    let len = data.len() as u64;
    if offset >= len {
        return &[];
    }
    let start = offset as usize;
    let end = start.saturating_add(size).min(data.len());
    &data[start..end]
}

/// Any entry of the library.
#[derive(Debug)]
pub enum Entity {
    /// A room of the library
    Room(Room),
    /// One of a room's four bookcases
    Bookcase(Bookcase),
    /// One of a bookcase's five shelves
    Shelf(Shelf),
    /// A generated, read-only book
    Book(Book),
    /// The writable desk of a room
    Desk(Desk),
    /// A user-created basket on a desk
    Basket(NotesBasket),
    /// A note on a desk or in a basket
    Note(Note),
}

impl Entity {
    /// Returns the entity as a [`Node`].
    pub fn as_node(&self) -> &dyn Node {
        match self {
            Entity::Room(e) => e,
            Entity::Bookcase(e) => e,
            Entity::Shelf(e) => e,
            Entity::Book(e) => e,
            Entity::Desk(e) => e,
            Entity::Basket(e) => e,
            Entity::Note(e) => e,
        }
    }

    /// Returns the entity as a [`Directory`], if it is one.
    pub fn as_directory(&self) -> Option<&dyn Directory> {
        match self {
            Entity::Room(e) => Some(e),
            Entity::Bookcase(e) => Some(e),
            Entity::Shelf(e) => Some(e),
            Entity::Desk(e) => Some(e),
            Entity::Basket(e) => Some(e),
            Entity::Book(_) | Entity::Note(_) => None,
        }
    }

    /// Returns the entity as a [`File`], if it is one.
    pub fn as_file(&self) -> Option<&dyn File> {
        match self {
            Entity::Book(e) => Some(e),
            Entity::Note(e) => Some(e),
            _ => None,
        }
    }

    /// Entry name the entity was reached through.
    pub fn name(&self) -> &str {
        self.as_node().name()
    }

    /// Returns the entity kind.
    pub fn kind(&self) -> EntityKind {
        if self.as_directory().is_some() {
            EntityKind::Directory
        } else {
            EntityKind::File
        }
    }

    /// Returns the entity attributes.
    pub fn stat(&self) -> FsResult<Stat> {
        match self.as_file() {
            Some(file) => Ok(Stat::file(file.size()?, file.is_writeable())),
            None => Ok(Stat::directory()),
        }
    }

    /// Moves the entity into `to` under `new_name`.
    pub fn relocate(&self, to: &Entity, new_name: &str) -> FsResult<()> {
        self.as_node().relocate(to, new_name)
    }
}
