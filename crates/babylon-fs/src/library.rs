//! Request dispatcher.
//!
//! [`Library`] is the context of one mount: seed, topology and room
//! registry. It answers path-based POSIX-style requests by resolving the
//! path and delegating to the entity found there. Every request either
//! succeeds or fails as a whole with one [`FsError`]; the bridge turns that
//! into an error code.

use std::sync::Arc;

use babylon_core::Cycle;
use tracing::debug;

use crate::entity::{Entity, EntityKind, Stat};
use crate::registry::RoomRegistry;
use crate::resolver;
use crate::room::Room;
use crate::{FsError, FsResult};

/// Access mode requested by an open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `O_RDONLY`
    ReadOnly,
    /// `O_WRONLY`
    WriteOnly,
    /// `O_RDWR`
    ReadWrite,
}

impl AccessMode {
    /// Extracts the access mode from open flags.
    pub fn from_flags(flags: i32) -> Self {
        match flags & libc::O_ACCMODE {
            libc::O_WRONLY => AccessMode::WriteOnly,
            libc::O_RDWR => AccessMode::ReadWrite,
            _ => AccessMode::ReadOnly,
        }
    }

    /// Returns true if the mode allows writing.
    pub fn writes(self) -> bool {
        self != AccessMode::ReadOnly
    }
}

/// One mounted library.
#[derive(Debug, Clone)]
pub struct Library {
    registry: Arc<RoomRegistry>,
}

impl Library {
    /// Creates a library for the given seed and topology.
    pub fn new(seed: impl Into<String>, cycle: Cycle) -> Self {
        Self {
            registry: RoomRegistry::new(seed, cycle),
        }
    }

    /// Returns the room registry.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Returns the root room.
    pub fn root(&self) -> Entity {
        Entity::Room(Room::new(self.registry.root(), "/"))
    }

    /// Resolves `path` from the root.
    pub fn resolve(&self, path: &str) -> FsResult<Entity> {
        resolver::resolve(self.root(), path)
    }

    /// Resolves the directory that contains `path`, and the final segment.
    fn parent_of<'p>(&self, path: &'p str) -> FsResult<(Entity, &'p str)> {
        let (parent, name) = resolver::split(path)?;
        let parent = self.resolve(&parent)?;
        if parent.as_directory().is_none() {
            return Err(FsError::NotADirectory(parent.name().to_string()));
        }
        Ok((parent, name))
    }

    /// Returns the attributes of `path`.
    pub fn getattr(&self, path: &str) -> FsResult<Stat> {
        self.resolve(path)?.stat()
    }

    /// Lists `path`, including `.` and `..`.
    pub fn readdir(&self, path: &str) -> FsResult<Vec<String>> {
        debug!(path = path, "readdir");
        let entity = self.resolve(path)?;
        let dir = entity
            .as_directory()
            .ok_or_else(|| FsError::NotADirectory(path.to_string()))?;

        let mut names = vec![".".to_string(), "..".to_string()];
        names.extend(dir.list());
        Ok(names)
    }

    /// Lists the children of `path` together with their kinds.
    pub fn entries(&self, path: &str) -> FsResult<Vec<(String, EntityKind)>> {
        let entity = self.resolve(path)?;
        let dir = entity
            .as_directory()
            .ok_or_else(|| FsError::NotADirectory(path.to_string()))?;

        Ok(dir
            .list()
            .into_iter()
            .filter_map(|name| {
                let kind = dir.child(&name)?.kind();
                Some((name, kind))
            })
            .collect())
    }

    /// Checks that `path` can be opened with `mode`.
    pub fn open(&self, path: &str, mode: AccessMode) -> FsResult<Stat> {
        debug!(path = path, mode = ?mode, "open");
        let entity = self.resolve(path)?;
        let file = entity
            .as_file()
            .ok_or_else(|| FsError::IsADirectory(path.to_string()))?;

        if mode.writes() && !file.is_writeable() {
            return Err(FsError::permission_denied(format!("{} is read-only", path)));
        }
        entity.stat()
    }

    /// Creates an empty file at `path`.
    pub fn create(&self, path: &str) -> FsResult<Stat> {
        debug!(path = path, "create");
        let (parent, name) = self.parent_of(path)?;
        if let Some(dir) = parent.as_directory() {
            dir.create_file(name)?;
        }
        self.getattr(path)
    }

    /// Creates an empty directory at `path`.
    pub fn mkdir(&self, path: &str) -> FsResult<Stat> {
        debug!(path = path, "mkdir");
        let (parent, name) = self.parent_of(path)?;
        if let Some(dir) = parent.as_directory() {
            dir.create_directory(name)?;
        }
        self.getattr(path)
    }

    /// Reads up to `size` bytes at `offset`.
    ///
    /// The read is clamped to the end of the file; reading at or past the
    /// end returns no bytes.
    pub fn read(&self, path: &str, size: usize, offset: u64) -> FsResult<Vec<u8>> {
        debug!(path = path, size = size, offset = offset, "read");
        let entity = self.resolve(path)?;
        let file = entity
            .as_file()
            .ok_or_else(|| FsError::IsADirectory(path.to_string()))?;
        file.read_at(offset, size)
    }

    /// Writes `data` at `offset`, returning the number of bytes written.
    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> FsResult<usize> {
        debug!(path = path, size = data.len(), offset = offset, "write");
        let entity = self.resolve(path)?;
        let file = entity
            .as_file()
            .ok_or_else(|| FsError::IsADirectory(path.to_string()))?;

        if !file.is_writeable() {
            return Err(FsError::permission_denied(format!("{} is read-only", path)));
        }
        file.write(data, offset)
    }

    /// Sets the length of the file at `path`.
    pub fn truncate(&self, path: &str, size: u64) -> FsResult<Stat> {
        debug!(path = path, size = size, "truncate");
        let entity = self.resolve(path)?;
        let file = entity
            .as_file()
            .ok_or_else(|| FsError::IsADirectory(path.to_string()))?;
        file.truncate(size)?;
        entity.stat()
    }

    /// Deletes the file at `path`.
    pub fn unlink(&self, path: &str) -> FsResult<()> {
        debug!(path = path, "unlink");
        let (parent, name) = self.parent_of(path)?;
        match parent.as_directory() {
            Some(dir) => dir.delete_file(name),
            None => Err(FsError::NotADirectory(parent.name().to_string())),
        }
    }

    /// Deletes the directory at `path`.
    pub fn rmdir(&self, path: &str) -> FsResult<()> {
        debug!(path = path, "rmdir");
        let (parent, name) = self.parent_of(path)?;
        match parent.as_directory() {
            Some(dir) => dir.delete_directory(name),
            None => Err(FsError::NotADirectory(parent.name().to_string())),
        }
    }

    /// Moves the entity at `from` into the parent directory of `to`.
    pub fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        debug!(from = from, to = to, "rename");
        let entity = self.resolve(from)?;
        let (parent, name) = self.parent_of(to)?;
        entity.relocate(&parent, name)
    }
}
