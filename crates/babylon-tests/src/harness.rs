//! Library harness for path-level integration testing.

use babylon_core::{room_entry_name, Cycle, RoomIndex, ShelfId, BOOK_SIZE};
use babylon_fs::{FsError, Library};
use tracing::info;

/// A mounted-like library driven through absolute paths.
#[derive(Debug, Clone)]
pub struct TestLibrary {
    library: Library,
}

impl TestLibrary {
    /// Creates an endless library.
    pub fn new(seed: &str) -> Self {
        Self::with_cycle(seed, Cycle::Unbounded)
    }

    /// Creates a library with the given topology.
    pub fn with_cycle(seed: &str, cycle: Cycle) -> Self {
        info!(seed = seed, cycle = %cycle, "Created test library");
        Self {
            library: Library::new(seed, cycle),
        }
    }

    /// Creates a ring of `size` rooms.
    pub fn ring(seed: &str, size: i64) -> Self {
        Self::with_cycle(seed, Cycle::from_size(Some(size)))
    }

    /// Returns the underlying library.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Lists `path` without `.` and `..`.
    pub fn ls(&self, path: &str) -> Result<Vec<String>, FsError> {
        Ok(self.library.readdir(path)?.into_iter().skip(2).collect())
    }

    /// Reads a whole file.
    pub fn cat(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let size = self.library.getattr(path)?.size;
        self.library.read(path, size as usize, 0)
    }

    /// Moves `from` to `to`.
    pub fn mv(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.library.rename(from, to)
    }

    /// Checks whether `path` resolves.
    pub fn exists(&self, path: &str) -> bool {
        self.library.getattr(path).is_ok()
    }

    /// Returns the path reached by walking `steps` rooms to the right of the
    /// root (to the left for negative steps).
    pub fn walk(&self, steps: i64) -> String {
        let mut path = String::new();
        let mut index: RoomIndex = 0;
        let forward = steps >= 0;

        for _ in 0..steps.unsigned_abs() {
            let neighbors = self.library.registry().cycle().neighbors(index);
            index = if forward { neighbors.right } else { neighbors.left };
            path.push('/');
            path.push_str(&room_entry_name(index));
        }

        if path.is_empty() {
            "/".to_string()
        } else {
            path
        }
    }

    /// Path of `shelf` inside the room at `room_path`.
    pub fn shelf_path(room_path: &str, shelf: ShelfId) -> String {
        format!(
            "{}/{}/{}",
            room_path.trim_end_matches('/'),
            shelf.bookcase.name(),
            shelf.slot_name()
        )
    }

    /// Name of the first book currently on `shelf_path`.
    pub fn first_book(&self, shelf_path: &str) -> Result<String, FsError> {
        self.ls(shelf_path)?
            .into_iter()
            .next()
            .ok_or_else(|| FsError::not_found(format!("empty shelf {}", shelf_path)))
    }

    /// Checks that `path` is a full-size book.
    pub fn is_book(&self, path: &str) -> bool {
        matches!(self.library.getattr(path), Ok(stat) if !stat.is_dir() && stat.size == BOOK_SIZE)
    }
}
