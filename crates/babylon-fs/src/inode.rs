//! Inode management for the FUSE bridge.
//!
//! The library is addressed by path while the kernel speaks inode numbers.
//! The table hands out a number the first time a path is seen and keeps the
//! mapping until the path is removed or renamed. The same room reached
//! through two different paths gets two inodes.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::resolver;

/// Inode identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeId(pub u64);

impl InodeId {
    /// Root inode ID (FUSE convention).
    pub const ROOT: InodeId = InodeId(1);
}

impl From<u64> for InodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<InodeId> for u64 {
    fn from(id: InodeId) -> u64 {
        id.0
    }
}

struct Mappings {
    paths: HashMap<InodeId, String>,
    inodes: HashMap<String, InodeId>,
    next: u64,
}

/// Bidirectional inode/path table.
pub struct InodeTable {
    inner: RwLock<Mappings>,
}

impl InodeTable {
    /// Creates a table holding only the root.
    pub fn new() -> Self {
        let mut paths = HashMap::new();
        let mut inodes = HashMap::new();
        paths.insert(InodeId::ROOT, "/".to_string());
        inodes.insert("/".to_string(), InodeId::ROOT);

        Self {
            inner: RwLock::new(Mappings {
                paths,
                inodes,
                next: InodeId::ROOT.0 + 1,
            }),
        }
    }

    /// Returns the path behind an inode.
    pub fn path(&self, id: InodeId) -> Option<String> {
        self.inner.read().paths.get(&id).cloned()
    }

    /// Returns the path of entry `name` inside directory `parent`.
    pub fn child_path(&self, parent: InodeId, name: &str) -> Option<String> {
        self.path(parent).map(|p| resolver::join(&p, name))
    }

    /// Looks up the inode of a path.
    pub fn lookup(&self, path: &str) -> Option<InodeId> {
        self.inner.read().inodes.get(path).copied()
    }

    /// Returns the inode of `path`, allocating one if needed.
    pub fn assign(&self, path: &str) -> InodeId {
        if let Some(id) = self.lookup(path) {
            return id;
        }

        let mut inner = self.inner.write();
        if let Some(id) = inner.inodes.get(path) {
            return *id;
        }
        let id = InodeId(inner.next);
        inner.next += 1;
        inner.paths.insert(id, path.to_string());
        inner.inodes.insert(path.to_string(), id);
        id
    }

    /// Forgets `path` and everything below it.
    pub fn remove(&self, path: &str) {
        if path == "/" {
            return;
        }
        let mut inner = self.inner.write();
        let gone: Vec<String> = inner
            .inodes
            .keys()
            .filter(|p| is_within(p, path))
            .cloned()
            .collect();
        for p in gone {
            if let Some(id) = inner.inodes.remove(&p) {
                inner.paths.remove(&id);
            }
        }
    }

    /// Moves `from` and everything below it to `to`, keeping inode numbers.
    pub fn rename(&self, from: &str, to: &str) {
        if from == to || from == "/" {
            return;
        }
        // Whatever the destination used to be is replaced
        self.remove(to);

        let mut inner = self.inner.write();
        let moved: Vec<(String, InodeId)> = inner
            .inodes
            .iter()
            .filter(|(p, _)| is_within(p, from))
            .map(|(p, id)| (p.clone(), *id))
            .collect();
        for (old, id) in moved {
            let new = format!("{}{}", to, &old[from.len()..]);
            inner.inodes.remove(&old);
            inner.inodes.insert(new.clone(), id);
            inner.paths.insert(id, new);
        }
    }

    /// Number of known inodes.
    pub fn len(&self) -> usize {
        self.inner.read().paths.len()
    }

    /// Returns true if only the root is known.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `path` is `dir` or lies below it.
fn is_within(path: &str, dir: &str) -> bool {
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}
