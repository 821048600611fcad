//! BabylonFS - an endless library mounted as a filesystem.
//!
//! Implements the filesystem side of the library:
//! - The entity graph (rooms, bookcases, shelves, books, desks, baskets, notes)
//! - A lazily populated room registry that keeps mutated rooms alive
//! - Path resolution and POSIX-style request dispatch
//! - FUSE bindings through `fuser`

#![warn(missing_docs, rust_2018_idioms)]

pub mod desk;
pub mod entity;
pub mod inode;
pub mod library;
pub mod mount;
pub mod ops;
pub mod registry;
pub mod resolver;
pub mod room;
pub mod vfs;

pub use entity::{Directory, Entity, EntityKind, File, Node, Stat};
pub use library::{AccessMode, Library};
pub use mount::MountConfig;
pub use registry::{NoteContainer, RoomData, RoomHandle, RoomRegistry};
pub use vfs::BabylonFilesystem;

use thiserror::Error;

/// Filesystem errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path segment or lookup target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A directory was required
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A file was required
    #[error("Is a directory: {0}")]
    IsADirectory(String),

    /// Operation is not permitted for this kind of entry
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Structurally forbidden mutation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A note would grow past its maximum size
    #[error("File too large: {0}")]
    FileTooLarge(String),

    /// Mount failed
    #[error("Mount failed: {0}")]
    Mount(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Creates a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates a PermissionDenied error.
    pub fn permission_denied(what: impl Into<String>) -> Self {
        Self::PermissionDenied(what.into())
    }

    /// Creates an InvalidArgument error.
    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidArgument(what.into())
    }

    /// Returns the POSIX error code reported to the kernel.
    pub fn errno(&self) -> libc::c_int {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::PermissionDenied(_) => libc::EACCES,
            FsError::InvalidArgument(_) => libc::EINVAL,
            FsError::FileTooLarge(_) => libc::EFBIG,
            FsError::Mount(_) => libc::EIO,
            FsError::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(FsError::not_found("x").errno(), libc::ENOENT);
        assert_eq!(FsError::NotADirectory("x".into()).errno(), libc::ENOTDIR);
        assert_eq!(FsError::IsADirectory("x".into()).errno(), libc::EISDIR);
        assert_eq!(FsError::permission_denied("x").errno(), libc::EACCES);
        assert_eq!(FsError::invalid("x").errno(), libc::EINVAL);
        assert_eq!(FsError::FileTooLarge("x".into()).errno(), libc::EFBIG);
        assert_eq!(FsError::Mount("x".into()).errno(), libc::EIO);
    }

    #[test]
    fn test_io_errno_passthrough() {
        let err = FsError::from(std::io::Error::from_raw_os_error(libc::ENOSPC));
        assert_eq!(err.errno(), libc::ENOSPC);
    }
}
