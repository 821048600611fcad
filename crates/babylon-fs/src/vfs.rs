//! FUSE bindings.
//!
//! Translates kernel requests (inode based) into library requests (path
//! based). No state is kept per open file; every request resolves its path
//! again.

use std::ffi::OsStr;
use std::time::SystemTime;

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use libc::c_int;
use tracing::{debug, info};

use crate::entity::{EntityKind, Stat};
use crate::inode::{InodeId, InodeTable};
use crate::library::{AccessMode, Library};
use crate::mount::MountConfig;
use crate::resolver;
use crate::FsError;

/// BabylonFS FUSE filesystem implementation.
pub struct BabylonFilesystem {
    /// The library being served
    library: Library,
    /// Inode table
    inodes: InodeTable,
    /// Mount configuration
    config: MountConfig,
    /// Owner reported for every entry
    uid: u32,
    gid: u32,
    /// Timestamp reported for every entry
    mounted_at: SystemTime,
}

impl BabylonFilesystem {
    /// Creates a new filesystem serving `library`.
    pub fn new(library: Library, config: MountConfig) -> Self {
        Self {
            library,
            inodes: InodeTable::new(),
            config,
            uid: 0,
            gid: 0,
            mounted_at: SystemTime::now(),
        }
    }

    /// Returns the library.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Returns the inode table.
    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    /// Converts library attributes to FUSE file attributes.
    pub fn file_attr(&self, ino: InodeId, stat: &Stat) -> FileAttr {
        let (kind, nlink) = match stat.kind {
            EntityKind::Directory => (FileType::Directory, 2),
            EntityKind::File => (FileType::RegularFile, 1),
        };

        FileAttr {
            ino: ino.0,
            size: stat.size,
            blocks: stat.size.div_ceil(512),
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: self.mounted_at,
            kind,
            perm: stat.perm,
            nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: 4096,
            flags: 0,
        }
    }

    fn path(&self, ino: u64) -> Result<String, c_int> {
        self.inodes.path(InodeId(ino)).ok_or(libc::ENOENT)
    }

    fn child_path(&self, parent: u64, name: &OsStr) -> Result<String, c_int> {
        self.inodes
            .child_path(InodeId(parent), &name.to_string_lossy())
            .ok_or(libc::ENOENT)
    }

    /// Attributes of `path`, allocating its inode.
    fn entry(&self, path: &str, stat: &Stat) -> FileAttr {
        let ino = self.inodes.assign(path);
        self.file_attr(ino, stat)
    }

    fn rejected(&self, op: &str, path: &str, e: &FsError) -> c_int {
        debug!(op = op, path = path, error = %e, "Request failed");
        e.errno()
    }
}

impl Filesystem for BabylonFilesystem {
    fn init(&mut self, req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        self.uid = req.uid();
        self.gid = req.gid();
        info!(
            uid = self.uid,
            gid = self.gid,
            seed = %self.library.registry().seed(),
            "Library ready"
        );
        Ok(())
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let path = match self.child_path(parent, name) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(parent = parent, path = %path, "lookup");

        match self.library.getattr(&path) {
            Ok(stat) => reply.entry(&self.config.ttl(), &self.entry(&path, &stat), 0),
            Err(e) => reply.error(self.rejected("lookup", &path, &e)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let path = match self.path(ino) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(ino = ino, path = %path, "getattr");

        match self.library.getattr(&path) {
            Ok(stat) => reply.attr(&self.config.ttl(), &self.file_attr(InodeId(ino), &stat)),
            Err(e) => reply.error(self.rejected("getattr", &path, &e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let path = match self.path(ino) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(ino = ino, path = %path, size = ?size, "setattr");

        // Only the size can change; timestamps and modes are fixed
        let result = match size {
            Some(size) => self.library.truncate(&path, size),
            None => self.library.getattr(&path),
        };
        match result {
            Ok(stat) => reply.attr(&self.config.ttl(), &self.file_attr(InodeId(ino), &stat)),
            Err(e) => reply.error(self.rejected("setattr", &path, &e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = match self.path(ino) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(ino = ino, path = %path, offset = offset, "readdir");

        let children = match self.library.entries(&path) {
            Ok(children) => children,
            Err(e) => return reply.error(self.rejected("readdir", &path, &e)),
        };

        let parent_ino = match resolver::split(&path) {
            Ok((parent, _)) => self.inodes.assign(&parent).0,
            Err(_) => ino,
        };

        let mut entries: Vec<(u64, FileType, String)> = vec![
            (ino, FileType::Directory, ".".to_string()),
            (parent_ino, FileType::Directory, "..".to_string()),
        ];
        for (name, kind) in children {
            let child_ino = self.inodes.assign(&resolver::join(&path, &name));
            let kind = match kind {
                EntityKind::Directory => FileType::Directory,
                EntityKind::File => FileType::RegularFile,
            };
            entries.push((child_ino.0, kind, name));
        }

        for (i, (ino, kind, name)) in entries.into_iter().enumerate().skip(offset as usize) {
            if reply.add(ino, (i + 1) as i64, kind, &name) {
                break;
            }
        }

        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let path = match self.path(ino) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(ino = ino, path = %path, flags = flags, "open");

        match self.library.open(&path, AccessMode::from_flags(flags)) {
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(self.rejected("open", &path, &e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let path = match self.path(ino) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };

        match self
            .library
            .read(&path, size as usize, offset.max(0) as u64)
        {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(self.rejected("read", &path, &e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let path = match self.path(ino) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };

        match self.library.write(&path, data, offset.max(0) as u64) {
            Ok(written) => reply.written(written as u32),
            Err(e) => reply.error(self.rejected("write", &path, &e)),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        let path = match self.child_path(parent, name) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(parent = parent, path = %path, mode = mode, "create");

        match self.library.create(&path) {
            Ok(stat) => {
                let attr = self.entry(&path, &stat);
                reply.created(&self.config.ttl(), &attr, 0, 0, 0);
            }
            Err(e) => reply.error(self.rejected("create", &path, &e)),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let path = match self.child_path(parent, name) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(parent = parent, path = %path, mode = mode, "mkdir");

        match self.library.mkdir(&path) {
            Ok(stat) => reply.entry(&self.config.ttl(), &self.entry(&path, &stat), 0),
            Err(e) => reply.error(self.rejected("mkdir", &path, &e)),
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = match self.child_path(parent, name) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(parent = parent, path = %path, "unlink");

        match self.library.unlink(&path) {
            Ok(()) => {
                self.inodes.remove(&path);
                reply.ok();
            }
            Err(e) => reply.error(self.rejected("unlink", &path, &e)),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = match self.child_path(parent, name) {
            Ok(p) => p,
            Err(errno) => return reply.error(errno),
        };
        debug!(parent = parent, path = %path, "rmdir");

        match self.library.rmdir(&path) {
            Ok(()) => {
                self.inodes.remove(&path);
                reply.ok();
            }
            Err(e) => reply.error(self.rejected("rmdir", &path, &e)),
        }
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        let (from, to) = match (self.child_path(parent, name), self.child_path(newparent, newname)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(errno), _) | (_, Err(errno)) => return reply.error(errno),
        };
        debug!(from = %from, to = %to, "rename");

        match self.library.rename(&from, &to) {
            Ok(()) => {
                // Structural renames are no-ops and books keep their name,
                // so the destination path does not always exist afterwards
                if self.library.getattr(&to).is_ok() {
                    self.inodes.rename(&from, &to);
                } else if self.library.getattr(&from).is_err() {
                    self.inodes.remove(&from);
                }
                reply.ok();
            }
            Err(e) => reply.error(self.rejected("rename", &from, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_core::{Cycle, BOOK_SIZE};

    fn filesystem() -> BabylonFilesystem {
        BabylonFilesystem::new(Library::new("test_seed", Cycle::Unbounded), MountConfig::default())
    }

    #[test]
    fn test_directory_attr() {
        let fs = filesystem();
        let attr = fs.file_attr(InodeId::ROOT, &Stat::directory());
        assert_eq!(attr.ino, 1);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.perm, 0o755);
        assert_eq!(attr.nlink, 2);
    }

    #[test]
    fn test_book_attr() {
        let fs = filesystem();
        let attr = fs.file_attr(InodeId(7), &Stat::file(BOOK_SIZE, false));
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.size, BOOK_SIZE);
        assert_eq!(attr.blocks, BOOK_SIZE / 512);
        assert_eq!(attr.perm, 0o444);
    }

    #[test]
    fn test_entry_allocates_inode() {
        let fs = filesystem();
        let stat = fs.library().getattr("/desk").unwrap();
        let attr = fs.entry("/desk", &stat);
        assert_eq!(fs.inodes().lookup("/desk"), Some(InodeId(attr.ino)));
        assert_eq!(fs.path(attr.ino).unwrap(), "/desk");
        assert_eq!(fs.path(999), Err(libc::ENOENT));
    }

    #[test]
    fn test_child_path() {
        let fs = filesystem();
        let desk = fs.inodes().assign("/desk");
        assert_eq!(
            fs.child_path(desk.0, OsStr::new("note")).unwrap(),
            "/desk/note"
        );
        assert_eq!(fs.child_path(12345, OsStr::new("x")), Err(libc::ENOENT));
    }
}
