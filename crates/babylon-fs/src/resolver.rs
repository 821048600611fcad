//! Path resolution.
//!
//! Paths are slash-separated and always start from the mount root. Empty
//! segments and `.` are ignored; every other segment must name a child of
//! the directory reached so far.

use crate::entity::Entity;
use crate::{FsError, FsResult};

/// Non-empty segments of `path`.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Splits `path` into its parent path and final segment.
pub fn split(path: &str) -> FsResult<(String, &str)> {
    let segments: Vec<&str> = components(path).collect();
    let (base, parents) = segments
        .split_last()
        .ok_or_else(|| FsError::invalid("the root has no parent"))?;
    Ok((format!("/{}", parents.join("/")), base))
}

/// Joins a directory path and an entry name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Walks `path` starting at `root`.
pub fn resolve(root: Entity, path: &str) -> FsResult<Entity> {
    let mut current = root;
    for segment in components(path) {
        let next = current
            .as_directory()
            .ok_or_else(|| FsError::NotADirectory(format!("{} in {}", current.name(), path)))?
            .child(segment);
        current = next.ok_or_else(|| FsError::not_found(format!("{} in {}", segment, path)))?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Directory;
    use crate::registry::RoomRegistry;
    use crate::room::Room;
    use babylon_core::Cycle;

    fn root() -> Entity {
        let registry = RoomRegistry::new("test_seed", Cycle::Unbounded);
        Entity::Room(Room::new(registry.root(), "/"))
    }

    #[test]
    fn test_components() {
        let parts: Vec<_> = components("//k1/./b0/").collect();
        assert_eq!(parts, vec!["k1", "b0"]);
        assert_eq!(components("/").count(), 0);
    }

    #[test]
    fn test_split() {
        let (parent, base) = split("/k1/desk/note").unwrap();
        assert_eq!(parent, "/k1/desk");
        assert_eq!(base, "note");

        let (parent, base) = split("/desk").unwrap();
        assert_eq!(parent, "/");
        assert_eq!(base, "desk");

        assert!(split("/").is_err());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "k1"), "/k1");
        assert_eq!(join("/k1", "desk"), "/k1/desk");
    }

    #[test]
    fn test_resolve() {
        assert!(matches!(resolve(root(), "/").unwrap(), Entity::Room(_)));
        assert!(matches!(resolve(root(), "/k1/k2/b3/4").unwrap(), Entity::Shelf(_)));
        assert!(matches!(resolve(root(), "/desk").unwrap(), Entity::Desk(_)));
    }

    #[test]
    fn test_resolve_errors() {
        assert!(matches!(resolve(root(), "/k5"), Err(FsError::NotFound(_))));
        assert!(matches!(resolve(root(), "/b0/9"), Err(FsError::NotFound(_))));

        let shelf = resolve(root(), "/b0/0").unwrap();
        let Entity::Shelf(shelf) = shelf else {
            panic!("not a shelf");
        };
        let book = shelf.list()[0].clone();
        let through_file = format!("/b0/0/{}/deeper", book);
        assert!(matches!(resolve(root(), &through_file), Err(FsError::NotADirectory(_))));
    }
}
