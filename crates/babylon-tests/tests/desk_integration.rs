//! Desk integration tests.
//!
//! Tests for the mutable parts of a room:
//! - Taking books to the desk and returning them
//! - Notes and baskets
//! - Structural immutability of rooms, bookcases and shelves

use babylon_core::{BOOKS_PER_SHELF, BOOK_SIZE, MAX_NOTE_SIZE};
use babylon_fs::{AccessMode, FsError};
use babylon_tests::{init_tracing, TestLibrary};

#[test]
fn test_take_and_return_book() {
    init_tracing();

    let lib = TestLibrary::new("reading");
    let name = lib.first_book("/b2/1").unwrap();
    let on_shelf = format!("/b2/1/{}", name);
    let on_desk = format!("/desk/{}", name);
    let content = lib.cat(&on_shelf).unwrap();

    lib.mv(&on_shelf, &on_desk).unwrap();
    assert!(!lib.exists(&on_shelf));
    assert_eq!(lib.ls("/b2/1").unwrap().len(), BOOKS_PER_SHELF - 1);
    assert_eq!(lib.ls("/desk").unwrap(), vec![name.clone()]);
    assert_eq!(lib.cat(&on_desk).unwrap(), content);

    lib.mv(&on_desk, &on_shelf).unwrap();
    assert!(lib.exists(&on_shelf));
    assert!(lib.ls("/desk").unwrap().is_empty());
    assert_eq!(lib.ls("/b2/1").unwrap().len(), BOOKS_PER_SHELF);
}

#[test]
fn test_book_keeps_its_name() {
    let lib = TestLibrary::new("names");
    let name = lib.first_book("/b0/0").unwrap();

    lib.mv(&format!("/b0/0/{}", name), "/desk/renamed").unwrap();
    assert!(lib.exists(&format!("/desk/{}", name)));
    assert!(!lib.exists("/desk/renamed"));
}

#[test]
fn test_book_returns_only_to_its_shelf() {
    let lib = TestLibrary::new("strict");
    let name = lib.first_book("/b1/1").unwrap();
    let on_desk = format!("/desk/{}", name);
    lib.mv(&format!("/b1/1/{}", name), &on_desk).unwrap();

    let other_shelf = format!("/b1/2/{}", name);
    assert!(matches!(lib.mv(&on_desk, &other_shelf), Err(FsError::InvalidArgument(_))));
    assert!(lib.exists(&on_desk));
    assert_eq!(lib.ls("/b1/2").unwrap().len(), BOOKS_PER_SHELF);
}

#[test]
fn test_book_stays_in_its_room() {
    let lib = TestLibrary::new("rooms");
    let name = lib.first_book("/b3/0").unwrap();
    let on_shelf = format!("/b3/0/{}", name);

    // Another room's desk and the same shelf of another room
    assert!(matches!(
        lib.mv(&on_shelf, &format!("/k1/desk/{}", name)),
        Err(FsError::InvalidArgument(_))
    ));

    let on_desk = format!("/desk/{}", name);
    lib.mv(&on_shelf, &on_desk).unwrap();
    assert!(matches!(
        lib.mv(&on_desk, &format!("/k1/b3/0/{}", name)),
        Err(FsError::InvalidArgument(_))
    ));
    assert!(lib.exists(&on_desk));
    assert!(lib.ls("/k1/desk").unwrap().is_empty());
}

#[test]
fn test_desk_state_survives_walking_away() {
    let lib = TestLibrary::new("memory");
    lib.library().create("/k1/desk/reminder").unwrap();
    lib.library().write("/k1/desk/reminder", b"come back", 0).unwrap();

    // Walk away and come back from the other side
    lib.ls("/k1/k2/k3").unwrap();
    assert_eq!(lib.cat("/k1/k2/k1/desk/reminder").unwrap(), b"come back");
}

#[test]
fn test_note_lifecycle() {
    let lib = TestLibrary::new("notes");
    let fs = lib.library();

    let stat = fs.create("/desk/todo").unwrap();
    assert_eq!(stat.size, 0);
    assert_eq!(stat.perm, 0o644);

    assert_eq!(fs.write("/desk/todo", b"AB", 5).unwrap(), 2);
    assert_eq!(lib.cat("/desk/todo").unwrap(), b"\0\0\0\0\0AB");
    assert_eq!(fs.getattr("/desk/todo").unwrap().size, 7);

    fs.write("/desk/todo", b"xyz", 0).unwrap();
    assert_eq!(lib.cat("/desk/todo").unwrap(), b"xyz\0\0AB");

    fs.truncate("/desk/todo", 2).unwrap();
    assert_eq!(lib.cat("/desk/todo").unwrap(), b"xy");

    fs.unlink("/desk/todo").unwrap();
    assert!(!lib.exists("/desk/todo"));
    assert!(matches!(fs.unlink("/desk/todo"), Err(FsError::InvalidArgument(_))));
}

#[test]
fn test_baskets() {
    let lib = TestLibrary::new("baskets");
    let fs = lib.library();

    assert!(fs.mkdir("/desk/inbox").unwrap().is_dir());
    fs.create("/desk/inbox/letter").unwrap();
    fs.write("/desk/inbox/letter", b"dear reader", 0).unwrap();
    assert_eq!(lib.ls("/desk/inbox").unwrap(), vec!["letter"]);

    // Baskets do not nest
    assert!(matches!(fs.mkdir("/desk/inbox/sub"), Err(FsError::PermissionDenied(_))));

    // Move the note out to the desk and back under a new name
    lib.mv("/desk/inbox/letter", "/desk/letter").unwrap();
    assert!(lib.ls("/desk/inbox").unwrap().is_empty());
    lib.mv("/desk/letter", "/desk/inbox/answered").unwrap();
    assert_eq!(lib.cat("/desk/inbox/answered").unwrap(), b"dear reader");

    lib.mv("/desk/inbox", "/desk/archive").unwrap();
    assert!(lib.exists("/desk/archive/answered"));

    fs.rmdir("/desk/archive").unwrap();
    assert!(!lib.exists("/desk/archive"));
}

#[test]
fn test_desk_listing_order() {
    let lib = TestLibrary::new("order");
    let fs = lib.library();
    let book = lib.first_book("/b0/0").unwrap();

    lib.mv(&format!("/b0/0/{}", book), &format!("/desk/{}", book)).unwrap();
    fs.mkdir("/desk/basket").unwrap();
    fs.create("/desk/note").unwrap();

    assert_eq!(lib.ls("/desk").unwrap(), vec!["note".to_string(), "basket".to_string(), book]);
}

#[test]
fn test_duplicate_names_rejected() {
    let lib = TestLibrary::new("duplicates");
    let fs = lib.library();

    fs.create("/desk/a").unwrap();
    fs.mkdir("/desk/b").unwrap();
    assert!(matches!(fs.create("/desk/a"), Err(FsError::InvalidArgument(_))));
    assert!(matches!(fs.mkdir("/desk/a"), Err(FsError::InvalidArgument(_))));
    assert!(matches!(fs.create("/desk/b"), Err(FsError::InvalidArgument(_))));

    fs.create("/desk/c").unwrap();
    assert!(matches!(lib.mv("/desk/c", "/desk/a"), Err(FsError::InvalidArgument(_))));
    assert!(lib.exists("/desk/c"));

    // A taken book claims its name on the desk
    let taken = lib.first_book("/b0/0").unwrap();
    lib.mv(&format!("/b0/0/{}", taken), &format!("/desk/{}", taken)).unwrap();
    let on_desk = format!("/desk/{}", taken);
    assert!(matches!(fs.create(&on_desk), Err(FsError::InvalidArgument(_))));
    assert!(matches!(fs.mkdir(&on_desk), Err(FsError::InvalidArgument(_))));
    assert!(matches!(lib.mv("/desk/c", &on_desk), Err(FsError::InvalidArgument(_))));
    assert!(lib.is_book(&on_desk));
}

#[test]
fn test_book_cannot_land_on_a_note() {
    init_tracing();

    let lib = TestLibrary::new("collision");
    let fs = lib.library();
    let name = lib.first_book("/b1/0").unwrap();
    let on_shelf = format!("/b1/0/{}", name);
    let on_desk = format!("/desk/{}", name);

    fs.create(&on_desk).unwrap();
    assert!(matches!(lib.mv(&on_shelf, &on_desk), Err(FsError::InvalidArgument(_))));
    assert!(lib.exists(&on_shelf));
    assert_eq!(lib.ls("/b1/0").unwrap().len(), BOOKS_PER_SHELF);
    assert_eq!(lib.ls("/desk").unwrap(), vec![name.clone()]);
    assert!(!lib.is_book(&on_desk));

    // Once the note is gone the book can be taken and returned
    fs.unlink(&on_desk).unwrap();
    lib.mv(&on_shelf, &on_desk).unwrap();
    lib.mv(&on_desk, &on_shelf).unwrap();
    assert_eq!(lib.ls("/b1/0").unwrap().len(), BOOKS_PER_SHELF);
}

#[test]
fn test_huge_note_offsets_rejected() {
    let lib = TestLibrary::new("bounded");
    let fs = lib.library();
    fs.create("/desk/n").unwrap();

    let far = i64::MAX as u64 - 8;
    assert!(matches!(fs.write("/desk/n", b"x", far), Err(FsError::FileTooLarge(_))));
    assert!(matches!(fs.truncate("/desk/n", far), Err(FsError::FileTooLarge(_))));
    assert!(matches!(
        fs.truncate("/desk/n", MAX_NOTE_SIZE + 1),
        Err(FsError::FileTooLarge(_))
    ));
    assert_eq!(fs.getattr("/desk/n").unwrap().size, 0);
}

#[test]
fn test_mkdir_is_not_recursive() {
    let lib = TestLibrary::new("recursive");
    assert!(matches!(
        lib.library().mkdir("/desk/a/b"),
        Err(FsError::NotFound(_))
    ));
    assert!(!lib.exists("/desk/a"));
}

#[test]
fn test_structure_is_immutable() {
    init_tracing();

    let lib = TestLibrary::new("stone");
    let fs = lib.library();

    assert!(matches!(fs.mkdir("/extra"), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.create("/b0/extra"), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.create("/b0/0/extra"), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.rmdir("/b0"), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.rmdir("/desk"), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.rmdir("/k1"), Err(FsError::PermissionDenied(_))));

    let book = format!("/b0/0/{}", lib.first_book("/b0/0").unwrap());
    assert!(matches!(fs.unlink(&book), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.write(&book, b"graffiti", 0), Err(FsError::PermissionDenied(_))));
    assert!(matches!(fs.open(&book, AccessMode::ReadWrite), Err(FsError::PermissionDenied(_))));
    assert_eq!(fs.open(&book, AccessMode::ReadOnly).unwrap().size, BOOK_SIZE);

    // Moving a bookcase or shelf is allowed only in place
    lib.mv("/b0", "/b0").unwrap();
    lib.mv("/b0/3", "/b0/3").unwrap();
    assert!(matches!(lib.mv("/b0", "/desk/b0"), Err(FsError::InvalidArgument(_))));
    assert!(matches!(lib.mv("/b0/3", "/b1/3"), Err(FsError::InvalidArgument(_))));
    assert!(matches!(lib.mv("/desk", "/k1/desk"), Err(FsError::PermissionDenied(_))));
    assert_eq!(lib.ls("/b0").unwrap(), vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn test_directories_reject_file_operations() {
    let lib = TestLibrary::new("kinds");
    let fs = lib.library();
    assert!(matches!(fs.read("/b0", 10, 0), Err(FsError::IsADirectory(_))));
    assert!(matches!(fs.open("/desk", AccessMode::ReadOnly), Err(FsError::IsADirectory(_))));

    fs.create("/desk/note").unwrap();
    assert!(matches!(fs.readdir("/desk/note"), Err(FsError::NotADirectory(_))));
    assert!(matches!(fs.getattr("/desk/note/x"), Err(FsError::NotADirectory(_))));
}
