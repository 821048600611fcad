//! Babylon Core - deterministic primitives for the BabylonFS library.
//!
//! This crate provides:
//! - The seeded content generator used for every book name and book body
//! - Room graph topology (unbounded line or fixed-size ring)
//! - Identifier types and the fixed layout of a room

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod generator;
pub mod identifiers;
pub mod topology;

pub use generator::{generate, generate_range, ALPHABET};
pub use identifiers::*;
pub use topology::{Cycle, Neighbors};

/// Number of bookcases standing in every room.
pub const BOOKCASES_PER_ROOM: u8 = 4;

/// Number of shelves in every bookcase.
pub const SHELVES_PER_BOOKCASE: u8 = 5;

/// Number of books generated onto every shelf.
pub const BOOKS_PER_SHELF: usize = 32;

/// Length of a generated book name, in symbols.
pub const BOOK_NAME_LEN: usize = 16;

/// Size of every book in bytes (1 MiB).
pub const BOOK_SIZE: u64 = 1024 * 1024;

/// Largest size a note may grow to (64 MiB).
pub const MAX_NOTE_SIZE: u64 = 64 * 1024 * 1024;
