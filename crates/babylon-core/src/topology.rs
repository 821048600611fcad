//! Room graph topology.
//!
//! Rooms form either an unbounded line (`..., -1, 0, 1, ...`) or a ring of
//! fixed size. The topology only computes indices; rooms themselves are
//! created lazily by the registry.

use std::fmt;
use std::num::NonZeroU32;

use crate::identifiers::RoomIndex;

/// Shape of the room graph, fixed at mount time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cycle {
    /// Infinite line; neighbor indices never wrap.
    #[default]
    Unbounded,
    /// Ring of the given number of rooms, indexed `0..n`.
    Ring(NonZeroU32),
}

/// Left and right neighbor indices of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    /// Index reached through the left-hand door
    pub left: RoomIndex,
    /// Index reached through the right-hand door
    pub right: RoomIndex,
}

impl Cycle {
    /// Builds a cycle from a configured ring size.
    ///
    /// Absent, zero and negative sizes all mean an unbounded line.
    pub fn from_size(size: Option<i64>) -> Self {
        size.and_then(|n| u32::try_from(n).ok())
            .and_then(NonZeroU32::new)
            .map_or(Cycle::Unbounded, Cycle::Ring)
    }

    /// Returns the ring size, or `None` for an unbounded line.
    pub fn ring_size(self) -> Option<u32> {
        match self {
            Cycle::Unbounded => None,
            Cycle::Ring(n) => Some(n.get()),
        }
    }

    /// Returns true if `index` names a room that can exist under this topology.
    pub fn contains(self, index: RoomIndex) -> bool {
        match self {
            Cycle::Unbounded => true,
            Cycle::Ring(n) => (0..i64::from(n.get())).contains(&index),
        }
    }

    /// Computes the neighbors of `index`.
    ///
    /// On a ring the first room's left neighbor is the last room and the
    /// last room's right neighbor is the first. A ring of one room is its
    /// own neighbor on both sides.
    pub fn neighbors(self, index: RoomIndex) -> Neighbors {
        match self {
            Cycle::Unbounded => Neighbors {
                left: index - 1,
                right: index + 1,
            },
            Cycle::Ring(n) => {
                let n = i64::from(n.get());
                Neighbors {
                    left: (index - 1).rem_euclid(n),
                    right: (index + 1).rem_euclid(n),
                }
            }
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cycle::Unbounded => write!(f, "unbounded"),
            Cycle::Ring(n) => write!(f, "ring({})", n),
        }
    }
}
