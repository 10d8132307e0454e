//! Stable node identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable 64-bit identifier, unique within its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(u64);

impl Id {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Monotonic id generator owned by a single container.
///
/// Ids are never reused, so an id recorded in a diff or an undo snapshot
/// always refers to the same logical node.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Creates a generator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn generate(&mut self) -> Id {
        let id = Id(self.next);
        self.next += 1;
        id
    }

    /// Makes sure `id` will never be generated in the future.
    pub fn reserve(&mut self, id: Id) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }

    pub fn peek(&self) -> Id {
        Id(self.next)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
