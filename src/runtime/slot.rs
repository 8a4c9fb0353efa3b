//! Method slot names for the `lineage` runtime.
//!
//! A [`Slot`] identifies one entry in a class's method table. The name's
//! 64-bit hash is computed once at creation time so that table lookups and
//! comparisons never re-hash the string.
//!
//! Slot names are `&'static str` by design: a slot is part of a class's
//! declared shape, not per-instance data.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A method-slot name with a precomputed hash.
///
/// Two slots are equal when their names are equal; the hash is a
/// lookup-acceleration detail.
///
/// # Example
///
/// ```rust
/// use lineage::Slot;
///
/// let a = Slot::new("set_speed");
/// let b = Slot::new("set_speed");
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "set_speed");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Slot {
    name: &'static str,
    hash: u64,
}

impl Slot {
    /// Creates a slot for the given name, hashing it once.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Slot { name, hash: fxhash::hash64(name) }
    }

    /// Returns the slot name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the precomputed hash of the slot name.
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        // Hash first: cheap rejection for the common non-equal case.
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for Slot {}

impl Hash for Slot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
