//! Per-class method tables for the `lineage` runtime.
//!
//! A [`MethodTable`] maps slot hashes to [`MethodEntry`] records. Each class
//! owns exactly one table, built lazily on first instantiation and immutable
//! afterwards (see [`Class::method_table`](crate::runtime::class::Class::method_table)).
//!
//! The build protocol mirrors the layout convention for instances: a
//! descendant's table starts as a copy of its ancestor's finished table, and
//! the descendant's own declarations and overrides are applied on top. After
//! the build, every entry holds the imp of the most-derived class in the
//! chain that declared or overrode the slot.

use crate::runtime::class::{Class, Imp};
use crate::runtime::slot::Slot;
use fxhash::FxHashMap;
use std::fmt;

/// One resolved slot in a class's method table.
///
/// `declared_in` is the root-most class that introduced the slot; it fixes
/// the static type of the receiver passed to the imp. `owner` is the
/// most-derived class whose implementation is currently installed. For a
/// never-overridden slot the two are the same class.
#[derive(Clone, Copy, Debug)]
pub struct MethodEntry {
    /// The slot this entry resolves.
    pub slot: Slot,
    /// Number of arguments the slot takes (fixed at declaration).
    pub arity: usize,
    /// The installed implementation.
    pub imp: Imp,
    /// The class that introduced the slot.
    pub declared_in: Class,
    /// The most-derived class that declared or overrode the slot.
    pub owner: Class,
}

/// The method table singleton of one class.
///
/// Immutable once published: the runtime only mutates a table inside the
/// one-time build step, before any reference to it escapes.
#[derive(Clone)]
pub struct MethodTable {
    slots: FxHashMap<u64, MethodEntry>,
}

impl MethodTable {
    pub(crate) fn new() -> Self {
        MethodTable { slots: FxHashMap::default() }
    }

    /// Looks up the entry for a slot.
    #[must_use]
    pub fn get(&self, slot: &Slot) -> Option<&MethodEntry> {
        self.slots.get(&slot.hash())
    }

    /// Returns the number of slots in the table, inherited ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over all entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = &MethodEntry> {
        self.slots.values()
    }

    /// Installs a newly declared slot. Build-time only.
    pub(crate) fn declare(&mut self, entry: MethodEntry) {
        debug_assert!(
            !self.slots.contains_key(&entry.slot.hash()),
            "declared slot already present; register() validation missed it"
        );
        self.slots.insert(entry.slot.hash(), entry);
    }

    /// Replaces the imp of an inherited slot, keeping its shape
    /// (`declared_in`, arity). Build-time only.
    pub(crate) fn apply_override(&mut self, slot: Slot, imp: Imp, owner: Class) {
        debug_assert!(
            self.slots.contains_key(&slot.hash()),
            "override of unknown slot; register() validation missed it"
        );
        if let Some(entry) = self.slots.get_mut(&slot.hash()) {
            entry.imp = imp;
            entry.owner = owner;
        }
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots: Vec<&str> =
            self.slots.values().map(|e| e.slot.name()).collect();
        slots.sort_unstable();
        f.debug_struct("MethodTable").field("slots", &slots).finish()
    }
}
