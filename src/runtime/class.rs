//! Class declaration and the lazy vtable build protocol.
//!
//! This module implements the class system:
//! - class registration with a process-wide registry
//! - single inheritance (a class has at most one ancestor)
//! - slot declaration and override recording
//! - the one-time, ancestor-first method-table build
//!
//! # Architecture
//!
//! Classes are globally registered and never deallocated:
//! - each class name maps to exactly one `ClassInner`
//! - class metadata has `'static` lifetime (leaked at registration)
//! - immutable after registration; the method table is filled in exactly
//!   once, lazily, on first instantiation
//!
//! The ancestor relation is a simple chain. Cycles are impossible by
//! construction: an ancestor must already be registered, under a name that
//! the registry guarantees is distinct from the new class's.
//!
//! # Thread Safety
//!
//! The registry is protected by an `RwLock` and supports concurrent
//! registration. Each class's method table lives in a `OnceLock`: concurrent
//! first instantiations of the same class race benignly: one thread builds,
//! the others block and then observe the identical singleton.

use crate::error::{Error, Result};
use crate::runtime::dispatch::{MethodArgs, ObjectRef};
use crate::runtime::slot::Slot;
use crate::runtime::table::{MethodEntry, MethodTable};
use fxhash::FxHashMap;
use log::debug;
use std::any::Any;
use std::fmt;
use std::sync::{OnceLock, RwLock};

/// Method implementation function pointer type.
///
/// The receiver is viewed at the slot's *declaring* class, not at the class
/// that installed the override. An override that needs its own level's state
/// reaches it through a checked
/// [`downcast`](crate::runtime::dispatch::ObjectRef::downcast), the same way
/// the declaring-class view was reached by the caller's up-cast.
pub type Imp =
    fn(recv: &mut ObjectRef<'_>, args: &MethodArgs<'_>) -> Result<Option<i64>>;

/// Per-level initialization routine.
///
/// Receives the config for this level only and produces this level's state
/// block. Runs ancestor-first during construction.
pub type InitFn = fn(cfg: &dyn Any) -> Result<Box<dyn Any>>;

/// Per-level deinitialization routine.
///
/// Must release anything the state block references but not the block
/// itself; the runtime releases the block right after. Runs descendant-first
/// during destruction.
pub type DeinitFn = fn(state: &mut dyn Any);

/// Default init for classes that declare no per-level state.
fn default_init(_cfg: &dyn Any) -> Result<Box<dyn Any>> {
    Ok(Box::new(()))
}

/// Internal class data, leaked at registration and alive for the whole
/// process.
pub(crate) struct ClassInner {
    name: String,
    ancestor: Option<&'static ClassInner>,
    /// Chain depth: 0 for a root class.
    depth: usize,
    init: InitFn,
    deinit: Option<DeinitFn>,
    /// Slots this class introduces: (slot, arity, imp).
    declared: Vec<(Slot, usize, Imp)>,
    /// Inherited slots this class replaces: (slot, imp).
    overrides: Vec<(Slot, Imp)>,
    /// The method-table singleton, built once on first instantiation.
    table: OnceLock<MethodTable>,
}

impl ClassInner {
    fn declares(&self, slot: &Slot) -> bool {
        self.declared.iter().any(|(s, _, _)| s == slot)
    }

    /// Whether this class or any ancestor introduces the slot.
    fn chain_declares(&self, slot: &Slot) -> bool {
        let mut current = Some(self);
        while let Some(inner) = current {
            if inner.declares(slot) {
                return true;
            }
            current = inner.ancestor;
        }
        false
    }
}

/// Global class registry: class name -> leaked class data.
static REGISTRY: OnceLock<RwLock<FxHashMap<String, &'static ClassInner>>> =
    OnceLock::new();

fn registry() -> &'static RwLock<FxHashMap<String, &'static ClassInner>> {
    REGISTRY.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// A handle to a registered class.
///
/// `Class` is a copyable reference to metadata with `'static` lifetime;
/// cloning or copying it never duplicates the class. Two handles are equal
/// exactly when they refer to the same registration.
///
/// # Example
///
/// ```rust
/// use lineage::Class;
///
/// let root = Class::builder("DocRoot").register().unwrap();
/// let child = Class::builder("DocChild").extends(&root).register().unwrap();
///
/// assert!(child.is_descendant_of(&root));
/// assert_eq!(child.depth(), 1);
/// ```
#[derive(Clone, Copy)]
pub struct Class {
    pub(crate) inner: &'static ClassInner,
}

impl Class {
    /// Starts declaring a class with the given name.
    #[must_use]
    pub fn builder(name: &str) -> ClassBuilder {
        ClassBuilder {
            name: name.to_string(),
            ancestor: None,
            init: None,
            deinit: None,
            declared: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Looks up a registered class by name.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Class> {
        let classes = registry().read().unwrap();
        classes.get(name).map(|&inner| Class { inner })
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the direct ancestor, or `None` for a root class.
    #[must_use]
    pub fn ancestor(&self) -> Option<Class> {
        self.inner.ancestor.map(|inner| Class { inner })
    }

    /// Returns the chain depth: 0 for a root class, 1 for its direct
    /// descendants, and so on.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Returns whether this class is `other` or descends from it.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Class) -> bool {
        let mut current = Some(*self);
        while let Some(class) = current {
            if class == *other {
                return true;
            }
            current = class.ancestor();
        }
        false
    }

    /// Returns the ancestor chain root-first, ending with this class.
    #[must_use]
    pub fn chain(&self) -> Vec<Class> {
        let mut chain = Vec::with_capacity(self.depth() + 1);
        let mut current = Some(*self);
        while let Some(class) = current {
            chain.push(class);
            current = class.ancestor();
        }
        chain.reverse();
        chain
    }

    /// Returns the class at the given depth of this class's chain, or
    /// `None` when `depth` exceeds this class's own.
    #[must_use]
    pub fn at_depth(&self, depth: usize) -> Option<Class> {
        if depth > self.depth() {
            return None;
        }
        let mut current = *self;
        while current.depth() > depth {
            current = current.ancestor()?;
        }
        Some(current)
    }

    /// Returns the class's method-table singleton, building it on first
    /// use.
    ///
    /// The build runs at most once per class. Concurrent callers during the
    /// first build block until it completes and then all observe the same
    /// table. Building a class's table forces its ancestor's table first, so
    /// by the time any table is visible, every inherited slot already holds
    /// the most-derived implementation at or below this class.
    #[must_use]
    pub fn method_table(&self) -> &'static MethodTable {
        self.inner.table.get_or_init(|| self.build_table())
    }

    /// The vtable build protocol: ancestor's contribution first, own slot
    /// assignments on top.
    fn build_table(&self) -> MethodTable {
        let mut table = match self.ancestor() {
            Some(ancestor) => ancestor.method_table().clone(),
            None => MethodTable::new(),
        };

        for &(slot, arity, imp) in &self.inner.declared {
            table.declare(MethodEntry {
                slot,
                arity,
                imp,
                declared_in: *self,
                owner: *self,
            });
        }
        for &(slot, imp) in &self.inner.overrides {
            table.apply_override(slot, imp, *self);
        }

        debug!(
            "built method table for `{}`: {} slots",
            self.name(),
            table.len()
        );
        table
    }

    pub(crate) fn init_fn(&self) -> InitFn {
        self.inner.init
    }

    pub(crate) fn deinit_fn(&self) -> Option<DeinitFn> {
        self.inner.deinit
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        // Registry guarantees one ClassInner per name.
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ancestor = self.ancestor().map(|c| c.name().to_string());
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("ancestor", &ancestor)
            .finish()
    }
}

/// Builder for declaring a class: config/state shape (via `init`/`deinit`),
/// method-table shape (via `slot`/`override_slot`), and at most one
/// ancestor.
///
/// # Example
///
/// ```rust
/// use lineage::{Class, MethodArgs, ObjectRef, Result, Slot};
///
/// fn ping(_recv: &mut ObjectRef<'_>, _args: &MethodArgs<'_>) -> Result<Option<i64>> {
///     Ok(Some(1))
/// }
///
/// let class = Class::builder("DocPinger")
///     .slot(Slot::new("ping"), 0, ping)
///     .register()
///     .unwrap();
///
/// assert!(class.method_table().get(&Slot::new("ping")).is_some());
/// ```
pub struct ClassBuilder {
    name: String,
    ancestor: Option<Class>,
    init: Option<InitFn>,
    deinit: Option<DeinitFn>,
    declared: Vec<(Slot, usize, Imp)>,
    overrides: Vec<(Slot, Imp)>,
}

impl ClassBuilder {
    /// Sets the direct ancestor. A class extends at most one other class.
    #[must_use]
    pub fn extends(mut self, ancestor: &Class) -> Self {
        self.ancestor = Some(*ancestor);
        self
    }

    /// Sets the per-level initialization routine. Classes without one get
    /// a unit state block.
    #[must_use]
    pub fn init(mut self, init: InitFn) -> Self {
        self.init = Some(init);
        self
    }

    /// Sets the per-level deinitialization routine.
    #[must_use]
    pub fn deinit(mut self, deinit: DeinitFn) -> Self {
        self.deinit = Some(deinit);
        self
    }

    /// Declares a new slot with a fixed arity and this class's
    /// implementation.
    #[must_use]
    pub fn slot(mut self, slot: Slot, arity: usize, imp: Imp) -> Self {
        self.declared.push((slot, arity, imp));
        self
    }

    /// Replaces the implementation of a slot declared by an ancestor. The
    /// slot keeps its declaring class and arity.
    #[must_use]
    pub fn override_slot(mut self, slot: Slot, imp: Imp) -> Self {
        self.overrides.push((slot, imp));
        self
    }

    /// Validates the declaration and registers the class.
    ///
    /// # Errors
    ///
    /// - [`Error::ClassAlreadyExists`] if the name is taken
    /// - [`Error::DuplicateSlot`] if a slot appears twice in this declaration
    /// - [`Error::ShadowedSlot`] if a new slot collides with an inherited one
    /// - [`Error::UnknownOverride`] if an override targets a slot no
    ///   ancestor declares
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn register(self) -> Result<Class> {
        self.validate_slots()?;

        let registry = registry();

        // Fast rejection without taking the write lock.
        {
            let classes = registry.read().unwrap();
            if classes.contains_key(&self.name) {
                return Err(Error::ClassAlreadyExists { name: self.name });
            }
        }

        let depth = self.ancestor.map_or(0, |a| a.depth() + 1);
        let inner = ClassInner {
            name: self.name.clone(),
            ancestor: self.ancestor.map(|a| a.inner),
            depth,
            init: self.init.unwrap_or(default_init),
            deinit: self.deinit,
            declared: self.declared,
            overrides: self.overrides,
            table: OnceLock::new(),
        };

        // Leak only after the duplicate re-check passes.
        let inner: &'static ClassInner = {
            let mut classes = registry.write().unwrap();
            // Another thread may have registered the name while we built.
            if classes.contains_key(&self.name) {
                return Err(Error::ClassAlreadyExists { name: self.name });
            }
            let inner: &'static ClassInner = Box::leak(Box::new(inner));
            classes.insert(self.name.clone(), inner);
            inner
        };

        debug!("registered class `{}` (depth {depth})", self.name);
        Ok(Class { inner })
    }

    fn validate_slots(&self) -> Result<()> {
        // No slot may appear twice within one declaration, across both
        // the declared and the override lists.
        let mut seen: Vec<Slot> = Vec::new();
        let own = self
            .declared
            .iter()
            .map(|(s, _, _)| *s)
            .chain(self.overrides.iter().map(|(s, _)| *s));
        for slot in own {
            if seen.contains(&slot) {
                return Err(Error::DuplicateSlot { slot: slot.name() });
            }
            seen.push(slot);
        }

        match &self.ancestor {
            Some(ancestor) => {
                for (slot, _, _) in &self.declared {
                    if ancestor.inner.chain_declares(slot) {
                        return Err(Error::ShadowedSlot { slot: slot.name() });
                    }
                }
                for (slot, _) in &self.overrides {
                    if !ancestor.inner.chain_declares(slot) {
                        return Err(Error::UnknownOverride { slot: slot.name() });
                    }
                }
            }
            None => {
                if let Some((slot, _)) = self.overrides.first() {
                    return Err(Error::UnknownOverride { slot: slot.name() });
                }
            }
        }

        Ok(())
    }
}
