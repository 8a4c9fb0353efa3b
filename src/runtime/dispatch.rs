//! Views, casts, and method dispatch.
//!
//! An [`ObjectRef`] is a borrowed view of an [`Object`] typed at one class
//! level of the instance's chain. The view's static class decides:
//! - which slots are visible to [`invoke`](ObjectRef::invoke)
//! - which level's state [`state`](ObjectRef::state) reads
//!
//! # Casts
//!
//! Up-casts are always valid: every instance carries a well-formed view at
//! each ancestor level, so moving the view toward the root cannot fail
//! (except at the root itself, which has nowhere to go). Down-casts are
//! *checked* against the concrete-class witness the instance has carried
//! since creation; a wrong target is rejected with
//! [`Error::TypeMismatch`] instead of producing a corrupted reference.
//!
//! # Dispatch
//!
//! `invoke` reads the slot from the concrete class's method-table
//! singleton. Because that table absorbed every override in the chain when
//! it was built, the entry is always the most-derived implementation for
//! the instance's true class, regardless of the static type of the view
//! the call went through. The imp receives the receiver viewed at the
//! slot's declaring class.

use crate::error::{Error, Result};
use crate::runtime::class::Class;
use crate::runtime::object::Object;
use crate::runtime::slot::Slot;
use log::trace;
use std::any::Any;
use std::fmt;

/// Arguments for a method invocation, packed as `i64` words.
///
/// The inline variants avoid allocation for the common arities; `Many`
/// borrows a caller-owned slice.
#[derive(Clone, Copy, Debug)]
pub enum MethodArgs<'a> {
    /// No arguments.
    None,
    /// One argument.
    One([i64; 1]),
    /// Two arguments.
    Two([i64; 2]),
    /// Three or more arguments, borrowed.
    Many(&'a [i64]),
}

impl<'a> MethodArgs<'a> {
    /// No arguments.
    #[must_use]
    pub const fn none() -> Self {
        MethodArgs::None
    }

    /// One argument.
    #[must_use]
    pub const fn one(a: i64) -> Self {
        MethodArgs::One([a])
    }

    /// Two arguments.
    #[must_use]
    pub const fn two(a: i64, b: i64) -> Self {
        MethodArgs::Two([a, b])
    }

    /// An arbitrary argument list.
    #[must_use]
    pub const fn many(args: &'a [i64]) -> Self {
        MethodArgs::Many(args)
    }

    /// The arguments as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        match self {
            MethodArgs::None => &[],
            MethodArgs::One(args) => args,
            MethodArgs::Two(args) => args,
            MethodArgs::Many(args) => args,
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn count(&self) -> usize {
        self.as_slice().len()
    }

    /// The argument at `idx`, if present.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<i64> {
        self.as_slice().get(idx).copied()
    }
}

/// A borrowed view of an instance, typed at one class level.
///
/// Obtained from [`Object::as_ref`] (typed at the concrete class) and
/// re-typed with [`upcast`](ObjectRef::upcast) /
/// [`downcast`](ObjectRef::downcast). The view is the unit of dispatch:
/// method calls and state access go through it, never through the
/// instance directly.
pub struct ObjectRef<'a> {
    object: &'a mut Object,
    /// The view's static class. Always on the concrete class's chain.
    class: Class,
}

impl<'a> ObjectRef<'a> {
    pub(crate) fn new(object: &'a mut Object, class: Class) -> Self {
        debug_assert!(
            object.class().is_descendant_of(&class),
            "view class must lie on the instance's chain"
        );
        ObjectRef { object, class }
    }

    /// The static class of this view.
    #[must_use]
    pub fn class(&self) -> Class {
        self.class
    }

    /// The concrete class the underlying instance was created as.
    #[must_use]
    pub fn concrete_class(&self) -> Class {
        self.object.class()
    }

    /// Reborrows the view for a shorter lifetime, leaving this one usable
    /// afterwards.
    pub fn reborrow(&mut self) -> ObjectRef<'_> {
        ObjectRef { object: self.object, class: self.class }
    }

    /// Re-types the view at the direct ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAncestor`] if the view is already typed at a
    /// root class.
    pub fn upcast(self) -> Result<ObjectRef<'a>> {
        match self.class.ancestor() {
            Some(ancestor) => {
                Ok(ObjectRef { object: self.object, class: ancestor })
            }
            None => Err(Error::NoAncestor {
                class: self.class.name().to_string(),
            }),
        }
    }

    /// Re-types the view at `target`, which must be this view's class or
    /// one of its ancestors. Crossing several levels at once is fine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if `target` is not an ancestor of
    /// the view's class.
    pub fn upcast_to(self, target: &Class) -> Result<ObjectRef<'a>> {
        if self.class.is_descendant_of(target) {
            Ok(ObjectRef { object: self.object, class: *target })
        } else {
            Err(Error::TypeMismatch {
                expected: target.name().to_string(),
                found: self.class.name().to_string(),
            })
        }
    }

    /// Re-types the view at a descendant class, checked against the
    /// instance's concrete-class witness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if `target` does not descend from
    /// the view's class, or if the instance's concrete class does not
    /// descend from `target`, that is, when the caller's claim about the
    /// true type is wrong.
    pub fn downcast(self, target: &Class) -> Result<ObjectRef<'a>> {
        if !target.is_descendant_of(&self.class) {
            return Err(Error::TypeMismatch {
                expected: target.name().to_string(),
                found: self.class.name().to_string(),
            });
        }
        if !self.object.class().is_descendant_of(target) {
            return Err(Error::TypeMismatch {
                expected: target.name().to_string(),
                found: self.object.class().name().to_string(),
            });
        }
        Ok(ObjectRef { object: self.object, class: *target })
    }

    /// Reads this view level's state block as `S`.
    ///
    /// A view only sees the state of its own level; deeper levels are
    /// reached by down-casting first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateMismatch`] if the level's state is not an `S`.
    pub fn state<S: Any>(&self) -> Result<&S> {
        self.object
            .state_at(self.class.depth())
            .and_then(|state| state.downcast_ref::<S>())
            .ok_or_else(|| Error::StateMismatch {
                class: self.class.name().to_string(),
            })
    }

    /// Mutable access to this view level's state block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateMismatch`] if the level's state is not an `S`.
    pub fn state_mut<S: Any>(&mut self) -> Result<&mut S> {
        let class = self.class;
        self.object
            .state_at_mut(class.depth())
            .and_then(|state| state.downcast_mut::<S>())
            .ok_or_else(|| Error::StateMismatch {
                class: class.name().to_string(),
            })
    }

    /// Invokes a slot through this view.
    ///
    /// The slot must be visible at the view's static class. The
    /// implementation that runs is the most-derived one for the
    /// instance's concrete class; the imp receives the receiver viewed at
    /// the slot's declaring class.
    ///
    /// # Errors
    ///
    /// - [`Error::SlotNotFound`] if the view's class does not know the slot
    /// - [`Error::ArityMismatch`] if `args` does not match the declared
    ///   arity
    /// - any error the implementation returns
    pub fn invoke(
        &mut self,
        slot: &Slot,
        args: &MethodArgs<'_>,
    ) -> Result<Option<i64>> {
        // Visibility is decided by the view's static class.
        if self.class.method_table().get(slot).is_none() {
            return Err(Error::SlotNotFound { slot: slot.name() });
        }

        // The concrete singleton already absorbed every override in the
        // chain, so this entry is the most-derived implementation.
        let entry = self
            .object
            .class()
            .method_table()
            .get(slot)
            .copied()
            .ok_or(Error::SlotNotFound { slot: slot.name() })?;

        if args.count() != entry.arity {
            return Err(Error::ArityMismatch {
                slot: slot.name(),
                expected: entry.arity,
                got: args.count(),
            });
        }

        trace!(
            "dispatch `{}` on `{}` via `{}` -> `{}`",
            slot.name(),
            self.object.class().name(),
            self.class.name(),
            entry.owner.name()
        );

        let mut recv = ObjectRef::new(&mut *self.object, entry.declared_in);
        (entry.imp)(&mut recv, args)
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("class", &self.class.name())
            .field("concrete", &self.object.class().name())
            .finish()
    }
}
