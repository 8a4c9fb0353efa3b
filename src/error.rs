//! Error types for the `lineage` runtime.
//!
//! This module defines the error types used throughout the runtime: class
//! registration conflicts, slot declaration mistakes, dispatch failures, and
//! checked-cast rejections.

use std::fmt;

/// Errors that can occur in the `lineage` runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A class with this name is already registered.
    ClassAlreadyExists {
        /// The conflicting class name.
        name: String,
    },

    /// The same slot was declared or overridden twice in one class.
    DuplicateSlot {
        /// The duplicated slot name.
        slot: &'static str,
    },

    /// A newly declared slot shadows a slot already present in the
    /// ancestor chain. Shadowing must be expressed as an override.
    ShadowedSlot {
        /// The shadowed slot name.
        slot: &'static str,
    },

    /// An override targets a slot that no ancestor declares.
    UnknownOverride {
        /// The unknown slot name.
        slot: &'static str,
    },

    /// The slot is not visible in the method table of the reference's
    /// static class.
    SlotNotFound {
        /// The missing slot name.
        slot: &'static str,
    },

    /// The number of arguments does not match the slot's declared arity.
    ArityMismatch {
        /// The invoked slot name.
        slot: &'static str,
        /// The arity the slot was declared with.
        expected: usize,
        /// The number of arguments supplied.
        got: usize,
    },

    /// A state block could not be read back as the requested type.
    StateMismatch {
        /// The class level whose state was accessed.
        class: String,
    },

    /// An init routine received a config of the wrong type.
    ConfigMismatch {
        /// The config type the init routine expected.
        expected: &'static str,
    },

    /// The config chain is shallower or deeper than the class's
    /// ancestor chain.
    ConfigChainMismatch {
        /// The class being instantiated.
        class: String,
        /// The class's chain depth (number of levels).
        expected: usize,
        /// The config chain depth supplied.
        got: usize,
    },

    /// A checked cast was rejected: the instance's concrete class does
    /// not descend from the requested target.
    TypeMismatch {
        /// The cast target class.
        expected: String,
        /// The class that was actually found.
        found: String,
    },

    /// An up-cast was requested on a reference already typed at a
    /// root class.
    NoAncestor {
        /// The root class name.
        class: String,
    },

    /// An init routine failed to allocate state it needed.
    AllocationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ClassAlreadyExists { name } => {
                write!(f, "class `{name}` already exists in registry")
            }
            Error::DuplicateSlot { slot } => {
                write!(f, "slot `{slot}` declared twice in one class")
            }
            Error::ShadowedSlot { slot } => {
                write!(f, "slot `{slot}` shadows an inherited slot; use an override")
            }
            Error::UnknownOverride { slot } => {
                write!(f, "override targets slot `{slot}` that no ancestor declares")
            }
            Error::SlotNotFound { slot } => {
                write!(f, "slot `{slot}` not found at the reference's static class")
            }
            Error::ArityMismatch { slot, expected, got } => {
                write!(f, "slot `{slot}` expects {expected} arguments, got {got}")
            }
            Error::StateMismatch { class } => {
                write!(f, "state block of `{class}` has a different type")
            }
            Error::ConfigMismatch { expected } => {
                write!(f, "config is not of the expected type `{expected}`")
            }
            Error::ConfigChainMismatch { class, expected, got } => {
                write!(
                    f,
                    "config chain for `{class}` has {got} levels, class chain has {expected}"
                )
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "cast to `{expected}` rejected: instance is `{found}`")
            }
            Error::NoAncestor { class } => {
                write!(f, "class `{class}` has no ancestor to up-cast to")
            }
            Error::AllocationFailed => write!(f, "state allocation failed"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for `lineage` runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
