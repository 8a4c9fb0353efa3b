//! Core runtime for `lineage`.
//!
//! The runtime is organized into five pieces, leaves first:
//!
//! - [`slot`]: method-slot names with precomputed hashes
//! - [`table`]: per-class method-table singletons and their entries
//! - [`class`]: class registration, the ancestor chain, and the lazy
//!   ancestor-first table build
//! - [`object`]: the construction and destruction chains
//! - [`dispatch`]: typed views, checked casts, and method invocation
//!
//! # Global state
//!
//! The class registry and every registered class's metadata are
//! process-wide and live from first use until process exit. Instances, by
//! contrast, are plainly owned values: their whole lifecycle is the
//! ownership of the [`Object`] that `create` returned.

pub mod class;
pub mod dispatch;
pub mod object;
pub mod slot;
pub mod table;

pub use class::{Class, ClassBuilder, DeinitFn, Imp, InitFn};
pub use dispatch::{MethodArgs, ObjectRef};
pub use object::{Config, Object};
pub use slot::Slot;
pub use table::{MethodEntry, MethodTable};
