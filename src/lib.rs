//! `lineage`: a single-chain dynamic object runtime.
//!
//! `lineage` retrofits class-style object orientation onto plain Rust
//! values: single inheritance, virtual dispatch through per-class method
//! tables, and paired construction/destruction chains. It provides:
//!
//! - **Class declaration** at runtime, with at most one ancestor per class
//! - **Lazy vtable singletons** built once per class, ancestor-first, so
//!   overrides by more-derived classes always win
//! - **Constructor/destructor chaining**: state is initialized root-to-leaf
//!   and released leaf-to-root, tied to ownership so release is scope-based
//! - **Checked casts**: up-casts are free, down-casts are validated against
//!   the concrete class the instance was created as
//!
//! # Example
//!
//! ```rust
//! use lineage::{Class, Config, MethodArgs, Object, ObjectRef, Result, Slot};
//! use std::any::Any;
//!
//! struct SpeedState { speed: i64 }
//!
//! fn init(_cfg: &dyn Any) -> Result<Box<dyn Any>> {
//!     Ok(Box::new(SpeedState { speed: 0 }))
//! }
//!
//! fn set_speed(recv: &mut ObjectRef<'_>, args: &MethodArgs<'_>) -> Result<Option<i64>> {
//!     recv.state_mut::<SpeedState>()?.speed = args.get(0).unwrap_or(0);
//!     Ok(None)
//! }
//!
//! let vehicle = Class::builder("ReadmeVehicle")
//!     .init(init)
//!     .slot(Slot::new("set_speed"), 1, set_speed)
//!     .register()
//!     .unwrap();
//!
//! let mut obj = Object::create(&vehicle, &Config::root(&())).unwrap();
//! obj.as_ref().invoke(&Slot::new("set_speed"), &MethodArgs::one(80)).unwrap();
//! ```

pub mod error;
pub mod runtime;

// Re-export commonly used types
pub use error::{Error, Result};
pub use runtime::{
    Class, ClassBuilder, Config, MethodArgs, MethodEntry, MethodTable, Object,
    ObjectRef, Slot,
};
