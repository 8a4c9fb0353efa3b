//! Instance lifecycle: the construction and destruction chains.
//!
//! An [`Object`] is one instance of a registered class. It carries:
//! - the concrete class it was created as (the type witness that makes
//!   checked down-casts and type-erased destruction possible)
//! - one state block per chain level, root-first, each produced by that
//!   level's init routine
//!
//! # Construction
//!
//! `Object::create` runs the chain ancestor-first: the root level's init
//! runs over the root level's config, then each descendant level in order.
//! The concrete class's method table is forced before any init runs, so a
//! half-built table can never be observed through a live instance. If an
//! init fails partway, the already-initialized prefix is torn down
//! descendant-first and the error is returned; construction never aborts
//! the process.
//!
//! # Destruction
//!
//! The chain runs in reverse from `Drop`: each level's deinit releases what
//! its state references, then the runtime releases the state block itself,
//! leaf-to-root. Ownership makes the release scope-based: there is no way
//! to leak a level or double-run the chain, and destruction always starts
//! at the concrete leaf class no matter which ancestor-typed view the
//! caller last held.

use crate::error::{Error, Result};
use crate::runtime::class::Class;
use crate::runtime::dispatch::ObjectRef;
use log::trace;
use std::any::Any;
use std::fmt;

/// The per-level configuration chain for constructing an instance.
///
/// Mirrors the class chain: a derived class's config links to its
/// ancestor's config, and construction pairs the two chains level by
/// level, root-first.
///
/// # Example
///
/// ```rust
/// use lineage::Config;
///
/// struct VehicleCfg { top_speed: i64 }
/// struct CarCfg { seats: i64 }
///
/// let vehicle_cfg = VehicleCfg { top_speed: 250 };
/// let car_cfg = CarCfg { seats: 4 };
///
/// let base = Config::root(&vehicle_cfg);
/// let cfg = Config::derived(&car_cfg, &base);
/// assert_eq!(cfg.depth(), 2);
/// ```
pub struct Config<'a> {
    own: &'a dyn Any,
    ancestor: Option<&'a Config<'a>>,
}

impl<'a> Config<'a> {
    /// Config for a root class level.
    #[must_use]
    pub fn root(own: &'a dyn Any) -> Self {
        Config { own, ancestor: None }
    }

    /// Config for a derived class level, linking the ancestor's config.
    #[must_use]
    pub fn derived(own: &'a dyn Any, ancestor: &'a Config<'a>) -> Self {
        Config { own, ancestor: Some(ancestor) }
    }

    /// Number of levels in this config chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = Some(self);
        while let Some(cfg) = current {
            depth += 1;
            current = cfg.ancestor;
        }
        depth
    }

    /// Collects the per-level configs root-first.
    fn collect_root_first(&self) -> Vec<&'a dyn Any> {
        let mut configs = Vec::new();
        let mut current = Some(self);
        while let Some(cfg) = current {
            configs.push(cfg.own);
            current = cfg.ancestor;
        }
        configs.reverse();
        configs
    }
}

/// A fully constructed instance of a registered class.
///
/// The instance owns its state blocks; dropping it runs the destruction
/// chain. [`Object::as_ref`] produces a borrowed view for dispatch and
/// casting.
pub struct Object {
    /// Concrete class witness, fixed at the outermost creation step.
    class: Class,
    /// One state block per chain level, root-first. Length always equals
    /// the chain length while the instance is live.
    states: Vec<Box<dyn Any>>,
}

impl Object {
    /// Runs the construction chain for `class` over the config chain.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigChainMismatch`] if the config chain's depth does
    ///   not match the class chain's
    /// - any error returned by a level's init routine; levels already
    ///   initialized are deinitialized (descendant-first) before the error
    ///   propagates
    ///
    /// # Example
    ///
    /// ```rust
    /// use lineage::{Class, Config, Object};
    ///
    /// let class = Class::builder("DocCreate").register().unwrap();
    /// let obj = Object::create(&class, &Config::root(&())).unwrap();
    /// assert_eq!(obj.class(), class);
    /// ```
    pub fn create(class: &Class, cfg: &Config<'_>) -> Result<Object> {
        let chain = class.chain();
        let configs = cfg.collect_root_first();
        if configs.len() != chain.len() {
            return Err(Error::ConfigChainMismatch {
                class: class.name().to_string(),
                expected: chain.len(),
                got: configs.len(),
            });
        }

        // First instantiation of this class (or of any descendant earlier)
        // builds the method-table singleton, ancestors first.
        let _ = class.method_table();

        let mut states: Vec<Box<dyn Any>> = Vec::with_capacity(chain.len());
        for (level, level_cfg) in chain.iter().zip(configs) {
            match (level.init_fn())(level_cfg) {
                Ok(state) => states.push(state),
                Err(err) => {
                    // Tear down the initialized prefix in reverse order.
                    unwind_states(&chain, &mut states);
                    return Err(err);
                }
            }
        }

        trace!("created instance of `{}`", class.name());
        Ok(Object { class: *class, states })
    }

    /// Returns the concrete class this instance was created as.
    #[must_use]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Borrows the instance as a view typed at its concrete class.
    pub fn as_ref(&mut self) -> ObjectRef<'_> {
        let class = self.class;
        ObjectRef::new(self, class)
    }

    /// Destroys the instance, running the destruction chain.
    ///
    /// Equivalent to dropping it; provided for call sites that want the
    /// release to read as an operation.
    pub fn destroy(self) {
        // Drop runs the chain.
    }

    pub(crate) fn state_at(&self, depth: usize) -> Option<&dyn Any> {
        self.states.get(depth).map(Box::as_ref)
    }

    pub(crate) fn state_at_mut(&mut self, depth: usize) -> Option<&mut dyn Any> {
        self.states.get_mut(depth).map(Box::as_mut)
    }
}

/// Deinitializes and releases `states` descendant-first. `chain` is the
/// class chain the states belong to, root-first.
fn unwind_states(chain: &[Class], states: &mut Vec<Box<dyn Any>>) {
    while let Some(mut state) = states.pop() {
        if let Some(level) = chain.get(states.len()) {
            if let Some(deinit) = level.deinit_fn() {
                deinit(state.as_mut());
            }
        }
        // The state block itself is released here, after its deinit.
        drop(state);
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        trace!("destroying instance of `{}`", self.class.name());
        let chain = self.class.chain();
        unwind_states(&chain, &mut self.states);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class.name())
            .field("levels", &self.states.len())
            .finish()
    }
}
