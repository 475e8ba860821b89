//! The per-type cache of render functions.
//!
//! Every concrete error type is described once, the first time an instance
//! of it is formatted. The resulting [`RenderFunction`] lives as long as the
//! [`Registry`] it was built in; for the global registry that is the whole
//! process.

use core::any::TypeId;

use hashbrown::HashMap;
use triomphe::Arc;

use crate::{
    Exception,
    exception::concrete_type_id,
    render::RenderFunction,
    sync::{Lock, OnceSlot},
};

/// Names of fields that are rendered by dedicated sections and therefore
/// never listed under `Properties:`.
pub const SKIPPED_FIELDS: &[&str] = &[
    "InnerException",
    "InnerExceptions",
    "Message",
    "Data",
    "StackTrace",
    "TargetSite",
    "Source",
    "EntityValidationErrors",
];

/// A per-type slot. Inserting the slot and filling it are separate steps so
/// that the map's write lock is never held while a type is being described.
type Slot = Arc<OnceSlot<Arc<RenderFunction>>>;

type SlotMap = HashMap<TypeId, Slot, rustc_hash::FxBuildHasher>;

static GLOBAL: Registry = Registry::new();

/// A concurrent map from concrete error type to its [`RenderFunction`].
///
/// The map is read far more often than it is written. Lookups of known types
/// only take the read lock. For an unseen type, the write lock is held just
/// long enough to insert an empty slot, and the function is then built
/// inside the slot. Concurrent first uses of the same type therefore build
/// exactly one function, while first uses of unrelated types do not wait on
/// each other.
///
/// A [`describe`](Exception::describe) that formats errors itself is
/// supported, including errors of the type being described. Such a nested
/// request on the same thread gets a function built for it alone, which is
/// not cached; a request nested deeper than that renders without fields.
/// Without the `std` feature the building thread cannot be identified, and
/// a nested request for the type being described does not return.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
///
/// use faultline::{Exception, Registry, fields::Fields};
///
/// struct NotFound {
///     key: String,
/// }
///
/// impl Exception for NotFound {
///     fn message(&self) -> Cow<'_, str> {
///         Cow::Borrowed("not found")
///     }
///
///     fn describe(&self) -> Fields {
///         Fields::new().field("Key", |e: &Self| e.key.clone())
///     }
/// }
///
/// let registry = Registry::new();
/// let first = registry.get_or_build(&NotFound { key: "a".into() });
/// let second = registry.get_or_build(&NotFound { key: "b".into() });
/// assert!(std::ptr::eq(&*first, &*second));
/// assert_eq!(registry.len(), 1);
/// ```
pub struct Registry {
    slots: Lock<SlotMap>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Lock::new(HashMap::with_hasher(rustc_hash::FxBuildHasher)),
        }
    }

    /// The process-wide registry used by [`format`](crate::format).
    #[must_use]
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Returns the render function for the concrete type of `exception`,
    /// building it on first use.
    pub fn get_or_build(&self, exception: &dyn Exception) -> Arc<RenderFunction> {
        let type_id = concrete_type_id(exception);
        let slot = self.slot(type_id);
        if let Some(function) = slot.get() {
            return Arc::clone(function);
        }

        let (nesting, _building) = Building::enter(self, type_id);
        match nesting {
            0 => Arc::clone(slot.get_or_init(|| Arc::new(RenderFunction::build(exception)))),
            1 => {
                tracing::debug!(
                    exception_type = %RenderFunction::safe_type_name(exception),
                    "type is already being described on this thread, building an uncached copy"
                );
                Arc::new(RenderFunction::build(exception))
            }
            _ => {
                tracing::debug!(
                    exception_type = %RenderFunction::safe_type_name(exception),
                    "describe keeps formatting its own type, rendering without fields"
                );
                Arc::new(RenderFunction::without_fields())
            }
        }
    }

    /// Number of types seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns `true` if no type has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Returns `true` if a render function exists, or is being built, for
    /// `type_id`.
    #[must_use]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.slots.read().contains_key(&type_id)
    }

    fn slot(&self, type_id: TypeId) -> Slot {
        if let Some(slot) = self.slots.read().get(&type_id) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .entry(type_id)
                .or_insert_with(|| Arc::new(OnceSlot::new())),
        )
    }
}

/// Marks a type as being built by the current thread until dropped.
#[cfg(feature = "std")]
struct Building {
    key: BuildKey,
}

/// The registry's address and the type being built in it.
#[cfg(feature = "std")]
type BuildKey = (usize, TypeId);

#[cfg(feature = "std")]
std::thread_local! {
    static BUILDING: core::cell::RefCell<alloc::vec::Vec<BuildKey>> =
        const { core::cell::RefCell::new(alloc::vec::Vec::new()) };
}

#[cfg(feature = "std")]
impl Building {
    /// Returns how many builds of `type_id` in `registry` this thread is
    /// already inside of.
    fn enter(registry: &Registry, type_id: TypeId) -> (usize, Self) {
        let key = (core::ptr::from_ref(registry) as usize, type_id);
        let nesting = BUILDING
            .try_with(|keys| {
                let mut keys = keys.borrow_mut();
                let nesting = keys.iter().filter(|entry| **entry == key).count();
                keys.push(key);
                nesting
            })
            .unwrap_or(0);
        (nesting, Self { key })
    }
}

#[cfg(feature = "std")]
impl Drop for Building {
    fn drop(&mut self) {
        let key = self.key;
        // The thread-local may already be gone while the thread shuts down.
        let _ = BUILDING.try_with(|keys| {
            let mut keys = keys.borrow_mut();
            if let Some(position) = keys.iter().rposition(|entry| *entry == key) {
                keys.remove(position);
            }
        });
    }
}

#[cfg(not(feature = "std"))]
struct Building;

#[cfg(not(feature = "std"))]
impl Building {
    fn enter(_registry: &Registry, _type_id: TypeId) -> (usize, Self) {
        (0, Self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.len())
            .finish()
    }
}
