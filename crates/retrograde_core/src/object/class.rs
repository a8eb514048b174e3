//! # Object Classes
//!
//! A class is a named behavior type: a set of optional lifecycle callbacks,
//! the size of the payload its entities carry and a block of class-wide
//! static variables.

use crate::ecs::{ActiveFlag, SlotId, World};
use crate::memory::StaticBlock;
use crate::object::NameHash;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Index of a registered class. Class 0 is the inert default object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClassId(u16);

impl ClassId {
    /// The default object. Slots of this class are free.
    pub const DEFAULT: Self = Self(0);

    /// Wraps a raw class id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the id as a table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the default object.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

/// Callback run for one entity.
pub type EntityCallback = Arc<dyn Fn(&mut World, SlotId) + Send + Sync>;

/// Callback run once for a whole class.
pub type ClassCallback = Arc<dyn Fn(&mut World) + Send + Sync>;

/// Callback run when an entity is created, with the caller's creation data.
pub type CreateCallback = Arc<dyn Fn(&mut World, SlotId, Option<&dyn Any>) + Send + Sync>;

/// The lifecycle callbacks of a class.
///
/// Every callback is optional. A class that inherits from a parent uses the
/// parent's callback wherever its own is missing.
///
/// # Example
///
/// ```rust,ignore
/// let callbacks = ObjectCallbacks::new()
///     .create(|world, slot, _data| {
///         world.entity_mut(slot).active = ActiveFlag::Bounds;
///     })
///     .update(|world, slot| {
///         world.entity_mut(slot).position.y += 0x1000;
///     });
/// ```
#[derive(Clone, Default)]
pub struct ObjectCallbacks {
    pub(crate) update: Option<EntityCallback>,
    pub(crate) late_update: Option<EntityCallback>,
    pub(crate) static_update: Option<ClassCallback>,
    pub(crate) draw: Option<EntityCallback>,
    pub(crate) create: Option<CreateCallback>,
    pub(crate) stage_load: Option<ClassCallback>,
    pub(crate) editor_draw: Option<EntityCallback>,
    pub(crate) editor_load: Option<ClassCallback>,
    pub(crate) serialize: Option<ClassCallback>,
    pub(crate) parent: Option<ClassId>,
}

impl ObjectCallbacks {
    /// Creates an empty callback set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-entity update callback.
    #[must_use]
    pub fn update(mut self, f: impl Fn(&mut World, SlotId) + Send + Sync + 'static) -> Self {
        self.update = Some(Arc::new(f));
        self
    }

    /// Sets the per-entity late update, run after the group lists are rebuilt.
    #[must_use]
    pub fn late_update(mut self, f: impl Fn(&mut World, SlotId) + Send + Sync + 'static) -> Self {
        self.late_update = Some(Arc::new(f));
        self
    }

    /// Sets the class-wide update run once per pass before entities update.
    #[must_use]
    pub fn static_update(mut self, f: impl Fn(&mut World) + Send + Sync + 'static) -> Self {
        self.static_update = Some(Arc::new(f));
        self
    }

    /// Sets the draw callback.
    #[must_use]
    pub fn draw(mut self, f: impl Fn(&mut World, SlotId) + Send + Sync + 'static) -> Self {
        self.draw = Some(Arc::new(f));
        self
    }

    /// Sets the create callback.
    #[must_use]
    pub fn create(
        mut self,
        f: impl Fn(&mut World, SlotId, Option<&dyn Any>) + Send + Sync + 'static,
    ) -> Self {
        self.create = Some(Arc::new(f));
        self
    }

    /// Sets the stage-load callback, run once per class when a stage starts.
    #[must_use]
    pub fn stage_load(mut self, f: impl Fn(&mut World) + Send + Sync + 'static) -> Self {
        self.stage_load = Some(Arc::new(f));
        self
    }

    /// Sets the editor draw callback.
    #[must_use]
    pub fn editor_draw(mut self, f: impl Fn(&mut World, SlotId) + Send + Sync + 'static) -> Self {
        self.editor_draw = Some(Arc::new(f));
        self
    }

    /// Sets the editor load callback.
    #[must_use]
    pub fn editor_load(mut self, f: impl Fn(&mut World) + Send + Sync + 'static) -> Self {
        self.editor_load = Some(Arc::new(f));
        self
    }

    /// Sets the serialize callback, which declares the class's editable variables.
    #[must_use]
    pub fn serialize(mut self, f: impl Fn(&mut World) + Send + Sync + 'static) -> Self {
        self.serialize = Some(Arc::new(f));
        self
    }

    /// Falls back to `parent`'s callbacks wherever this set has none.
    ///
    /// The parent must already be registered.
    #[must_use]
    pub fn inherit(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// A registered class.
pub struct ObjectClass {
    pub(crate) name: String,
    pub(crate) hash: NameHash,
    pub(crate) callbacks: ObjectCallbacks,
    pub(crate) entity_size: usize,
    pub(crate) static_block: StaticBlock,
    pub(crate) payload_type: Option<TypeId>,
    pub(crate) static_type: Option<TypeId>,
    pub(crate) active: ActiveFlag,
}

impl ObjectClass {
    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name digest.
    #[inline]
    #[must_use]
    pub const fn hash(&self) -> NameHash {
        self.hash
    }

    /// Returns the payload size in bytes.
    #[inline]
    #[must_use]
    pub const fn entity_size(&self) -> usize {
        self.entity_size
    }

    /// Returns the size of the static-variable block in bytes.
    #[inline]
    #[must_use]
    pub const fn static_size(&self) -> usize {
        self.static_block.len()
    }

    /// Returns the class this one inherits from.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<ClassId> {
        self.callbacks.parent
    }

    /// Returns the activation flag gating the class's static update.
    #[inline]
    #[must_use]
    pub const fn active(&self) -> ActiveFlag {
        self.active
    }

    /// Whether a payload of type `P` may be viewed on entities of this class.
    ///
    /// Classes registered with a payload type accept only that type. Classes
    /// registered by size accept any type that fits.
    #[must_use]
    pub fn accepts_payload<P: 'static>(&self) -> bool {
        match self.payload_type {
            Some(id) => id == TypeId::of::<P>(),
            None => std::mem::size_of::<P>() <= self.entity_size,
        }
    }

    /// Whether the static block may be viewed as `S`.
    #[must_use]
    pub fn accepts_static<S: 'static>(&self) -> bool {
        match self.static_type {
            Some(id) => id == TypeId::of::<S>(),
            None => std::mem::size_of::<S>() <= self.static_block.len(),
        }
    }
}
