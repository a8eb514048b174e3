//! # Class Registry
//!
//! The table of registered classes. Classes are registered once at startup;
//! the id returned is the class's index and never changes for the lifetime
//! of the registry.
//!
//! Class 0 is always the default object: an inert class whose slots count as
//! free.

use super::class::{
    CreateCallback, ClassCallback, ClassId, EntityCallback, ObjectCallbacks, ObjectClass,
};
use super::hash::NameHash;
use crate::ecs::{ActiveFlag, Payload, PAYLOAD_BYTES, TYPE_COUNT};
use crate::error::{CoreError, CoreResult};
use crate::memory::{StaticArena, StaticBlock};
use bytemuck::Pod;
use std::any::TypeId;
use std::mem::size_of;
use tracing::{debug, error};

/// Name of class 0.
pub const DEFAULT_OBJECT_NAME: &str = "DefaultObject";

/// A named static-variable block not tied to any class.
struct GlobalBlock {
    hash: NameHash,
    block: StaticBlock,
}

/// Class table plus the arena holding every class's static variables.
pub struct ClassRegistry {
    classes: Vec<ObjectClass>,
    arena: StaticArena,
    globals: Vec<GlobalBlock>,
}

impl ClassRegistry {
    /// Creates a registry holding only the default object.
    ///
    /// # Arguments
    ///
    /// * `static_arena_bytes` - Size of the arena shared by all static blocks
    #[must_use]
    pub fn new(static_arena_bytes: usize) -> Self {
        let mut classes = Vec::with_capacity(TYPE_COUNT);
        classes.push(ObjectClass {
            name: DEFAULT_OBJECT_NAME.to_owned(),
            hash: NameHash::of(DEFAULT_OBJECT_NAME),
            callbacks: ObjectCallbacks::default(),
            entity_size: 0,
            static_block: StaticBlock::EMPTY,
            payload_type: None,
            static_type: None,
            active: ActiveFlag::Normal,
        });

        Self {
            classes,
            arena: StaticArena::new(static_arena_bytes),
            globals: Vec::new(),
        }
    }

    /// Registers a class by payload and static-block size.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ClassTableFull`] when [`TYPE_COUNT`] classes exist
    /// - [`CoreError::PayloadTooLarge`] when `entity_size` exceeds a slot
    /// - [`CoreError::UnknownParent`] when the inherited class is unregistered
    /// - [`CoreError::StaticArenaExhausted`] when the static block does not fit
    pub fn try_register(
        &mut self,
        name: &str,
        entity_size: usize,
        static_size: usize,
        callbacks: ObjectCallbacks,
    ) -> CoreResult<ClassId> {
        self.insert(name, entity_size, static_size, callbacks, None, None)
    }

    /// Registers a class, logging and returning class 0 on failure.
    ///
    /// Entities created with the returned id are inert when registration
    /// failed, which keeps a missing class from taking the game down.
    pub fn register(
        &mut self,
        name: &str,
        entity_size: usize,
        static_size: usize,
        callbacks: ObjectCallbacks,
    ) -> ClassId {
        Self::or_default(self.try_register(name, entity_size, static_size, callbacks))
    }

    /// Registers a class with a typed payload `P` and static block `S`.
    ///
    /// Payload and static views of this class are then restricted to exactly
    /// these types. Use `()` for a class without static variables.
    ///
    /// # Errors
    ///
    /// As [`ClassRegistry::try_register`].
    pub fn try_register_class<P: Payload, S: Pod>(
        &mut self,
        name: &str,
        callbacks: ObjectCallbacks,
    ) -> CoreResult<ClassId> {
        self.insert(
            name,
            P::SIZE,
            size_of::<S>(),
            callbacks,
            Some(TypeId::of::<P>()),
            Some(TypeId::of::<S>()),
        )
    }

    /// Registers a typed class, logging and returning class 0 on failure.
    pub fn register_class<P: Payload, S: Pod>(
        &mut self,
        name: &str,
        callbacks: ObjectCallbacks,
    ) -> ClassId {
        Self::or_default(self.try_register_class::<P, S>(name, callbacks))
    }

    fn or_default(result: CoreResult<ClassId>) -> ClassId {
        result.unwrap_or_else(|e| {
            error!("Object registration failed: {}", e);
            ClassId::DEFAULT
        })
    }

    fn insert(
        &mut self,
        name: &str,
        entity_size: usize,
        static_size: usize,
        callbacks: ObjectCallbacks,
        payload_type: Option<TypeId>,
        static_type: Option<TypeId>,
    ) -> CoreResult<ClassId> {
        if self.classes.len() >= TYPE_COUNT {
            return Err(CoreError::ClassTableFull {
                name: name.to_owned(),
                capacity: TYPE_COUNT,
            });
        }
        if entity_size > PAYLOAD_BYTES {
            return Err(CoreError::PayloadTooLarge {
                name: name.to_owned(),
                size: entity_size,
                limit: PAYLOAD_BYTES,
            });
        }
        if let Some(parent) = callbacks.parent {
            if parent.index() >= self.classes.len() {
                return Err(CoreError::UnknownParent {
                    name: name.to_owned(),
                    parent: parent.raw(),
                });
            }
        }
        let static_block =
            self.arena
                .reserve(static_size)
                .ok_or_else(|| CoreError::StaticArenaExhausted {
                    name: name.to_owned(),
                    requested: static_size,
                    remaining: self.arena.remaining(),
                })?;

        #[allow(clippy::cast_possible_truncation)]
        let id = ClassId::new(self.classes.len() as u16);
        self.classes.push(ObjectClass {
            name: name.to_owned(),
            hash: NameHash::of(name),
            callbacks,
            entity_size,
            static_block,
            payload_type,
            static_type,
            active: ActiveFlag::Normal,
        });

        debug!(
            "Registered object {} as class {} ({} byte payload, {} byte statics)",
            name,
            id.raw(),
            entity_size,
            static_size
        );
        Ok(id)
    }

    /// Returns the number of registered classes, the default object included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false: the default object is registered on creation.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterates over every registered class id in registration order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(|index| ClassId::new(index as u16))
    }

    /// Clamps an id to the last registered class.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn clamp(&self, id: ClassId) -> ClassId {
        if id.index() < self.classes.len() {
            id
        } else {
            ClassId::new((self.classes.len() - 1) as u16)
        }
    }

    /// Returns a class, clamping out-of-range ids to the last registered class.
    #[inline]
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ObjectClass {
        &self.classes[self.clamp(id).index()]
    }

    /// Looks up a class by name.
    ///
    /// If several classes share a name, the first registered wins.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ClassId> {
        let hash = NameHash::of(name);
        self.ids().find(|&id| self.classes[id.index()].hash == hash)
    }

    /// Looks up a class by name, returning class 0 on a miss.
    ///
    /// Class 0 is also a valid class, so use
    /// [`ClassRegistry::find_by_name`] when the distinction matters.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> ClassId {
        self.find_by_name(name).unwrap_or(ClassId::DEFAULT)
    }

    /// Sets the flag gating a class's static update.
    pub fn set_active(&mut self, id: ClassId, active: ActiveFlag) {
        let index = self.clamp(id).index();
        self.classes[index].active = active;
    }

    /// Views a class's static block as `S`.
    ///
    /// # Returns
    ///
    /// None if the class was registered with a different static type, or
    /// `S` does not fit its block.
    #[must_use]
    pub fn static_vars<S: Pod>(&self, id: ClassId) -> Option<&S> {
        let class = self.class(id);
        if !class.accepts_static::<S>() {
            return None;
        }
        self.arena.get(class.static_block)
    }

    /// Views a class's static block as `S` mutably.
    pub fn static_vars_mut<S: Pod>(&mut self, id: ClassId) -> Option<&mut S> {
        let class = &self.classes[self.clamp(id).index()];
        if !class.accepts_static::<S>() {
            return None;
        }
        let block = class.static_block;
        self.arena.get_mut(block)
    }

    /// Reserves a named global static-variable block.
    ///
    /// Registering the same name twice returns the existing block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StaticArenaExhausted`] when the block does not fit.
    pub fn register_static_variables(&mut self, name: &str, size: usize) -> CoreResult<StaticBlock> {
        let hash = NameHash::of(name);
        if let Some(global) = self.globals.iter().find(|g| g.hash == hash) {
            return Ok(global.block);
        }

        let block = self
            .arena
            .reserve(size)
            .ok_or_else(|| CoreError::StaticArenaExhausted {
                name: name.to_owned(),
                requested: size,
                remaining: self.arena.remaining(),
            })?;
        self.globals.push(GlobalBlock { hash, block });
        debug!("Registered static variables {} ({} bytes)", name, size);
        Ok(block)
    }

    /// Returns the global block registered under `name`.
    #[must_use]
    pub fn static_variables(&self, name: &str) -> Option<StaticBlock> {
        let hash = NameHash::of(name);
        self.globals.iter().find(|g| g.hash == hash).map(|g| g.block)
    }

    /// Views a global block as `S`.
    #[must_use]
    pub fn global_vars<S: Pod>(&self, block: StaticBlock) -> Option<&S> {
        self.arena.get(block)
    }

    /// Views a global block as `S` mutably.
    pub fn global_vars_mut<S: Pod>(&mut self, block: StaticBlock) -> Option<&mut S> {
        self.arena.get_mut(block)
    }

    /// Prepares every class for a new stage: static blocks are zeroed and
    /// every static-update flag returns to [`ActiveFlag::Normal`].
    pub fn reset_stage(&mut self) {
        self.arena.zero();
        for class in &mut self.classes {
            class.active = ActiveFlag::Normal;
        }
    }

    /// Resolves a callback through the inheritance chain.
    fn resolve<T: Clone>(
        &self,
        id: ClassId,
        pick: impl Fn(&ObjectCallbacks) -> Option<&T>,
    ) -> Option<T> {
        let mut current = Some(self.clamp(id));
        // Parents are registered first, so each hop moves to a lower id.
        while let Some(class_id) = current {
            let callbacks = &self.classes[class_id.index()].callbacks;
            if let Some(callback) = pick(callbacks) {
                return Some(callback.clone());
            }
            current = callbacks.parent.filter(|parent| *parent < class_id);
        }
        None
    }

    /// Returns the update callback, inherited if needed.
    #[must_use]
    pub fn update_callback(&self, id: ClassId) -> Option<EntityCallback> {
        self.resolve(id, |c| c.update.as_ref())
    }

    /// Returns the late-update callback, inherited if needed.
    #[must_use]
    pub fn late_update_callback(&self, id: ClassId) -> Option<EntityCallback> {
        self.resolve(id, |c| c.late_update.as_ref())
    }

    /// Returns the static-update callback, inherited if needed.
    #[must_use]
    pub fn static_update_callback(&self, id: ClassId) -> Option<ClassCallback> {
        self.resolve(id, |c| c.static_update.as_ref())
    }

    /// Returns the draw callback, inherited if needed.
    #[must_use]
    pub fn draw_callback(&self, id: ClassId) -> Option<EntityCallback> {
        self.resolve(id, |c| c.draw.as_ref())
    }

    /// Returns the create callback, inherited if needed.
    #[must_use]
    pub fn create_callback(&self, id: ClassId) -> Option<CreateCallback> {
        self.resolve(id, |c| c.create.as_ref())
    }

    /// Returns the stage-load callback, inherited if needed.
    #[must_use]
    pub fn stage_load_callback(&self, id: ClassId) -> Option<ClassCallback> {
        self.resolve(id, |c| c.stage_load.as_ref())
    }

    /// Returns the editor-draw callback, inherited if needed.
    #[must_use]
    pub fn editor_draw_callback(&self, id: ClassId) -> Option<EntityCallback> {
        self.resolve(id, |c| c.editor_draw.as_ref())
    }

    /// Returns the editor-load callback, inherited if needed.
    #[must_use]
    pub fn editor_load_callback(&self, id: ClassId) -> Option<ClassCallback> {
        self.resolve(id, |c| c.editor_load.as_ref())
    }

    /// Returns the serialize callback, inherited if needed.
    #[must_use]
    pub fn serialize_callback(&self, id: ClassId) -> Option<ClassCallback> {
        self.resolve(id, |c| c.serialize.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[allow(dead_code)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Spring {
        power: i32,
        flags: u32,
    }

    impl Payload for Spring {}

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct SpringStatics {
        sfx: u32,
    }

    #[test]
    fn test_default_object_is_class_zero() {
        let registry = ClassRegistry::new(1024);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.class(ClassId::DEFAULT).name(), DEFAULT_OBJECT_NAME);
        assert_eq!(registry.find_by_name(DEFAULT_OBJECT_NAME), Some(ClassId::DEFAULT));
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = ClassRegistry::new(1024);
        let ring = registry.register("Ring", 16, 8, ObjectCallbacks::new());
        let spring = registry.register("Spring", 8, 0, ObjectCallbacks::new());

        assert_eq!(ring, ClassId::new(1));
        assert_eq!(spring, ClassId::new(2));
        assert_eq!(registry.class(ring).entity_size(), 16);
        assert_eq!(registry.class(ring).static_size(), 8);
        assert_eq!(registry.get_by_name("Spring"), spring);
    }

    #[test]
    fn test_name_lookup_miss() {
        let registry = ClassRegistry::new(1024);
        assert_eq!(registry.find_by_name("Missing"), None);
        assert_eq!(registry.get_by_name("Missing"), ClassId::DEFAULT);
    }

    #[test]
    fn test_duplicate_name_resolves_to_first() {
        let mut registry = ClassRegistry::new(1024);
        let first = registry.register("Ring", 0, 0, ObjectCallbacks::new());
        let _ = registry.register("Ring", 0, 0, ObjectCallbacks::new());
        assert_eq!(registry.find_by_name("Ring"), Some(first));
    }

    #[test]
    fn test_class_table_full() {
        let mut registry = ClassRegistry::new(1024);
        for i in 1..TYPE_COUNT {
            registry
                .try_register(&format!("Class{i}"), 0, 0, ObjectCallbacks::new())
                .unwrap();
        }

        let err = registry
            .try_register("Overflow", 0, 0, ObjectCallbacks::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::ClassTableFull { .. }));
        assert_eq!(
            registry.register("Overflow", 0, 0, ObjectCallbacks::new()),
            ClassId::DEFAULT
        );
        assert_eq!(registry.len(), TYPE_COUNT);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut registry = ClassRegistry::new(1024);
        let err = registry
            .try_register("Boss", PAYLOAD_BYTES + 1, 0, ObjectCallbacks::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::PayloadTooLarge { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_static_arena_exhausted() {
        let mut registry = ClassRegistry::new(16);
        assert!(registry.try_register("A", 0, 16, ObjectCallbacks::new()).is_ok());
        let err = registry
            .try_register("B", 0, 1, ObjectCallbacks::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::StaticArenaExhausted { .. }));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut registry = ClassRegistry::new(64);
        let err = registry
            .try_register("Child", 0, 0, ObjectCallbacks::new().inherit(ClassId::new(9)))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownParent { parent: 9, .. }));
    }

    #[test]
    fn test_typed_static_vars() {
        let mut registry = ClassRegistry::new(1024);
        let spring =
            registry.register_class::<Spring, SpringStatics>("Spring", ObjectCallbacks::new());

        registry.static_vars_mut::<SpringStatics>(spring).unwrap().sfx = 3;
        assert_eq!(registry.static_vars::<SpringStatics>(spring).unwrap().sfx, 3);

        // A different type of the same size is refused for typed classes.
        assert!(registry.static_vars::<u32>(spring).is_none());
        assert!(registry.class(spring).accepts_payload::<Spring>());
        assert!(!registry.class(spring).accepts_payload::<u64>());
    }

    #[test]
    fn test_reset_stage_zeroes_statics_and_flags() {
        let mut registry = ClassRegistry::new(1024);
        let ring = registry.register("Ring", 0, 4, ObjectCallbacks::new());
        *registry.static_vars_mut::<u32>(ring).unwrap() = 99;
        registry.set_active(ring, ActiveFlag::Never);

        registry.reset_stage();
        assert_eq!(*registry.static_vars::<u32>(ring).unwrap(), 0);
        assert_eq!(registry.class(ring).active(), ActiveFlag::Normal);
    }

    #[test]
    fn test_global_static_variables() {
        let mut registry = ClassRegistry::new(1024);
        let block = registry.register_static_variables("Zone", 8).unwrap();
        assert_eq!(registry.register_static_variables("Zone", 8).unwrap(), block);
        assert_eq!(registry.static_variables("Zone"), Some(block));

        *registry.global_vars_mut::<u64>(block).unwrap() = 5;
        assert_eq!(*registry.global_vars::<u64>(block).unwrap(), 5);
    }

    #[test]
    fn test_callbacks_inherit_from_parent() {
        let mut registry = ClassRegistry::new(1024);
        let parent = registry.register(
            "Enemy",
            0,
            0,
            ObjectCallbacks::new().update(|_, _| {}).draw(|_, _| {}),
        );
        let child = registry.register(
            "Motobug",
            0,
            0,
            ObjectCallbacks::new().draw(|_, _| {}).inherit(parent),
        );

        assert!(registry.update_callback(child).is_some());
        assert!(registry.draw_callback(child).is_some());
        assert!(registry.create_callback(child).is_none());
        assert_eq!(registry.class(child).parent(), Some(parent));
    }

    #[test]
    fn test_class_lookup_clamps() {
        let mut registry = ClassRegistry::new(64);
        let last = registry.register("Last", 0, 0, ObjectCallbacks::new());
        assert_eq!(registry.clamp(ClassId::new(200)), last);
        assert_eq!(registry.class(ClassId::new(200)).name(), "Last");
    }
}
