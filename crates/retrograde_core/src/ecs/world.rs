//! # Object World
//!
//! The central container for all entities, classes and per-frame tables.
//! Pre-allocates all memory at creation time.
//!
//! Callbacks receive `&mut World` and the slot they run for, so behavior code
//! may create, reset or copy entities (its own slot included) at any time.

use super::camera::{Camera, CAMERA_COUNT, SCREEN_COUNT};
use super::draw::DrawList;
use super::entity::{
    entity_id, ActiveFlag, Entity, SlotId, ENTITY_COUNT, RESERVE_ENTITY_COUNT,
};
use super::foreach::{ForeachCursor, ForeachStack};
use super::group::{ClassIndex, GroupId, TypeGroups};
use super::Payload;
use crate::config::WorldConfig;
use crate::error::CoreResult;
use crate::math::Vector2;
use crate::memory::{CreatePolicy, EntityPool, StaticBlock};
use crate::object::{
    ClassId, ClassRegistry, EditableVarInfo, EditableVarTable, ObjectCallbacks, ObjectClass,
    VarType,
};
use bytemuck::Pod;
use std::any::Any;
use tracing::{debug, error, warn};

/// Screen mask covering every screen.
const ALL_SCREENS: u8 = u8::MAX;

/// What an iteration walks over.
#[derive(Clone, Copy, Debug)]
enum ForeachSource {
    Class(ClassId),
    Group(GroupId),
}

/// The object world - container for all game objects.
///
/// All memory is pre-allocated at creation. No allocations occur during
/// normal gameplay operations (create, reset, iteration, scheduling).
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new(&WorldConfig::default());
/// let ring = world.register_class::<Ring, ()>("Ring", ObjectCallbacks::new());
///
/// let slot = world.create_entity(ring, None, Vector2::from_pixels(64, 32));
/// world.payload_mut::<Ring>(slot).unwrap().timer = 30;
/// world.step();
/// ```
pub struct World {
    pub(super) pool: EntityPool,
    pub(super) registry: ClassRegistry,
    class_index: ClassIndex,
    pub(super) type_groups: TypeGroups,
    pub(super) foreach: ForeachStack,
    editable_vars: EditableVarTable,
    pub(super) draw_list: DrawList,
    pub(super) cameras: Vec<Camera>,
    /// Slots placed since the last stage start, in placement order.
    pending_create: Vec<SlotId>,
    /// Which placed slots still await their create call.
    awaiting_create: Box<[bool]>,
    /// Which slots ran their update in the current pass.
    pub(super) updated: Box<[bool]>,
    pub(super) paused: bool,
    pub(super) frozen: bool,
    pub(super) current_screen: usize,
    pub(super) frame: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(&WorldConfig::default())
    }
}

impl World {
    /// Creates a new world.
    ///
    /// This pre-allocates all memory upfront:
    /// - Entity slots and payload blocks
    /// - Class table and static arena
    /// - Group lists and the foreach stack
    ///
    /// Out-of-range screen and camera counts are clamped; use
    /// [`World::from_config`] to reject them instead.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        let mut cameras = Vec::with_capacity(CAMERA_COUNT);
        cameras.extend(config.cameras.iter().copied().take(CAMERA_COUNT));

        Self {
            pool: EntityPool::new(),
            registry: ClassRegistry::new(config.static_arena_bytes),
            class_index: ClassIndex::new(),
            type_groups: TypeGroups::new(),
            foreach: ForeachStack::new(config.strict_foreach),
            editable_vars: EditableVarTable::new(),
            draw_list: DrawList::new(config.screen_count.clamp(1, SCREEN_COUNT)),
            cameras,
            pending_create: Vec::with_capacity(ENTITY_COUNT),
            awaiting_create: vec![false; ENTITY_COUNT].into_boxed_slice(),
            updated: vec![false; ENTITY_COUNT].into_boxed_slice(),
            paused: false,
            frozen: false,
            current_screen: 0,
            frame: 0,
        }
    }

    /// Creates a new world after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns the error of [`WorldConfig::validate`].
    pub fn from_config(config: &WorldConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Returns the class registry.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Returns the class registry mutably.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut ClassRegistry {
        &mut self.registry
    }

    /// Registers a class by payload and static-block size.
    ///
    /// Returns class 0 (and logs) if the class cannot be registered.
    pub fn register_object(
        &mut self,
        name: &str,
        entity_size: usize,
        static_size: usize,
        callbacks: ObjectCallbacks,
    ) -> ClassId {
        self.registry
            .register(name, entity_size, static_size, callbacks)
    }

    /// Registers a class with a typed payload and static block.
    ///
    /// Returns class 0 (and logs) if the class cannot be registered.
    pub fn register_class<P: Payload, S: Pod>(
        &mut self,
        name: &str,
        callbacks: ObjectCallbacks,
    ) -> ClassId {
        self.registry.register_class::<P, S>(name, callbacks)
    }

    /// Looks up a class by name, returning class 0 on a miss.
    #[must_use]
    pub fn get_object_by_name(&self, name: &str) -> ClassId {
        self.registry.get_by_name(name)
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn find_object_by_name(&self, name: &str) -> Option<ClassId> {
        self.registry.find_by_name(name)
    }

    /// Returns a class, clamping out-of-range ids.
    #[inline]
    #[must_use]
    pub fn class(&self, class_id: ClassId) -> &ObjectClass {
        self.registry.class(class_id)
    }

    /// Sets the flag gating a class's static update.
    pub fn set_class_active(&mut self, class_id: ClassId, active: ActiveFlag) {
        self.registry.set_active(class_id, active);
    }

    /// Views a class's static variables.
    #[must_use]
    pub fn static_vars<S: Pod>(&self, class_id: ClassId) -> Option<&S> {
        self.registry.static_vars(class_id)
    }

    /// Views a class's static variables mutably.
    pub fn static_vars_mut<S: Pod>(&mut self, class_id: ClassId) -> Option<&mut S> {
        self.registry.static_vars_mut(class_id)
    }

    /// Reserves a named global static-variable block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StaticArenaExhausted`](crate::CoreError::StaticArenaExhausted)
    /// when the block does not fit.
    pub fn register_static_variables(&mut self, name: &str, size: usize) -> CoreResult<StaticBlock> {
        self.registry.register_static_variables(name, size)
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Returns a slot's base record.
    #[inline]
    #[must_use]
    pub fn entity(&self, slot: SlotId) -> &Entity {
        self.pool.entity(slot)
    }

    /// Returns a slot's base record mutably.
    #[inline]
    pub fn entity_mut(&mut self, slot: SlotId) -> &mut Entity {
        self.pool.entity_mut(slot)
    }

    /// Returns the base record at a raw index, clamped to the last slot.
    #[inline]
    #[must_use]
    pub fn get_entity(&self, index: usize) -> &Entity {
        self.pool.entity(SlotId::clamped(index))
    }

    /// Returns the slot index of a base record, or 0 if it is not one of
    /// this world's records.
    #[must_use]
    pub fn get_entity_id(&self, entity: &Entity) -> u16 {
        self.pool.slot_of(entity).map_or(0, |slot| entity_id(slot.index()))
    }

    /// Views a slot's payload as `P`.
    ///
    /// # Returns
    ///
    /// None if the slot's class does not carry a `P` payload.
    #[must_use]
    pub fn payload<P: Pod>(&self, slot: SlotId) -> Option<&P> {
        let class = self.registry.class(self.pool.entity(slot).class_id);
        if !class.accepts_payload::<P>() {
            return None;
        }
        self.pool.payloads().get(slot.index())
    }

    /// Views a slot's payload as `P` mutably.
    pub fn payload_mut<P: Pod>(&mut self, slot: SlotId) -> Option<&mut P> {
        let class = self.registry.class(self.pool.entity(slot).class_id);
        if !class.accepts_payload::<P>() {
            return None;
        }
        self.pool.payloads_mut().get_mut(slot.index())
    }

    /// Borrows a slot's base record and payload together.
    pub fn entity_and_payload_mut<P: Pod>(
        &mut self,
        slot: SlotId,
    ) -> Option<(&mut Entity, &mut P)> {
        let class = self.registry.class(self.pool.entity(slot).class_id);
        if !class.accepts_payload::<P>() {
            return None;
        }
        let (entity, payloads) = self.pool.split_mut(slot);
        let payload = payloads.get_mut(slot.index())?;
        Some((entity, payload))
    }

    /// Counts the entities of a class.
    ///
    /// With `is_active`, only entities on the class's group list that still
    /// hold the class are counted; otherwise every slot of the class is.
    #[must_use]
    pub fn get_entity_count(&self, class_id: ClassId, is_active: bool) -> usize {
        let class_id = self.registry.clamp(class_id);
        if is_active {
            self.type_groups
                .list(GroupId::of_class(class_id))
                .map_or(0, |list| {
                    list.slots()
                        .iter()
                        .filter(|slot| self.pool.entity(**slot).class_id == class_id)
                        .count()
                })
        } else {
            self.class_index.list(class_id).len()
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Zeroes a slot and gives it a class, keeping the class index in step.
    fn reclassify(&mut self, slot: SlotId, class_id: ClassId) {
        let previous = self.pool.reset(slot, class_id);
        self.class_index.reclassify(slot, previous, class_id);
        self.awaiting_create[slot.index()] = false;

        if !class_id.is_default() {
            let entity = self.pool.entity_mut(slot);
            entity.interaction = true;
            entity.active_screens = ALL_SCREENS;
        }
    }

    /// Runs a freshly claimed slot's create callback.
    ///
    /// Classes without one become [`ActiveFlag::Normal`] and visible.
    fn run_create(&mut self, slot: SlotId, data: Option<&dyn Any>) {
        let class_id = self.pool.entity(slot).class_id;
        match self.registry.create_callback(class_id) {
            Some(create) => create(self, slot, data),
            None => {
                let entity = self.pool.entity_mut(slot);
                entity.active = ActiveFlag::Normal;
                entity.visible = true;
            }
        }
    }

    /// Creates an entity in the first free temporary slot (then scene slot).
    ///
    /// See [`World::create_entity_with`].
    pub fn create_entity(
        &mut self,
        class_id: ClassId,
        data: Option<&dyn Any>,
        position: Vector2,
    ) -> SlotId {
        self.create_entity_with(CreatePolicy::TempFirst, class_id, data, position)
    }

    /// Creates an entity.
    ///
    /// The slot is zeroed, given the class and position, and the class's
    /// create callback runs with `data`.
    ///
    /// # Returns
    ///
    /// The slot used. When no slot is free the fallback slot is reclassified
    /// and returned instead; its create callback does not run and it stays
    /// [`ActiveFlag::Never`], so overflow entities are inert.
    pub fn create_entity_with(
        &mut self,
        policy: CreatePolicy,
        class_id: ClassId,
        data: Option<&dyn Any>,
        position: Vector2,
    ) -> SlotId {
        let class_id = self.registry.clamp(class_id);

        let Some(slot) = self.pool.find_free(policy) else {
            warn!(
                "Entity pool exhausted creating {}; reusing slot {}",
                self.registry.class(class_id).name(),
                SlotId::FALLBACK.index()
            );
            self.reclassify(SlotId::FALLBACK, class_id);
            self.pool.entity_mut(SlotId::FALLBACK).position = position;
            return SlotId::FALLBACK;
        };

        self.reclassify(slot, class_id);
        let entity = self.pool.entity_mut(slot);
        entity.position = position;
        entity.interaction = true;
        self.run_create(slot, data);
        slot
    }

    /// Zeroes a slot and gives it a class without running create.
    ///
    /// Resetting to class 0 retires the slot. Behaviors may reset their own
    /// slot to become another class in place.
    pub fn reset_entity(&mut self, slot: SlotId, class_id: ClassId) {
        let class_id = self.registry.clamp(class_id);
        self.reclassify(slot, class_id);
    }

    /// As [`World::reset_entity`], addressing the slot by raw index.
    ///
    /// Out-of-range indices address the last slot.
    pub fn reset_entity_slot(&mut self, index: usize, class_id: ClassId) {
        self.reset_entity(SlotId::clamped(index), class_id);
    }

    /// Retires a slot.
    pub fn destroy_entity(&mut self, slot: SlotId) {
        self.reclassify(slot, ClassId::DEFAULT);
    }

    /// Copies base record and payload of `src` over `dest`.
    ///
    /// With `clear_src`, `src` is retired afterwards, even when it is `dest`.
    pub fn copy_entity(&mut self, dest: SlotId, src: SlotId, clear_src: bool) {
        let src_class = self.pool.entity(src).class_id;
        let previous = self.pool.copy(dest, src, clear_src);
        self.class_index.reclassify(dest, previous, src_class);
        self.awaiting_create[dest.index()] = self.awaiting_create[src.index()];
        if self.awaiting_create[dest.index()] {
            self.pending_create.push(dest);
        }

        if clear_src {
            self.class_index.reclassify(src, src_class, ClassId::DEFAULT);
            self.awaiting_create[src.index()] = false;
        }
    }

    /// Places a scene entity at a fixed slot, as a scene loader does.
    ///
    /// The payload may be filled in before the stage starts; the create
    /// callback runs during [`World::init_objects`].
    pub fn place_entity(&mut self, slot: SlotId, class_id: ClassId, position: Vector2) {
        let class_id = self.registry.clamp(class_id);
        self.reclassify(slot, class_id);
        self.pool.entity_mut(slot).position = position;
        if !class_id.is_default() {
            self.awaiting_create[slot.index()] = true;
            self.pending_create.push(slot);
        }
    }

    /// Starts a stage.
    ///
    /// In order:
    /// 1. Static variables are zeroed and static-update flags reset
    /// 2. Every class's stage-load callback runs
    /// 3. Every placed entity's create callback runs, in slot order
    /// 4. The group lists are rebuilt
    pub fn init_objects(&mut self) {
        self.registry.reset_stage();
        self.pool.rewind();

        let mut index = 0;
        while index < self.registry.len() {
            #[allow(clippy::cast_possible_truncation)]
            let class_id = ClassId::new(index as u16);
            if let Some(stage_load) = self.registry.stage_load_callback(class_id) {
                stage_load(self);
            }
            index += 1;
        }

        let mut pending = std::mem::take(&mut self.pending_create);
        pending.sort_unstable();
        pending.dedup();
        let placed = pending
            .iter()
            .filter(|slot| self.awaiting_create[slot.index()])
            .count();
        for slot in pending.drain(..) {
            // Slots reset, retired or reused since placement are skipped.
            if std::mem::take(&mut self.awaiting_create[slot.index()]) {
                self.pool.entity_mut(slot).interaction = true;
                self.run_create(slot, None);
            }
        }
        // Entities placed by create callbacks wait for the next stage start.
        pending.append(&mut self.pending_create);
        self.pending_create = pending;

        self.type_groups.rebuild(self.pool.iter_live());
        debug!(
            "Stage started: {} classes, {} placed entities",
            self.registry.len(),
            placed
        );
    }

    /// Retires every non-reserved slot.
    ///
    /// Group lists are rebuilt from the reserved slots alone.
    pub fn clear_stage_objects(&mut self) {
        for index in RESERVE_ENTITY_COUNT..ENTITY_COUNT {
            self.pool.reset(SlotId::clamped(index), ClassId::DEFAULT);
            self.awaiting_create[index] = false;
        }
        self.class_index.rebuild(self.pool.iter_live());
        self.type_groups.rebuild(self.pool.iter_live());
        self.pending_create.retain(|slot| slot.is_reserved());
        self.pool.rewind();
        self.draw_list.clear();
        debug!("Cleared stage objects");
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Advances an iteration over every slot of a class.
    ///
    /// Entities that change class during the iteration are skipped; entities
    /// of the class created ahead of the cursor are visited.
    ///
    /// # Panics
    ///
    /// In strict mode, panics when the foreach stack overflows, inner
    /// iterations were left open, or the cursor's iteration has closed.
    pub fn get_entities(&mut self, class_id: ClassId, cursor: &mut ForeachCursor) -> Option<SlotId> {
        self.foreach_next(ForeachSource::Class(class_id), cursor)
    }

    /// Advances an iteration over a group list as of the last scheduler pass.
    ///
    /// Entities that left the group or became [`ActiveFlag::Never`] since the
    /// list was built are skipped. Entities created since are not visited.
    ///
    /// # Panics
    ///
    /// As [`World::get_entities`].
    pub fn get_active_entities(
        &mut self,
        group: GroupId,
        cursor: &mut ForeachCursor,
    ) -> Option<SlotId> {
        self.foreach_next(ForeachSource::Group(group), cursor)
    }

    /// Closes the iteration `cursor` belongs to, for loops left early.
    ///
    /// The cursor is reset, so passing it to another iteration call starts
    /// a new loop from the beginning.
    ///
    /// # Panics
    ///
    /// In strict mode, panics when the cursor does not belong to an open
    /// iteration or inner iterations were left open.
    pub fn break_foreach_loop(&mut self, cursor: &mut ForeachCursor) {
        let frame = cursor.frame();
        cursor.detach();
        match frame {
            Some(frame) if self.foreach.is_live(frame) => {
                let inner = self.foreach.truncate(frame.depth + 1);
                if inner > 0 {
                    self.foreach_misuse(&format!(
                        "foreach loop at depth {} broken with {inner} inner loops left open",
                        frame.depth
                    ));
                }
                self.foreach.pop();
            }
            _ => self.foreach_misuse("break_foreach_loop called with no open loop"),
        }
    }

    /// Returns the number of open iterations.
    #[inline]
    #[must_use]
    pub fn foreach_depth(&self) -> usize {
        self.foreach.depth()
    }

    pub(super) fn foreach_misuse(&self, message: &str) {
        assert!(!self.foreach.is_strict(), "{message}");
        error!("{}", message);
    }

    fn foreach_next(&mut self, source: ForeachSource, cursor: &mut ForeachCursor) -> Option<SlotId> {
        let depth = match cursor.frame() {
            Some(frame) if self.foreach.is_live(frame) => {
                let inner = self.foreach.truncate(frame.depth + 1);
                if inner > 0 {
                    self.foreach_misuse(&format!(
                        "foreach loop at depth {} resumed with {inner} inner loops left open",
                        frame.depth
                    ));
                }
                frame.depth
            }
            stale => {
                if let Some(frame) = stale {
                    self.foreach_misuse(&format!(
                        "foreach cursor at depth {} refers to a closed loop",
                        frame.depth
                    ));
                    cursor.detach();
                }
                match self.foreach.push() {
                    Ok(frame) => {
                        cursor.attach(frame);
                        frame.depth
                    }
                    Err(e) => {
                        self.foreach_misuse(&e.to_string());
                        return None;
                    }
                }
            }
        };

        let mut from = self.foreach.resume_from(depth);
        loop {
            let next = match source {
                ForeachSource::Class(class_id) => self.class_index.list(class_id).first_from(from),
                ForeachSource::Group(group) => self
                    .type_groups
                    .list(group)
                    .and_then(|list| list.first_from(from)),
            };
            let Some(slot) = next else {
                self.foreach.pop();
                cursor.detach();
                return None;
            };
            from = slot.index() + 1;

            let entity = self.pool.entity(slot);
            let live = match source {
                ForeachSource::Class(class_id) => entity.class_id == class_id,
                ForeachSource::Group(group) => {
                    group.admits(entity) && entity.active != ActiveFlag::Never
                }
            };
            if live {
                self.foreach.record(depth, slot);
                return Some(slot);
            }
        }
    }

    // =========================================================================
    // Editor
    // =========================================================================

    /// Declares an editable payload variable; called from serialize callbacks.
    ///
    /// Declarations past the table's capacity are logged and ignored.
    pub fn set_editable_var(&mut self, var_type: VarType, name: &str, offset: usize) {
        if let Err(e) = self.editable_vars.push(var_type, name, offset) {
            error!("Ignoring editable variable {}: {}", name, e);
        }
    }

    /// Collects a class's editable variables by running its serialize callback.
    ///
    /// Variables reaching past the class's payload are kept but marked
    /// inactive.
    pub fn load_editable_vars(&mut self, class_id: ClassId) -> &[EditableVarInfo] {
        self.editable_vars.clear();
        if let Some(serialize) = self.registry.serialize_callback(class_id) {
            serialize(self);
        }

        let class = self.registry.class(class_id);
        for var in self.editable_vars.deactivate_outside(class.entity_size()) {
            error!(
                "Editable variable {} of {} at offset {} overruns its {}-byte payload",
                var.hash,
                class.name(),
                var.offset,
                class.entity_size()
            );
        }
        self.editable_vars.vars()
    }

    /// Returns the variables declared by the last serialize run.
    #[inline]
    #[must_use]
    pub const fn editable_vars(&self) -> &EditableVarTable {
        &self.editable_vars
    }

    /// Runs every class's editor-load callback.
    pub fn load_editor_objects(&mut self) {
        let mut index = 0;
        while index < self.registry.len() {
            #[allow(clippy::cast_possible_truncation)]
            let class_id = ClassId::new(index as u16);
            if let Some(editor_load) = self.registry.editor_load_callback(class_id) {
                editor_load(self);
            }
            index += 1;
        }
    }

    /// Runs a slot's editor-draw callback.
    pub fn draw_editor_entity(&mut self, slot: SlotId) {
        let class_id = self.pool.entity(slot).class_id;
        if let Some(editor_draw) = self.registry.editor_draw_callback(class_id) {
            editor_draw(self, slot);
        }
    }

    // =========================================================================
    // Frame state
    // =========================================================================

    /// Returns the cameras bounds are tested against.
    #[inline]
    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Replaces the cameras. Cameras past the fourth are ignored.
    pub fn set_cameras(&mut self, cameras: &[Camera]) {
        self.cameras.clear();
        self.cameras
            .extend(cameras.iter().copied().take(CAMERA_COUNT));
    }

    /// Returns a camera mutably.
    pub fn camera_mut(&mut self, index: usize) -> Option<&mut Camera> {
        self.cameras.get_mut(index)
    }

    /// Sets whether the game is paused.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether the game is paused.
    #[inline]
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets whether the game is frozen.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Whether the game is frozen.
    #[inline]
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Returns the number of completed scheduler passes.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}
