//! # Entity Pool
//!
//! The fixed table of entity slots. Slots are never allocated or freed on the
//! heap: a slot is "free" when it holds the default class, and allocation is
//! a scan for such a slot.

use crate::ecs::{
    Entity, PayloadStorage, SlotId, ENTITY_COUNT, RESERVE_ENTITY_COUNT, TEMP_ENTITY_START,
};
use crate::object::ClassId;

/// Number of temporary slots handed out round-robin (the fallback slot excluded).
const TEMP_RING_LEN: usize = ENTITY_COUNT - 1 - TEMP_ENTITY_START;

/// Which region a new entity is taken from first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CreatePolicy {
    /// Temporary region first (round-robin), then the scene region.
    #[default]
    TempFirst,
    /// Scene region first (lowest free slot), then the temporary region.
    SceneFirst,
}

/// The entity slot table.
///
/// All memory is pre-allocated at creation: [`ENTITY_COUNT`] base records
/// and as many payload blocks.
pub struct EntityPool {
    /// Base records.
    entities: Box<[Entity]>,
    /// Class payloads, one block per slot.
    payloads: PayloadStorage,
    /// Next offset into the temporary ring.
    temp_cursor: usize,
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityPool {
    /// Creates a pool with every slot free.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: vec![Entity::default(); ENTITY_COUNT].into_boxed_slice(),
            payloads: PayloadStorage::new(ENTITY_COUNT),
            temp_cursor: 0,
        }
    }

    /// Returns the total number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    /// Returns a slot's base record.
    #[inline]
    #[must_use]
    pub fn entity(&self, slot: SlotId) -> &Entity {
        &self.entities[slot.index()]
    }

    /// Returns a slot's base record mutably.
    #[inline]
    pub fn entity_mut(&mut self, slot: SlotId) -> &mut Entity {
        &mut self.entities[slot.index()]
    }

    /// Returns the slot a base record lives in.
    ///
    /// # Returns
    ///
    /// None if `entity` is not a record of this pool.
    #[must_use]
    pub fn slot_of(&self, entity: &Entity) -> Option<SlotId> {
        let start = self.entities.as_ptr() as usize;
        let offset = (std::ptr::from_ref(entity) as usize).checked_sub(start)?;
        let size = std::mem::size_of::<Entity>();
        if offset % size != 0 {
            return None;
        }
        SlotId::new(offset / size)
    }

    /// Returns the payload storage.
    #[inline]
    #[must_use]
    pub const fn payloads(&self) -> &PayloadStorage {
        &self.payloads
    }

    /// Returns the payload storage mutably.
    #[inline]
    pub fn payloads_mut(&mut self) -> &mut PayloadStorage {
        &mut self.payloads
    }

    /// Returns a slot's base record and the payload storage, both mutably.
    #[inline]
    pub fn split_mut(&mut self, slot: SlotId) -> (&mut Entity, &mut PayloadStorage) {
        (&mut self.entities[slot.index()], &mut self.payloads)
    }

    /// Zeroes a slot and assigns it a class.
    ///
    /// # Returns
    ///
    /// The class the slot held before.
    pub fn reset(&mut self, slot: SlotId, class_id: ClassId) -> ClassId {
        let entity = &mut self.entities[slot.index()];
        let previous = entity.class_id;
        *entity = Entity::default();
        entity.class_id = class_id;
        self.payloads.clear(slot.index());
        previous
    }

    /// Copies base record and payload of `src` over `dest`.
    ///
    /// With `clear_src`, `src` is zeroed afterwards (becoming a free slot),
    /// so copying a slot onto itself with `clear_src` frees it.
    ///
    /// # Returns
    ///
    /// The class `dest` held before the copy.
    pub fn copy(&mut self, dest: SlotId, src: SlotId, clear_src: bool) -> ClassId {
        let previous = self.entities[dest.index()].class_id;
        self.entities[dest.index()] = self.entities[src.index()];
        self.payloads.copy(dest.index(), src.index());

        if clear_src {
            self.reset(src, ClassId::DEFAULT);
        }
        previous
    }

    /// Finds a free slot for a new entity, without claiming it.
    ///
    /// The temporary region is searched round-robin from where the previous
    /// search ended; the scene region is searched from its lowest slot. The
    /// reserved region and the fallback slot are never returned.
    ///
    /// # Returns
    ///
    /// A free slot, or None if both regions are full.
    pub fn find_free(&mut self, policy: CreatePolicy) -> Option<SlotId> {
        match policy {
            CreatePolicy::TempFirst => self.find_free_temp().or_else(|| self.find_free_scene()),
            CreatePolicy::SceneFirst => self.find_free_scene().or_else(|| self.find_free_temp()),
        }
    }

    fn find_free_temp(&mut self) -> Option<SlotId> {
        for step in 0..TEMP_RING_LEN {
            let offset = (self.temp_cursor + step) % TEMP_RING_LEN;
            let index = TEMP_ENTITY_START + offset;
            if self.entities[index].is_free() {
                self.temp_cursor = (offset + 1) % TEMP_RING_LEN;
                return SlotId::new(index);
            }
        }
        None
    }

    fn find_free_scene(&self) -> Option<SlotId> {
        (RESERVE_ENTITY_COUNT..TEMP_ENTITY_START)
            .find(|&index| self.entities[index].is_free())
            .and_then(SlotId::new)
    }

    /// Restarts the temporary ring at its first slot.
    pub fn rewind(&mut self) {
        self.temp_cursor = 0;
    }

    /// Iterates over every slot in table order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(index, entity)| (SlotId::clamped(index), entity))
    }

    /// Iterates over the slots holding a non-default class.
    pub fn iter_live(&self) -> impl Iterator<Item = (SlotId, &Entity)> {
        self.iter()
            .filter(|(_, entity)| !entity.class_id.is_default())
    }
}
