//! # Group Lists
//!
//! Two indexes over the slot table, both kept in ascending slot order:
//!
//! - [`ClassIndex`]: every slot of each class, patched on every
//!   reclassification so that class iteration always sees live membership.
//! - [`TypeGroups`]: the interacting, in-range entities of each class plus
//!   the "all" group and four custom groups, rebuilt once per scheduler pass.

use super::entity::{Entity, SlotId, ENTITY_COUNT, TYPEGROUP_COUNT, TYPE_COUNT};
use crate::object::ClassId;

/// Index of a group list.
///
/// Groups `1..0x100` hold one class each, group 0 holds every class and
/// groups `0x100..0x104` are custom groups entities opt into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct GroupId(u16);

impl GroupId {
    /// Every interacting, in-range entity.
    pub const ALL: Self = Self(0);
    /// First custom group.
    #[allow(clippy::cast_possible_truncation)]
    pub const CUSTOM0: Self = Self(TYPE_COUNT as u16);
    /// Second custom group.
    #[allow(clippy::cast_possible_truncation)]
    pub const CUSTOM1: Self = Self(TYPE_COUNT as u16 + 1);
    /// Third custom group.
    #[allow(clippy::cast_possible_truncation)]
    pub const CUSTOM2: Self = Self(TYPE_COUNT as u16 + 2);
    /// Fourth custom group.
    #[allow(clippy::cast_possible_truncation)]
    pub const CUSTOM3: Self = Self(TYPE_COUNT as u16 + 3);

    /// Wraps a raw group index.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The group holding a single class.
    #[inline]
    #[must_use]
    pub const fn of_class(class_id: ClassId) -> Self {
        Self(class_id.raw())
    }

    /// Returns the raw group index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the group as a table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the custom groups.
    #[inline]
    #[must_use]
    pub const fn is_custom(self) -> bool {
        self.index() >= TYPE_COUNT && self.index() < TYPEGROUP_COUNT
    }

    /// Whether an entity belongs in this group, ignoring range.
    #[must_use]
    pub const fn admits(self, entity: &Entity) -> bool {
        if entity.class_id.is_default() {
            return false;
        }
        if self.0 == Self::ALL.0 {
            true
        } else if self.is_custom() {
            entity.group == self.0
        } else {
            entity.class_id.raw() == self.0
        }
    }
}

impl From<ClassId> for GroupId {
    fn from(class_id: ClassId) -> Self {
        Self::of_class(class_id)
    }
}

/// An ascending list of slots.
#[derive(Clone, Debug, Default)]
pub struct SlotList {
    slots: Vec<SlotId>,
}

impl SlotList {
    /// Creates an empty list able to hold every slot without reallocating.
    #[must_use]
    pub fn with_full_capacity() -> Self {
        Self {
            slots: Vec::with_capacity(ENTITY_COUNT),
        }
    }

    /// Returns the slots in ascending order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the list is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the first slot at or after `from`.
    #[inline]
    #[must_use]
    pub fn first_from(&self, from: usize) -> Option<SlotId> {
        let at = self.slots.partition_point(|slot| slot.index() < from);
        self.slots.get(at).copied()
    }

    /// Inserts a slot, keeping the order. Duplicates are ignored.
    pub fn insert(&mut self, slot: SlotId) {
        if let Err(at) = self.slots.binary_search(&slot) {
            self.slots.insert(at, slot);
        }
    }

    /// Removes a slot if present.
    pub fn remove(&mut self, slot: SlotId) {
        if let Ok(at) = self.slots.binary_search(&slot) {
            self.slots.remove(at);
        }
    }

    /// Appends a slot known to be greater than every slot in the list.
    #[inline]
    fn push(&mut self, slot: SlotId) {
        debug_assert!(self.slots.last().map_or(true, |last| *last < slot));
        self.slots.push(slot);
    }

    /// Empties the list, keeping its storage.
    #[inline]
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Live membership of every class.
pub struct ClassIndex {
    lists: Box<[SlotList]>,
}

impl Default for ClassIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassIndex {
    /// Creates an empty index with all storage pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lists: (0..TYPE_COUNT)
                .map(|_| SlotList::with_full_capacity())
                .collect(),
        }
    }

    /// Returns the slots of a class.
    #[inline]
    #[must_use]
    pub fn list(&self, class_id: ClassId) -> &SlotList {
        &self.lists[class_id.index().min(TYPE_COUNT - 1)]
    }

    /// Moves a slot from one class to another. Class 0 is not tracked.
    pub fn reclassify(&mut self, slot: SlotId, from: ClassId, to: ClassId) {
        if from == to {
            return;
        }
        if !from.is_default() {
            self.lists[from.index()].remove(slot);
        }
        if !to.is_default() {
            self.lists[to.index()].insert(slot);
        }
    }

    /// Rebuilds every list from the slot table.
    pub fn rebuild<'a>(&mut self, entities: impl Iterator<Item = (SlotId, &'a Entity)>) {
        for list in self.lists.iter_mut() {
            list.clear();
        }
        for (slot, entity) in entities {
            if !entity.class_id.is_default() {
                self.lists[entity.class_id.index()].push(slot);
            }
        }
    }
}

/// The per-pass group lists.
pub struct TypeGroups {
    lists: Box<[SlotList]>,
}

impl Default for TypeGroups {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGroups {
    /// Creates empty group lists with all storage pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lists: (0..TYPEGROUP_COUNT)
                .map(|_| SlotList::with_full_capacity())
                .collect(),
        }
    }

    /// Returns a group list, or None for an out-of-range group.
    #[inline]
    #[must_use]
    pub fn list(&self, group: GroupId) -> Option<&SlotList> {
        self.lists.get(group.index())
    }

    /// Empties every group.
    pub fn clear(&mut self) {
        for list in self.lists.iter_mut() {
            list.clear();
        }
    }

    /// Rebuilds every group from the slot table.
    ///
    /// An entity joins groups only while it is in range and interacting.
    pub fn rebuild<'a>(&mut self, entities: impl Iterator<Item = (SlotId, &'a Entity)>) {
        self.clear();
        for (slot, entity) in entities {
            self.add(slot, entity);
        }
    }

    fn add(&mut self, slot: SlotId, entity: &Entity) {
        if entity.class_id.is_default() || !entity.in_range || !entity.interaction {
            return;
        }
        self.lists[GroupId::ALL.index()].push(slot);
        self.lists[entity.class_id.index()].push(slot);

        let custom = GroupId::from_raw(entity.group);
        if custom.is_custom() {
            self.lists[custom.index()].push(slot);
        }
    }
}
