//! # Entity Slots
//!
//! Every live game object occupies one slot of a fixed table. A slot holds
//! the common base record defined here plus a class-specific payload.
//!
//! ## Slot Layout
//!
//! ```text
//! 0 ........ 63 | 64 ............ 2111 | 2112 ........ 2367
//!   reserved    |  scene objects       |  temporary objects
//! ```
//!
//! Slot 2367 is the fallback slot: it is never handed out while the pool has
//! room and receives any request that could not be satisfied.

use crate::math::Vector2;
use crate::object::ClassId;

/// Number of reserved slots at the start of the table.
pub const RESERVE_ENTITY_COUNT: usize = 0x40;

/// Number of scene slots.
pub const SCENE_ENTITY_COUNT: usize = 0x800;

/// Number of temporary slots, the fallback slot included.
pub const TEMP_ENTITY_COUNT: usize = 0x100;

/// Total number of entity slots.
pub const ENTITY_COUNT: usize = RESERVE_ENTITY_COUNT + SCENE_ENTITY_COUNT + TEMP_ENTITY_COUNT;

/// First slot of the temporary region.
pub const TEMP_ENTITY_START: usize = ENTITY_COUNT - TEMP_ENTITY_COUNT;

/// Number of class slots.
pub const TYPE_COUNT: usize = 0x100;

/// Number of group lists (one per class plus four custom groups).
pub const TYPEGROUP_COUNT: usize = TYPE_COUNT + 4;

/// Maximum nesting depth of foreach loops.
pub const FOREACH_STACK_COUNT: usize = 0x400;

/// Capacity of the editable-variable table.
pub const EDITABLEVAR_COUNT: usize = 0x100;

/// Update policy of an entity, or of a class's static update.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActiveFlag {
    /// Never updated.
    #[default]
    Never = 0,
    /// Updated in every pass, including paused and frozen ones.
    Always,
    /// Updated in normal passes.
    Normal,
    /// Updated only while the game is paused.
    Paused,
    /// Updated when within range of a camera on both axes.
    Bounds,
    /// Updated when within range of a camera horizontally.
    XBounds,
    /// Updated when within range of a camera vertically.
    YBounds,
    /// Updated when within a radius of a camera.
    RBounds,
}

impl ActiveFlag {
    /// Every flag, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Never,
        Self::Always,
        Self::Normal,
        Self::Paused,
        Self::Bounds,
        Self::XBounds,
        Self::YBounds,
        Self::RBounds,
    ];

    /// Whether eligibility depends on camera distance.
    #[inline]
    #[must_use]
    pub const fn is_bounds(self) -> bool {
        matches!(
            self,
            Self::Bounds | Self::XBounds | Self::YBounds | Self::RBounds
        )
    }
}

/// Index of an entity slot, always in range.
///
/// Raw indices are clamped on conversion: anything past the table maps to
/// the last slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SlotId(u16);

impl SlotId {
    /// The last slot, used as the fallback when the pool is exhausted.
    #[allow(clippy::cast_possible_truncation)]
    pub const FALLBACK: Self = Self((ENTITY_COUNT - 1) as u16);

    /// Converts a raw index, clamping to the last slot.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn clamped(index: usize) -> Self {
        if index < ENTITY_COUNT {
            Self(index as u16)
        } else {
            Self::FALLBACK
        }
    }

    /// Converts a raw index, rejecting anything out of range.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(index: usize) -> Option<Self> {
        if index < ENTITY_COUNT {
            Some(Self(index as u16))
        } else {
            None
        }
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the slot index as stored in engine tables.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Whether this slot lies in the reserved region.
    #[inline]
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.index() < RESERVE_ENTITY_COUNT
    }

    /// Whether this slot lies in the temporary region.
    #[inline]
    #[must_use]
    pub const fn is_temporary(self) -> bool {
        self.index() >= TEMP_ENTITY_START
    }
}

/// Returns the slot id for a raw reference, or 0 if it is out of range.
///
/// Slot 0 is a valid slot, so callers that need to distinguish a miss must
/// check the range themselves (or use [`SlotId::new`]).
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn entity_id(index: usize) -> u16 {
    if index < ENTITY_COUNT {
        index as u16
    } else {
        0
    }
}

/// The common base record of every entity slot.
///
/// A zeroed record (the [`Default`]) is an inert slot of class 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Entity {
    /// World position (fixed-point).
    pub position: Vector2,
    /// Draw scale (fixed-point, 0x200 is 1:1).
    pub scale: Vector2,
    /// Velocity (fixed-point).
    pub velocity: Vector2,
    /// Distance from a camera within which the entity stays in range.
    pub update_range: Vector2,
    /// Rotation angle.
    pub angle: i32,
    /// Blend alpha.
    pub alpha: i32,
    /// Draw rotation.
    pub rotation: i32,
    /// Ground speed.
    pub ground_vel: i32,
    /// Depth for 3D scenes.
    pub depth: i32,
    /// Custom group (`0x100..0x104`), or 0 for none.
    pub group: u16,
    pub(crate) class_id: ClassId,
    /// Whether the last scheduler pass found the entity in range.
    pub in_range: bool,
    /// Marks the slot as occupied even when its class is 0.
    pub is_permanent: bool,
    /// Whether tile collisions apply.
    pub tile_collisions: bool,
    /// Whether the entity joins the group lists.
    pub interaction: bool,
    /// Whether the entity is on the ground.
    pub on_ground: bool,
    /// Update policy.
    pub active: ActiveFlag,
    /// Scene filter mask.
    pub filter: u8,
    /// Facing direction flags.
    pub direction: u8,
    /// Draw layer (lower draws first).
    pub draw_order: u8,
    /// Collision layer mask.
    pub collision_layers: u8,
    /// Collision plane.
    pub collision_plane: u8,
    /// Collision mode.
    pub collision_mode: u8,
    /// Draw effect flags.
    pub draw_fx: u8,
    /// Ink effect.
    pub ink_effect: u8,
    /// Whether the entity is placed on the draw lists.
    pub visible: bool,
    /// Bitmask of screens the entity is drawn on.
    pub active_screens: u8,
}

impl Entity {
    /// Returns the class occupying this slot.
    #[inline]
    #[must_use]
    pub const fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Whether the slot is free for allocation.
    ///
    /// A slot is free when it holds class 0 and is not marked permanent.
    #[inline]
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.class_id.is_default() && !self.is_permanent
    }
}
