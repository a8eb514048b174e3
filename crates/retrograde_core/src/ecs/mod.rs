//! # Object Core
//!
//! Fixed entity slots, class-grouped iteration and the per-frame scheduler.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated at world creation
//! - An entity is a slot index; class 0 marks a free slot
//! - Group lists are rebuilt once per pass, class lists patched in place
//! - Callbacks get `&mut World`, so behaviors may reshape the world mid-pass

mod camera;
mod component;
mod draw;
mod entity;
mod foreach;
mod group;
mod scheduler;
mod storage;
mod world;

pub use camera::{Camera, CAMERA_COUNT, SCREEN_COUNT, SCREEN_XSIZE, SCREEN_YSIZE};
pub use component::Payload;
pub use draw::{DrawEntry, DrawList, DRAW_ORDER_COUNT};
pub use entity::{
    entity_id, ActiveFlag, Entity, SlotId, EDITABLEVAR_COUNT, ENTITY_COUNT, FOREACH_STACK_COUNT,
    RESERVE_ENTITY_COUNT, SCENE_ENTITY_COUNT, TEMP_ENTITY_COUNT, TEMP_ENTITY_START,
    TYPEGROUP_COUNT, TYPE_COUNT,
};
pub use foreach::{ForeachCursor, ForeachStack};
pub use group::{ClassIndex, GroupId, SlotList, TypeGroups};
pub use scheduler::{bounds_test, in_range, runs_update, UpdatePass};
pub use storage::{PayloadStorage, PAYLOAD_BYTES, PAYLOAD_WORDS};
pub use world::World;
