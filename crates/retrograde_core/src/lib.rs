//! # RETROGRADE Core
//!
//! The object core of a 2D game engine:
//! - A fixed table of 2368 entity slots, recycled in place
//! - A registry of named object classes with lifecycle callbacks
//! - An activation-flag scheduler with normal, paused and frozen passes
//! - Group lists and reentrant foreach iteration
//! - Per-screen draw lists ordered by layer
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot path** - All tables are pre-allocated
//! 2. **Slots, not handles** - An entity is its slot index
//! 3. **Fail soft** - Exhaustion logs and falls back to a sentinel
//!
//! ## Example
//!
//! ```rust,ignore
//! use retrograde_core::{ObjectCallbacks, Vector2, World, WorldConfig};
//!
//! let mut world = World::new(&WorldConfig::default());
//! let ring = world.register_object("Ring", 16, 0, ObjectCallbacks::new());
//! world.create_entity(ring, None, Vector2::from_pixels(64, 32));
//! world.step();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod math;
pub mod memory;
pub mod object;

pub use config::WorldConfig;
pub use ecs::{
    ActiveFlag, Camera, DrawEntry, DrawList, Entity, ForeachCursor, GroupId, Payload, SlotId,
    UpdatePass, World,
};
pub use error::{CoreError, CoreResult};
pub use math::Vector2;
pub use memory::{CreatePolicy, StaticBlock};
pub use object::{ClassId, EditableVarInfo, NameHash, ObjectCallbacks, ObjectClass, VarType};
