//! # Memory Management
//!
//! Pre-allocated slot tables and arenas for zero-allocation gameplay.
//!
//! ## Design Philosophy
//!
//! All memory is allocated once when the world is built. During gameplay:
//! - No heap allocations
//! - Entity slots are recycled in place
//! - Static variables live in one arena, zeroed per stage

mod arena;
mod pool;

pub use arena::{StaticArena, StaticBlock};
pub use pool::{CreatePolicy, EntityPool};
