//! # Object Classes
//!
//! Named behavior types, their lifecycle callbacks and static variables.
//!
//! ## Design Philosophy
//!
//! - Classes are registered once; ids are stable indices
//! - Callbacks are optional and inherit from a parent class
//! - Lookups go through 128-bit name digests

mod class;
mod editable;
mod hash;
mod registry;

pub use class::{
    ClassCallback, ClassId, CreateCallback, EntityCallback, ObjectCallbacks, ObjectClass,
};
pub use editable::{EditableVarInfo, EditableVarTable, VarType};
pub use hash::NameHash;
pub use registry::{ClassRegistry, DEFAULT_OBJECT_NAME};
