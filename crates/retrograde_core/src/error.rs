//! # Core Error Types
//!
//! Errors raised by class registration, configuration loading and the
//! bounded engine tables. Gameplay paths (entity creation, iteration) never
//! return these; they log and fall back to a sentinel instead.

use thiserror::Error;

/// Errors that can occur in the object core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The class table already holds the maximum number of classes.
    #[error("class table full: {capacity} classes registered, cannot add {name:?}")]
    ClassTableFull {
        /// Name of the rejected class.
        name: String,
        /// Maximum number of classes.
        capacity: usize,
    },

    /// A class payload does not fit in an entity slot.
    #[error("payload of class {name:?} is {size} bytes, slot payload limit is {limit}")]
    PayloadTooLarge {
        /// Name of the rejected class.
        name: String,
        /// Requested payload size in bytes.
        size: usize,
        /// Bytes available per slot.
        limit: usize,
    },

    /// The static-variable arena has no room for another block.
    #[error("static arena exhausted for {name:?}: need {requested} bytes, {remaining} remaining")]
    StaticArenaExhausted {
        /// Name of the class or global block.
        name: String,
        /// Requested size in bytes.
        requested: usize,
        /// Bytes left in the arena.
        remaining: usize,
    },

    /// A class named a parent that is not registered yet.
    #[error("class {name:?} inherits from unregistered class {parent}")]
    UnknownParent {
        /// Name of the rejected class.
        name: String,
        /// The parent class id.
        parent: u16,
    },

    /// The editable-variable table is full.
    #[error("editable variable table full ({0} entries)")]
    EditableVarTableFull(usize),

    /// Too many nested foreach loops are open.
    #[error("foreach stack overflow: {0} loops already open")]
    ForeachOverflow(usize),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(String),

    /// The configuration is malformed or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for object-core operations.
pub type CoreResult<T> = Result<T, CoreError>;
