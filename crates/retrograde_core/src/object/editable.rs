//! # Editable Variables
//!
//! A class's serialize callback declares which payload fields a level editor
//! or scene loader may set. Each declaration records the field's name digest,
//! byte offset within the payload and value type.

use crate::ecs::EDITABLEVAR_COUNT;
use crate::error::{CoreError, CoreResult};
use crate::object::NameHash;

/// Value type of an editable variable.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarType {
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Enumeration stored as a 32-bit integer.
    Enum,
    /// Boolean stored as a 32-bit integer.
    Bool,
    /// Handle into the host's string table, stored as a 32-bit index.
    String,
    /// Fixed-point 2D vector.
    Vector2,
    /// 32-bit float.
    Float,
    /// Packed RGB color.
    Color,
}

impl VarType {
    /// Size of a value of this type within a payload, in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32
            | Self::I32
            | Self::Enum
            | Self::Bool
            | Self::String
            | Self::Float
            | Self::Color => 4,
            Self::Vector2 => 8,
        }
    }
}

/// One declared editable variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditableVarInfo {
    /// Digest of the variable name.
    pub hash: NameHash,
    /// Byte offset of the field within the class payload.
    pub offset: usize,
    /// Value type.
    pub var_type: VarType,
    /// Whether the variable is live.
    pub active: bool,
}

impl EditableVarInfo {
    fn deactivate(&mut self) -> &Self {
        self.active = false;
        self
    }
}

/// The editable-variable table of the class currently being serialized.
///
/// One entry is kept in reserve, so at most `EDITABLEVAR_COUNT - 1`
/// variables can be declared.
pub struct EditableVarTable {
    vars: Vec<EditableVarInfo>,
}

impl Default for EditableVarTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableVarTable {
    /// Maximum number of declared variables.
    pub const CAPACITY: usize = EDITABLEVAR_COUNT - 1;

    /// Creates an empty table with all storage pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vars: Vec::with_capacity(Self::CAPACITY),
        }
    }

    /// Declares a variable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EditableVarTableFull`] once the table holds
    /// [`Self::CAPACITY`] entries; the table is left unchanged.
    pub fn push(&mut self, var_type: VarType, name: &str, offset: usize) -> CoreResult<()> {
        if self.vars.len() >= Self::CAPACITY {
            return Err(CoreError::EditableVarTableFull(self.vars.len()));
        }
        self.vars.push(EditableVarInfo {
            hash: NameHash::of(name),
            offset,
            var_type,
            active: true,
        });
        Ok(())
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.vars.clear();
    }

    /// Returns the declared variables in declaration order.
    #[must_use]
    pub fn vars(&self) -> &[EditableVarInfo] {
        &self.vars
    }

    /// Marks inactive every variable that does not fit in a payload of
    /// `payload_size` bytes.
    ///
    /// # Returns
    ///
    /// The variables deactivated by this call. Entries are only updated as
    /// the iterator is consumed.
    pub fn deactivate_outside(&mut self, payload_size: usize) -> impl Iterator<Item = &EditableVarInfo> {
        self.vars
            .iter_mut()
            .filter(move |var| var.active && var.offset + var.var_type.size() > payload_size)
            .map(EditableVarInfo::deactivate)
    }

    /// Looks up a variable by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&EditableVarInfo> {
        let hash = NameHash::of(name);
        self.vars.iter().find(|var| var.hash == hash)
    }

    /// Returns the number of declared variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Declares a payload field as editable from inside a serialize callback.
///
/// The offset is taken from the field's position within the payload type.
///
/// # Example
///
/// ```rust,ignore
/// ObjectCallbacks::new().serialize(|world| {
///     editable_var!(world, Ring, VarType::Enum, ring_type);
///     editable_var!(world, Ring, VarType::Vector2, amplitude);
/// })
/// ```
#[macro_export]
macro_rules! editable_var {
    ($world:expr, $payload:ty, $var_type:expr, $field:ident) => {
        $world.set_editable_var(
            $var_type,
            stringify!($field),
            ::core::mem::offset_of!($payload, $field),
        )
    };
}
