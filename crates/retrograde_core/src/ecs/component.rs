//! # Entity Payloads
//!
//! Each class stores its own fields after the common base record. Payloads
//! are pure data: they are zeroed on every reset and copied bitwise when a
//! slot is copied.

use bytemuck::{Pod, Zeroable};

/// Marker trait for class payloads.
///
/// Payloads must be:
/// - `Pod`: Plain old data, so a zeroed slot is a valid value
/// - `Default`: The default should equal the zeroed value
/// - At most [`PAYLOAD_BYTES`](super::PAYLOAD_BYTES) large, with alignment of 8 or less
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Ring {
///     ring_type: i32,
///     timer: i32,
/// }
///
/// impl Payload for Ring {}
/// ```
pub trait Payload: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Size of the payload in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

/// Classes without fields of their own.
impl Payload for () {}
