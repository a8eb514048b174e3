//! # Static Arena
//!
//! A bump allocator holding every class's static variables, plus any named
//! global blocks. Blocks are handed out once at registration and the whole
//! arena is zeroed when a stage starts.

use bytemuck::Pod;
use std::mem::size_of;

/// Alignment of every block, in bytes.
const BLOCK_ALIGN: usize = size_of::<u64>();

/// A region of the static arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticBlock {
    offset: usize,
    len: usize,
}

impl StaticBlock {
    /// An empty block.
    pub const EMPTY: Self = Self { offset: 0, len: 0 };

    /// Returns the block length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Whether the block holds no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns the byte offset of the block within its arena.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }
}

/// A bump-pointer arena for static variables.
///
/// Reservations are fast (just bump an offset). Memory is released all at
/// once when the arena is reset.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = StaticArena::new(1024 * 1024); // 1MB
///
/// let block = arena.reserve(64).expect("room for 64 bytes");
/// arena.get_mut::<RingStatics>(block).unwrap().pan = 0x40;
///
/// // Next stage: same blocks, zeroed contents
/// arena.zero();
/// ```
pub struct StaticArena {
    /// The backing storage, as words so blocks are 8-byte aligned.
    storage: Box<[u64]>,
    /// Current reservation offset in bytes.
    offset: usize,
    /// Total capacity in bytes.
    capacity: usize,
}

impl StaticArena {
    /// Creates a new arena with the specified capacity in bytes.
    ///
    /// The capacity is rounded up to a whole number of 8-byte words.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total size in bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let words = capacity.div_ceil(BLOCK_ALIGN);
        Self {
            storage: vec![0u64; words].into_boxed_slice(),
            offset: 0,
            capacity: words * BLOCK_ALIGN,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current used space in bytes.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.offset
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.capacity - self.offset
    }

    /// Reserves a zeroed block of `len` bytes.
    ///
    /// # Returns
    ///
    /// The block, or None if the arena is out of space.
    pub fn reserve(&mut self, len: usize) -> Option<StaticBlock> {
        let padded = len.checked_next_multiple_of(BLOCK_ALIGN)?;
        if padded > self.remaining() {
            return None;
        }

        let block = StaticBlock {
            offset: self.offset,
            len,
        };
        self.offset += padded;
        Some(block)
    }

    /// Returns the bytes of a block.
    #[inline]
    #[must_use]
    pub fn bytes(&self, block: StaticBlock) -> &[u8] {
        let bytes: &[u8] = bytemuck::cast_slice(&self.storage);
        &bytes[block.offset..block.offset + block.len]
    }

    /// Returns the bytes of a block mutably.
    #[inline]
    pub fn bytes_mut(&mut self, block: StaticBlock) -> &mut [u8] {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.storage);
        &mut bytes[block.offset..block.offset + block.len]
    }

    /// Views the start of a block as `S`.
    ///
    /// # Returns
    ///
    /// None if `S` is larger than the block or needs stricter alignment.
    #[inline]
    #[must_use]
    pub fn get<S: Pod>(&self, block: StaticBlock) -> Option<&S> {
        let bytes = self.bytes(block).get(..size_of::<S>())?;
        bytemuck::try_from_bytes(bytes).ok()
    }

    /// Views the start of a block as `S` mutably.
    #[inline]
    pub fn get_mut<S: Pod>(&mut self, block: StaticBlock) -> Option<&mut S> {
        let bytes = self.bytes_mut(block).get_mut(..size_of::<S>())?;
        bytemuck::try_from_bytes_mut(bytes).ok()
    }

    /// Zeroes every reserved block. Reservations stay valid.
    pub fn zero(&mut self) {
        let used_words = self.offset / BLOCK_ALIGN;
        self.storage[..used_words].fill(0);
    }
}
