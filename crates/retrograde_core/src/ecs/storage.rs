//! # Payload Storage
//!
//! Pre-allocated, dense payload storage with zero runtime allocations.
//!
//! Every slot owns a fixed block of [`PAYLOAD_BYTES`] bytes, stored as
//! 8-byte words so that any payload with alignment of 8 or less can be viewed
//! in place.

use bytemuck::Pod;
use std::mem::size_of;

/// Number of 8-byte words per slot.
pub const PAYLOAD_WORDS: usize = 0x100;

/// Payload bytes available per slot.
pub const PAYLOAD_BYTES: usize = PAYLOAD_WORDS * size_of::<u64>();

/// Pre-allocated payload blocks for every entity slot.
pub struct PayloadStorage {
    /// The dense array of words, `PAYLOAD_WORDS` per slot.
    words: Box<[u64]>,
    /// Number of slots.
    capacity: usize,
}

impl PayloadStorage {
    /// Creates zeroed storage for `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            words: vec![0u64; capacity * PAYLOAD_WORDS].into_boxed_slice(),
            capacity,
        }
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn range(index: usize) -> std::ops::Range<usize> {
        index * PAYLOAD_WORDS..(index + 1) * PAYLOAD_WORDS
    }

    /// Returns the raw bytes of a slot.
    #[inline]
    #[must_use]
    pub fn bytes(&self, index: usize) -> &[u8] {
        bytemuck::cast_slice(&self.words[Self::range(index)])
    }

    /// Returns the raw bytes of a slot mutably.
    #[inline]
    pub fn bytes_mut(&mut self, index: usize) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words[Self::range(index)])
    }

    /// Views the start of a slot as `P`.
    ///
    /// # Returns
    ///
    /// None if `P` is larger than a slot or needs stricter alignment.
    #[inline]
    #[must_use]
    pub fn get<P: Pod>(&self, index: usize) -> Option<&P> {
        let bytes = self.bytes(index).get(..size_of::<P>())?;
        bytemuck::try_from_bytes(bytes).ok()
    }

    /// Views the start of a slot as `P` mutably.
    #[inline]
    pub fn get_mut<P: Pod>(&mut self, index: usize) -> Option<&mut P> {
        let bytes = self.bytes_mut(index).get_mut(..size_of::<P>())?;
        bytemuck::try_from_bytes_mut(bytes).ok()
    }

    /// Zeroes a slot.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        self.words[Self::range(index)].fill(0);
    }

    /// Copies the block of `src` over `dest`.
    #[inline]
    pub fn copy(&mut self, dest: usize, src: usize) {
        if dest != src {
            self.words.copy_within(Self::range(src), dest * PAYLOAD_WORDS);
        }
    }
}
