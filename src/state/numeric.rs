//! User numeric allocation for locally connected clients.

use crate::error::RegistryError;
use p10_proto::{MAX_USER_NUMERIC, UserNumeric};
use roaring::RoaringBitmap;

/// Hands out user numerics from a bounded space.
///
/// The cursor rotates past the last allocation so a numeric freed by a quit
/// is not reissued until the rest of the space has been tried. Messages for
/// a departed client that are still in flight cannot land on a newcomer.
#[derive(Debug)]
pub struct NumericAllocator {
    used: RoaringBitmap,
    capacity: u32,
    cursor: u32,
}

impl NumericAllocator {
    /// Create an allocator for `capacity` numerics, clamped to `1..=262144`.
    pub fn new(capacity: u32) -> Self {
        Self {
            used: RoaringBitmap::new(),
            capacity: capacity.clamp(1, MAX_USER_NUMERIC + 1),
            cursor: 0,
        }
    }

    /// Size of the numeric space.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Numerics currently handed out.
    pub fn in_use(&self) -> u64 {
        self.used.len()
    }

    /// Allocate the next free numeric at or after the cursor.
    pub fn allocate(&mut self) -> Result<UserNumeric, RegistryError> {
        if self.used.len() >= u64::from(self.capacity) {
            return Err(RegistryError::NumericSpaceExhausted {
                capacity: self.capacity,
            });
        }

        let free = (self.cursor..self.capacity)
            .chain(0..self.cursor)
            .find(|n| !self.used.contains(*n))
            .ok_or(RegistryError::NumericSpaceExhausted {
                capacity: self.capacity,
            })?;

        let numeric = UserNumeric::new(free)?;
        self.used.insert(free);
        self.cursor = (free + 1) % self.capacity;
        Ok(numeric)
    }

    /// Return a numeric to the pool. Returns `false` if it was not allocated.
    pub fn release(&mut self, numeric: UserNumeric) -> bool {
        self.used.remove(numeric.value())
    }

    /// Whether `numeric` is currently allocated.
    pub fn is_allocated(&self, numeric: UserNumeric) -> bool {
        self.used.contains(numeric.value())
    }
}
