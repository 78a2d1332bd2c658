use std::{num::NonZeroU32, ops::RangeInclusive};

use derive_more::Display;

use crate::errors::{ChainError, Result};

/// An inclusive range of chain lengths, where `min <= max` and neither bound is zero
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("{min}..={max}")]
pub struct LengthBound {
    min: NonZeroU32,
    max: NonZeroU32,
}

impl LengthBound {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        let invalid_range = || ChainError::invalid_range(min, max);
        let min_length = NonZeroU32::new(min).ok_or_else(invalid_range)?;
        let max_length = NonZeroU32::new(max).ok_or_else(invalid_range)?;

        if min_length > max_length {
            return Err(Box::new(invalid_range()));
        }

        Ok(Self {
            min: min_length,
            max: max_length,
        })
    }

    #[must_use]
    pub const fn min(&self) -> NonZeroU32 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> NonZeroU32 {
        self.max
    }

    /// The number of distinct chain lengths in this bound, which is never zero
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.max.get() - self.min.get()) as usize + 1
    }

    pub(crate) const fn lengths(&self) -> RangeInclusive<u32> {
        self.min.get()..=self.max.get()
    }
}
