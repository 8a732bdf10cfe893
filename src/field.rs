//! # Bitfield Codec
//!
//! Pure pack/unpack helpers for register fields. A [`Field`] knows its
//! shift and width; packing a value zero-extends it and places it at the
//! shift, unpacking extracts and right-shifts it back.
//!
//! ## Overflow policy
//!
//! The controller itself silently drops high bits, so [`Field::pack`]
//! truncates. [`Field::try_pack`] rejects instead. Which one a controller
//! uses is chosen with [`FieldPolicy`] on the handle.

use serde::{Deserialize, Serialize};

use crate::{DsimError, DsimResult};

/// A bitfield inside a 32-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    shift: u8,
    width: u8,
}

impl Field {
    /// Create a field; `shift + width` must not exceed 32
    pub const fn new(name: &'static str, shift: u8, width: u8) -> Self {
        assert!(width > 0 && shift as u32 + width as u32 <= 32);
        Self { name, shift, width }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn shift(&self) -> u8 {
        self.shift
    }

    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u32 {
        ((1u64 << self.width) - 1) as u32
    }

    /// Field mask in register position
    pub const fn mask(&self) -> u32 {
        self.max_value() << self.shift
    }

    /// Place `value` at the field position, dropping bits above the width
    #[inline]
    pub const fn pack(&self, value: u32) -> u32 {
        (value & self.max_value()) << self.shift
    }

    /// Place `value` at the field position, rejecting values that do not fit
    pub const fn try_pack(&self, value: u32) -> DsimResult<u32> {
        if value > self.max_value() {
            return Err(DsimError::FieldOverflow {
                field: self.name,
                value,
                width: self.width,
            });
        }
        Ok(value << self.shift)
    }

    /// Extract the field from a raw register word
    #[inline]
    pub const fn unpack(&self, raw: u32) -> u32 {
        (raw >> self.shift) & self.max_value()
    }

    /// Replace the field inside `raw`, leaving every other bit untouched
    #[inline]
    pub const fn insert(&self, raw: u32, value: u32) -> u32 {
        (raw & !self.mask()) | self.pack(value)
    }

    /// Pack according to `policy`
    pub const fn encode(&self, value: u32, policy: FieldPolicy) -> DsimResult<u32> {
        match policy {
            FieldPolicy::Truncate => Ok(self.pack(value)),
            FieldPolicy::Reject => self.try_pack(value),
        }
    }
}

/// What to do with values wider than their register field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPolicy {
    /// Drop the high bits, as the hardware does
    #[default]
    Truncate,
    /// Fail with [`DsimError::FieldOverflow`]
    Reject,
}

// ============================================================================
// LANE COUNT
// ============================================================================

/// Number of active data lanes, always in 1..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LaneCount(u8);

impl LaneCount {
    pub const MAX: u8 = 4;

    /// Validate a lane count
    pub const fn new(count: u8) -> DsimResult<Self> {
        if count == 0 || count > Self::MAX {
            return Err(DsimError::InvalidConfiguration(
                "data lane count must be between 1 and 4",
            ));
        }
        Ok(Self(count))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Value stored in CONFIG.NUM_OF_DATA_LANE (count - 1)
    pub const fn field_value(self) -> u32 {
        self.0 as u32 - 1
    }

    /// Recover a lane count from the stored field value
    pub const fn from_field(value: u32) -> DsimResult<Self> {
        if value >= Self::MAX as u32 {
            return Err(DsimError::InvalidConfiguration(
                "data lane field value out of range",
            ));
        }
        Ok(Self(value as u8 + 1))
    }
}

impl TryFrom<u8> for LaneCount {
    type Error = DsimError;

    fn try_from(count: u8) -> DsimResult<Self> {
        Self::new(count)
    }
}

impl From<LaneCount> for u8 {
    fn from(count: LaneCount) -> u8 {
        count.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
