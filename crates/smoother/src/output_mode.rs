//! Output-mode flags selecting which smoother quantities are computed.

use std::ops::{BitOr, BitOrAssign};

use crate::error::SmootherError;

/// Bitmask of requested smoother outputs.
///
/// Quantities outside the mask are never computed and their result buffers
/// are never allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SmootherOutput {
    bits: u32,
}

impl SmootherOutput {
    /// Scaled smoothed estimator `r` (and smoothed states).
    pub const STATE: Self = Self { bits: 1 << 0 };
    /// Covariance `N` of the scaled smoothed estimator (and smoothed state covariances).
    pub const STATE_COV: Self = Self { bits: 1 << 1 };
    /// Smoothed measurement and state disturbances.
    pub const DISTURBANCE: Self = Self { bits: 1 << 2 };
    /// Variances of the smoothed disturbances.
    pub const DISTURBANCE_COV: Self = Self { bits: 1 << 3 };
    /// Every output.
    pub const ALL: Self = Self { bits: 0b1111 };

    const NAMES: [(&'static str, Self); 4] = [
        ("state", Self::STATE),
        ("state_cov", Self::STATE_COV),
        ("disturbance", Self::DISTURBANCE),
        ("disturbance_cov", Self::DISTURBANCE_COV),
    ];

    /// The empty mask.
    #[inline]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Builds a mask from raw bits.
    ///
    /// # Errors
    ///
    /// Returns [`SmootherError::UnknownOutputBits`] if any bit outside
    /// [`SmootherOutput::ALL`] is set.
    pub const fn from_bits(bits: u32) -> Result<Self, SmootherError> {
        let unknown = bits & !Self::ALL.bits;
        if unknown != 0 {
            return Err(SmootherError::UnknownOutputBits { bits: unknown });
        }
        Ok(Self { bits })
    }

    /// Raw bits of the mask.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.bits
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns `true` if any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    /// Whether the recursion for `r` has to run.
    #[inline]
    pub(crate) const fn updates_r(self) -> bool {
        self.intersects(Self {
            bits: Self::STATE.bits | Self::DISTURBANCE.bits,
        })
    }

    /// Whether the recursion for `N` has to run.
    #[inline]
    pub(crate) const fn updates_n(self) -> bool {
        self.intersects(Self {
            bits: Self::STATE_COV.bits | Self::DISTURBANCE_COV.bits,
        })
    }

    /// Looks up a single flag by its lowercase name; `"all"` maps to
    /// [`SmootherOutput::ALL`].
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "all" {
            return Some(Self::ALL);
        }
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, flag)| *flag)
    }

    /// Names of the set flags, in bit order.
    pub fn labels(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl Default for SmootherOutput {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for SmootherOutput {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for SmootherOutput {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}
