//! Opaque handle ids and their generator.

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle to a registered object.
///
/// Carries no structural meaning. Foreign callers see it as a plain
/// `uint64_t`; zero is never issued and stands for "no handle".
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HandleId(u64);

impl HandleId {
    /// The invalid (null) handle.
    pub const INVALID: HandleId = HandleId(0);

    /// Wrap a raw id received across the boundary.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id handed to foreign callers.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Check if this handle is valid (non-zero).
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl From<u64> for HandleId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<HandleId> for u64 {
    fn from(id: HandleId) -> Self {
        id.0
    }
}

/// How fresh ids are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Two independent 32-bit pseudorandom draws (high and low halves).
    /// Does not reveal issuance order.
    #[default]
    Random,
    /// Monotonic counter starting at 1.
    Sequential,
}

/// Produces fresh 64-bit ids.
///
/// The generator does not know which ids are live; the registry rejects
/// collisions under its write lock and asks again.
pub struct HandleIdGenerator {
    strategy: IdStrategy,
    rng: Mutex<SmallRng>,
    next: AtomicU64,
}

impl HandleIdGenerator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            rng: Mutex::new(SmallRng::from_entropy()),
            next: AtomicU64::new(1),
        }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Draw the next candidate id. Never fails.
    pub fn generate(&self) -> HandleId {
        match self.strategy {
            IdStrategy::Random => {
                let mut rng = self.rng.lock();
                let hi = rng.next_u32() as u64;
                let lo = rng.next_u32() as u64;
                HandleId((hi << 32) | lo)
            }
            IdStrategy::Sequential => HandleId(self.next.fetch_add(1, Ordering::Relaxed)),
        }
    }
}

impl Default for HandleIdGenerator {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}

impl fmt::Debug for HandleIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleIdGenerator")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_invalid_handle() {
        assert!(!HandleId::INVALID.is_valid());
        assert!(!HandleId::default().is_valid());
        assert!(HandleId::from_raw(7).is_valid());
        assert_eq!(u64::from(HandleId::from(7u64)), 7);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(HandleId::from_raw(0xdead_beef).to_string(), "0x00000000deadbeef");
    }

    #[test]
    fn test_sequential_ids_are_ordered() {
        let generator = HandleIdGenerator::new(IdStrategy::Sequential);
        let a = generator.generate();
        let b = generator.generate();
        let c = generator.generate();
        assert_eq!(a.as_raw(), 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_random_ids_use_both_halves() {
        let generator = HandleIdGenerator::new(IdStrategy::Random);
        let ids: Vec<u64> = (0..256).map(|_| generator.generate().as_raw()).collect();
        assert!(ids.iter().any(|id| id >> 32 != 0));
        assert!(ids.iter().any(|id| id & 0xffff_ffff != 0));
        let distinct: HashSet<_> = ids.iter().collect();
        assert_eq!(distinct.len(), ids.len());
    }

    #[test]
    fn test_strategy_serde_names() {
        let s: IdStrategy = serde_json::from_str("\"sequential\"").unwrap();
        assert_eq!(s, IdStrategy::Sequential);
        assert_eq!(serde_json::to_string(&IdStrategy::Random).unwrap(), "\"random\"");
    }
}
