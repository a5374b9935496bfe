//! Seeded pseudo-random generator for reproducible draws.
//!
//! The generator is a 32-bit FNV-1a hash of the seed followed by an
//! xorshift-style mixing step. Every operation is `u32` wrapping arithmetic,
//! so any implementation that follows the same steps produces bit-identical
//! sequences.

use rand::RngCore;

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 16_777_619;

/// 2^32 as a float, the divisor that maps the state into [0, 1).
const STATE_SPAN: f64 = 4_294_967_296.0;

/// Hash a seed into the initial generator state.
///
/// The seed is consumed as UTF-16 code units. For characters in the Basic
/// Multilingual Plane a code unit equals the character's code point.
pub fn fnv1a(seed: &str) -> u32 {
    seed.encode_utf16().fold(FNV_OFFSET_BASIS, |acc, unit| {
        (acc ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Advance a state by one mixing step.
pub fn mix(mut h: u32) -> u32 {
    h = h.wrapping_add(h << 13);
    h ^= h >> 7;
    h = h.wrapping_add(h << 3);
    h ^= h >> 17;
    h.wrapping_add(h << 5)
}

/// Deterministic number stream derived from a textual seed.
///
/// Each draw owns its own generator; the type is `Clone` so a stream can be
/// forked for replay, but it is never shared between concurrent draws.
///
/// # Example
/// ```
/// use rifa_core::rng::SeededGenerator;
///
/// let mut a = SeededGenerator::new("raffle-2024-final");
/// let mut b = SeededGenerator::new("raffle-2024-final");
///
/// assert_eq!(a.next_f64(), b.next_f64());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededGenerator {
    state: u32,
}

impl SeededGenerator {
    /// Create a generator from a seed string. Any string is valid.
    pub fn new(seed: &str) -> Self {
        Self { state: fnv1a(seed) }
    }

    /// Resume a generator from a previously captured state.
    pub fn from_state(state: u32) -> Self {
        Self { state }
    }

    /// Current internal state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance and return the raw 32-bit state.
    pub fn next_state(&mut self) -> u32 {
        self.state = mix(self.state);
        self.state
    }

    /// Advance and return a value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_state()) / STATE_SPAN
    }

    /// Draw an index in `0..len`.
    ///
    /// Returns `None` for an empty range without advancing the stream.
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = (self.next_f64() * len as f64).floor() as usize;
        // next_f64 < 1.0, so index < len; min() guards float edge cases for huge pools
        Some(index.min(len - 1))
    }
}

impl Iterator for SeededGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

impl RngCore for SeededGenerator {
    fn next_u32(&mut self) -> u32 {
        self.next_state()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_state());
        let lo = u64::from(self.next_state());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_state().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
