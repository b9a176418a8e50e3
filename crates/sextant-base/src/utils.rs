//! Utility functions and helpers.

/// Fast xorshift PRNG for non-cryptographic randomness.
///
/// Every randomized decision in the solver draws from an explicitly seeded
/// instance of this generator, so equal seeds give equal runs.
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new PRNG with the given seed.
    ///
    /// The seed is scrambled with a splitmix64 step so that small neighbouring
    /// seeds (0, 1, 2, ...) give unrelated streams. Xorshift cannot leave the
    /// all-zero state, which is mapped to a fixed non-zero constant.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        Self {
            state: if z == 0 { 0x2545_F491_4F6C_DD1D } else { z },
        }
    }

    /// Generates the next random u64.
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generates a random index in `0..bound`. `bound` must be non-zero.
    pub fn next_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        // Multiply-shift keeps the bias negligible for solver-sized bounds.
        ((u128::from(self.next()) * bound as u128) >> 64) as usize
    }

    /// Generates a fair random boolean.
    pub fn next_bool(&mut self) -> bool {
        self.next() >> 63 == 1
    }
}
