// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It drives the Monte-Carlo experiments, where a fixed seed must reproduce the
// exact same trial sequence.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform in [0,1) with 53 bits of precision.
    #[inline]
    pub fn next_f64_01(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    #[inline]
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64_01()
    }

    /// Uniform integer in `[low, high)`. Returns `low` for an empty range.
    #[inline]
    pub fn gen_range_u32(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        let span = (high - low) as u64;
        // Multiply-shift keeps the modulo bias below 2^-32 for small spans.
        let v = ((self.next_u32() as u64) * span) >> 32;
        low + v as u32
    }

    /// Bernoulli draw with success probability `p` (clamped to [0,1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.next_f64_01() < p.clamp(0.0, 1.0)
    }
}

impl Default for Prng {
    fn default() -> Self {
        Self::new(0)
    }
}
