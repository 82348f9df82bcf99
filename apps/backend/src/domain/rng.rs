//! Deterministic xorshift stream and Fisher-Yates shuffle.
//!
//! Every handler that touches a match must derive identical hands, prompt
//! orders and auto-picks from the same seed, so nothing here may depend on
//! process state. Sub-streams for independent decisions are built with
//! [`DetRng::from_key`] rather than by sharing one generator.

use xxhash_rust::xxh3::xxh3_64;

/// Replaces an all-zero state; xorshift never leaves zero.
const ZERO_STATE_FALLBACK: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetRng {
    state: u64,
}

impl DetRng {
    /// Seed from a hex string such as `0x9f…`. The first 16 hex digits become the
    /// state (shorter inputs are left-padded). Anything that is not hex is hashed.
    pub fn from_hex(seed: &str) -> Self {
        let trimmed = seed.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let state = if !body.is_empty() && body.bytes().all(|b| b.is_ascii_hexdigit()) {
            let head = if body.len() >= 16 {
                body[..16].to_string()
            } else {
                format!("{body:0>16}")
            };
            u64::from_str_radix(&head, 16).unwrap_or_else(|_| xxh3_64(body.as_bytes()))
        } else {
            xxh3_64(trimmed.as_bytes())
        };

        Self::from_state(state)
    }

    /// Fresh generator for a composite key like `"{seed}:{round}:{player}:auto"`.
    pub fn from_key(key: &str) -> Self {
        Self::from_state(xxh3_64(key.as_bytes()))
    }

    fn from_state(state: u64) -> Self {
        Self {
            state: if state == 0 { ZERO_STATE_FALLBACK } else { state },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x & 0xFFFF_FFFF) as u32
    }

    /// Index in `[0, n)` by modulo; `0` when `n == 0`.
    pub fn pick(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.next_u32() as usize % n
    }
}

/// In-place Fisher-Yates, walking from the end.
pub fn shuffle<T>(items: &mut [T], rng: &mut DetRng) {
    for i in (1..items.len()).rev() {
        let j = rng.pick(i + 1);
        items.swap(i, j);
    }
}
