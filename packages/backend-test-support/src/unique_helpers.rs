//! Test helpers for generating unique test data
//!
//! Integration tests share one process per test binary, so anything keyed by
//! game id (store records, fake chain state) must not collide between tests.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1_000);
static NEXT_ADDRESS: AtomicU64 = AtomicU64::new(1);

/// Generate a positive game id not handed out before in this process.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_game_id;
///
/// let a = unique_game_id();
/// let b = unique_game_id();
/// assert_ne!(a, b);
/// assert!(a > 0);
/// ```
pub fn unique_game_id() -> u64 {
    NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed)
}

/// Generate a unique lowercase `0x`-prefixed 40-hex-digit player address.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_address;
///
/// let addr = unique_address();
/// assert!(addr.starts_with("0x"));
/// assert_eq!(addr.len(), 42);
/// assert_ne!(addr, unique_address());
/// ```
pub fn unique_address() -> String {
    address(NEXT_ADDRESS.fetch_add(1, Ordering::Relaxed))
}

/// Deterministic address for a small index, handy for readable fixtures.
pub fn address(n: u64) -> String {
    format!("0x{n:040x}")
}
