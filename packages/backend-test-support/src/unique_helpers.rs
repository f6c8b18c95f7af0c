//! Unique test data so tests sharing a store never collide.

use uuid::Uuid;

/// `{prefix}-{8 hex chars}`, e.g. `alice-1f3a9c0b`
pub fn unique_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}

/// A numeric-looking PIN that differs between calls
pub fn unique_pin() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{n:06}")
}
