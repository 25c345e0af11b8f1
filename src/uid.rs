//! Interpolation identifier minting.

use crate::types::InterpolationUid;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub trait UidGenerator: Send + Sync {
    fn mint(&self) -> InterpolationUid;
}

/// Globally unique identifiers hashed from (time, pid, counter) and rendered in the
/// 8-4-4-4-12 hex layout.
#[derive(Debug, Default)]
pub struct Blake3UidGenerator {
    counter: AtomicU64,
}

impl Blake3UidGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

impl UidGenerator for Blake3UidGenerator {
    fn mint(&self) -> InterpolationUid {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&now_nanos().to_le_bytes());
        hasher.update(&std::process::id().to_le_bytes());
        hasher.update(&seq.to_le_bytes());
        let digest = hex::encode(&hasher.finalize().as_bytes()[..16]);
        InterpolationUid::new(format!(
            "{}-{}-{}-{}-{}",
            &digest[0..8],
            &digest[8..12],
            &digest[12..16],
            &digest[16..20],
            &digest[20..32]
        ))
    }
}

/// Deterministic `<prefix>-<n>` identifiers, for replays whose output must be stable.
#[derive(Debug)]
pub struct SequentialUidGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialUidGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(1),
        }
    }
}

impl UidGenerator for SequentialUidGenerator {
    fn mint(&self) -> InterpolationUid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        InterpolationUid::new(format!("{}-{}", self.prefix, n))
    }
}
