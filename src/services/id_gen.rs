use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Base every generator counter starts from.
pub const ID_BASE: u64 = 1;

/// Suffix width for production ids.  Two digits is a test-only setting;
/// it keeps fixtures readable but is trivially guessable.
pub const DEFAULT_SUFFIX_LEN: usize = 12;

/// Mints order ids of the form `"{counter}_{suffix}"`.
///
/// The monotonic counter guarantees uniqueness regardless of suffix
/// collisions; the random digit suffix makes ids hard to guess.  The
/// counter advances even when a downstream insert later fails, leaving
/// the id space sparse, which is harmless.
#[derive(Debug)]
pub struct OrderIdGenerator {
    counter: AtomicU64,
    suffix_len: usize,
}

impl OrderIdGenerator {
    pub fn new(suffix_len: usize) -> Self {
        Self {
            counter: AtomicU64::new(ID_BASE),
            suffix_len,
        }
    }

    /// Next unique id.  Safe to call from concurrent tasks.
    pub fn next_id(&self) -> String {
        let base = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut rng = rand::thread_rng();
        let suffix: String = (0..self.suffix_len)
            .map(|_| char::from(b'0' + rng.gen_range(0..10)))
            .collect();
        let id = format!("{}_{}", base, suffix);
        debug!(id = %id, "Minted order id");
        id
    }

    /// Current counter value, i.e. the base the next id will use.
    pub fn base(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX_LEN)
    }
}
