//! Push identifier generation.
//!
//! Push ids are 20 characters: 8 characters of millisecond timestamp followed
//! by 12 characters (72 bits) of entropy. Both halves use an alphabet ordered
//! like ASCII, so comparing ids as strings orders them by creation time.
//!
//! Within a millisecond the entropy half is incremented as a base-64 number,
//! which keeps every id from one generator strictly greater than the last.
//!
//! # Example
//!
//! ```ignore
//! use firebase_rtdb::push_id::{generate_push_id, PushIdGenerator};
//!
//! let a = generate_push_id();
//! let b = generate_push_id();
//! assert!(a < b);
//! ```

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Alphabet in ASCII order. Not standard base64.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Length of every generated id.
pub const PUSH_ID_LEN: usize = 20;

const STAMP_LEN: usize = 8;
const ENTROPY_LEN: usize = 12;

static DEFAULT_GENERATOR: Lazy<PushIdGenerator> = Lazy::new(PushIdGenerator::new);

/// Generate an id with the process-wide generator.
pub fn generate_push_id() -> String {
    DEFAULT_GENERATOR.generate()
}

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

#[derive(Debug)]
struct State {
    /// Millisecond timestamp of the previous id.
    stamp: u64,
    /// Entropy digits, least significant first.
    last: [u8; ENTROPY_LEN],
}

/// Concurrency-safe push id generator.
///
/// Each instance orders its own ids. Ids from independent instances are
/// unique with overwhelming probability but not mutually ordered within a
/// millisecond.
pub struct PushIdGenerator {
    state: Mutex<State>,
    clock: Clock,
}

impl PushIdGenerator {
    /// Create a generator seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(&mut StdRng::from_entropy())
    }

    /// Create a generator drawing its initial entropy from `rng`.
    ///
    /// The random source is only consulted here; afterwards the entropy half
    /// advances by increment.
    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut last = [0u8; ENTROPY_LEN];
        for digit in last.iter_mut() {
            *digit = rng.gen_range(0..64);
        }

        Self {
            state: Mutex::new(State { stamp: 0, last }),
            clock: Box::new(unix_millis),
        }
    }

    /// Replace the wall clock, e.g. with a fixed time in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Generate the next id.
    pub fn generate(&self) -> String {
        let mut id = [0u8; PUSH_ID_LEN];

        let mut stamp = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

            // A clock that stepped backwards keeps the previous prefix.
            let now = (self.clock)().max(state.stamp);
            if now == state.stamp {
                increment(&mut state.last);
            }
            state.stamp = now;

            for (i, digit) in state.last.iter().enumerate() {
                id[PUSH_ID_LEN - 1 - i] = PUSH_CHARS[*digit as usize];
            }
            now
        };

        for slot in id[..STAMP_LEN].iter_mut().rev() {
            *slot = PUSH_CHARS[(stamp % 64) as usize];
            stamp /= 64;
        }

        id.iter().map(|&b| b as char).collect()
    }
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PushIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushIdGenerator").finish_non_exhaustive()
    }
}

/// Add one to a little-endian base-64 number, wrapping on overflow.
fn increment(digits: &mut [u8; ENTROPY_LEN]) {
    for digit in digits.iter_mut() {
        *digit += 1;
        if *digit < 64 {
            return;
        }
        *digit = 0;
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn seeded(seed: u64) -> PushIdGenerator {
        PushIdGenerator::with_rng(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_alphabet_is_ascii_ordered() {
        assert!(PUSH_CHARS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_id_shape() {
        let id = generate_push_id();
        assert_eq!(id.len(), PUSH_ID_LEN);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_timestamp_prefix_encoding() {
        let generator = seeded(1).with_clock(|| 0);
        assert!(generator.generate().starts_with("--------"));

        let generator = seeded(1).with_clock(|| 64);
        assert!(generator.generate().starts_with("------0-"));

        let generator = seeded(1).with_clock(|| 64 * 64 + 63);
        assert!(generator.generate().starts_with("-----0-z"));
    }

    #[test]
    fn test_same_millisecond_increments_with_carry() {
        let generator = seeded(7).with_clock(|| 1_000);
        {
            let mut state = generator.state.lock().unwrap();
            state.last = [63, 63, 5, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        }

        let first = generator.generate();
        let second = generator.generate();

        assert_eq!(&first[STAMP_LEN..], "---------4zz");
        assert_eq!(&second[STAMP_LEN..], "---------5--");
        assert!(first < second);
    }

    #[test]
    fn test_new_millisecond_keeps_counter() {
        let now = Arc::new(AtomicU64::new(5_000));
        let clock = now.clone();
        let generator = seeded(3).with_clock(move || clock.load(Ordering::SeqCst));

        let first = generator.generate();
        now.store(5_001, Ordering::SeqCst);
        let second = generator.generate();

        assert_eq!(&first[STAMP_LEN..], &second[STAMP_LEN..]);
        assert!(first < second);
    }

    #[test]
    fn test_clock_regression_stays_ordered() {
        let now = Arc::new(AtomicU64::new(9_000));
        let clock = now.clone();
        let generator = seeded(3).with_clock(move || clock.load(Ordering::SeqCst));

        let first = generator.generate();
        now.store(8_000, Ordering::SeqCst);
        let second = generator.generate();

        assert!(first < second);
        assert_eq!(&first[..STAMP_LEN], &second[..STAMP_LEN]);
    }

    #[test]
    fn test_seeded_generators_are_deterministic() {
        let a = seeded(42).with_clock(|| 1_700_000_000_000);
        let b = seeded(42).with_clock(|| 1_700_000_000_000);
        for _ in 0..10 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    #[test]
    fn test_sequential_ids_strictly_increase() {
        let generator = PushIdGenerator::new();
        let mut prev = String::new();
        let mut seen = HashSet::new();
        for _ in 0..100_000 {
            let id = generator.generate();
            assert!(prev < id, "{} should sort before {}", prev, id);
            assert!(seen.insert(id.clone()));
            prev = id;
        }
    }

    #[test]
    fn test_concurrent_callers_get_unique_ordered_ids() {
        let generator = Arc::new(PushIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    let mut ids = Vec::with_capacity(50_000);
                    for _ in 0..50_000 {
                        ids.push(generator.generate());
                    }
                    ids
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for id in ids {
                assert!(all.insert(id), "duplicate id generated");
            }
        }
        assert_eq!(all.len(), 200_000);

        // Anything generated after every caller finished sorts after all of it.
        let later = generator.generate();
        let latest = all.iter().max().unwrap();
        assert!(later > *latest, "{} should sort after {}", later, latest);
    }
}
