//! Identifier allocation
//!
//! Issues `<prefix><5 digits>` codes with the numeric part drawn uniformly
//! from `10000..=99999`. Collisions against the code directory are retried a
//! bounded number of times.

use crate::domain::errors::NetworkError;
use crate::domain::value_objects::{format_code, CODE_MAX, CODE_MIN};
use crate::ports::outbound::CodeDirectory;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Random code allocator.
///
/// The directory check is advisory: two concurrent allocations can draw the
/// same free code, so the store's unique index on codes stays authoritative.
pub struct IdentifierAllocator {
    rng: Mutex<StdRng>,
    max_attempts: u32,
}

impl IdentifierAllocator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            max_attempts,
        }
    }

    /// Deterministic sequence for tests and replays.
    pub fn with_seed(max_attempts: u32, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Allocate a code not currently present in `directory`.
    pub async fn allocate<D>(&self, prefix: &str, directory: &D) -> Result<String, NetworkError>
    where
        D: CodeDirectory + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.draw(prefix);

            if !directory.code_in_use(&candidate).await? {
                debug!(code = %candidate, attempt, "Code allocated");
                return Ok(candidate);
            }

            debug!(code = %candidate, attempt, "Code collision, redrawing");
        }

        warn!(
            prefix,
            attempts = self.max_attempts,
            "Code allocation exhausted"
        );
        Err(NetworkError::AllocationExhausted {
            prefix: prefix.to_string(),
            attempts: self.max_attempts,
        })
    }

    fn draw(&self, prefix: &str) -> String {
        // Guard is dropped before the caller awaits
        let number = self.rng.lock().gen_range(CODE_MIN..=CODE_MAX);
        format_code(prefix, number)
    }
}
