use num_bigint::BigUint;
use num_prime::Primality::No;
use num_prime::PrimalityTestConfig;
use num_prime::buffer::{NaiveBuffer, PrimeBufferExt};
use std::cell::RefCell;

pub const DEFAULT_PRIMALITY_ROUNDS: usize = 20;

thread_local! {
    static SIEVE: RefCell<NaiveBuffer> = RefCell::new(NaiveBuffer::new());
}

/// Answers "is this integer (probably) prime". A composite may occasionally be
/// reported as prime; a prime must never be reported as composite.
#[cfg_attr(test, mockall::automock)]
pub trait PrimalityOracle: Send + Sync {
    fn is_probably_prime(&self, n: &BigUint) -> bool;
}

/// Strong probable-prime testing from `num_prime`, with a configurable number
/// of random bases on top of its deterministic checks.
#[derive(Clone, Copy, Debug)]
pub struct NumPrimeOracle {
    rounds: usize,
}

impl NumPrimeOracle {
    pub fn with_rounds(rounds: usize) -> Self {
        NumPrimeOracle { rounds }
    }

    fn config(&self) -> PrimalityTestConfig {
        let mut config = PrimalityTestConfig::default();
        config.sprp_random_trials = self.rounds;
        config
    }
}

impl Default for NumPrimeOracle {
    fn default() -> Self {
        NumPrimeOracle::with_rounds(DEFAULT_PRIMALITY_ROUNDS)
    }
}

impl PrimalityOracle for NumPrimeOracle {
    fn is_probably_prime(&self, n: &BigUint) -> bool {
        SIEVE.with_borrow(|sieve| sieve.is_prime(n, Some(self.config()))) != No
    }
}
