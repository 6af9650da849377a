use crate::cancel::Cancellation;
use crate::gcd::gcd_pair;
use log::debug;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use tokio::task::{JoinHandle, spawn_blocking};

/// Fixed start value of the pseudo-random walk.
pub const RHO_SEED: u32 = 57;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DivisorSearchOutcome {
    /// A divisor `d` with `1 < d < n`. It is not necessarily prime.
    Found(BigUint),
    /// The attempt budget ran out, or the walk closed its cycle on `n` itself.
    NotFound,
}

impl DivisorSearchOutcome {
    pub fn divisor(&self) -> Option<&BigUint> {
        match self {
            DivisorSearchOutcome::Found(d) => Some(d),
            DivisorSearchOutcome::NotFound => None,
        }
    }
}

/// Number of iterations a single round may spend on `n`: `⌊n^(1/4)⌋`.
#[inline]
pub fn attempt_budget(n: &BigUint) -> BigUint {
    n.sqrt().sqrt()
}

/// One round of Pollard's rho on the composite `n > 1`, walking `v -> v² + 1
/// mod n` with Floyd cycle detection. Checks `cancel` before every iteration
/// and returns `None` without an outcome once it fires.
pub fn find_factor(n: &BigUint, cancel: &mut Cancellation) -> Option<DivisorSearchOutcome> {
    let step = |v: &BigUint| (v * v + 1u8) % n;
    let mut slow = BigUint::from(RHO_SEED) % n;
    let mut fast = step(&slow);
    let mut budget = attempt_budget(n);
    while !budget.is_zero() {
        if cancel.is_cancelled() {
            debug!("Divisor search for {n} cancelled");
            return None;
        }
        budget -= 1u8;
        slow = step(&slow);
        fast = step(&step(&fast));
        let distance = if fast >= slow { &fast - &slow } else { &slow - &fast };
        let divisor = gcd_pair(distance, n.clone());
        if divisor.is_one() {
            continue;
        }
        if divisor.is_zero() || divisor == *n {
            debug!("Divisor search for {n} closed its cycle without a divisor");
            return Some(DivisorSearchOutcome::NotFound);
        }
        debug!("Divisor search for {n} found {divisor}");
        return Some(DivisorSearchOutcome::Found(divisor));
    }
    debug!("Divisor search for {n} exhausted its budget");
    Some(DivisorSearchOutcome::NotFound)
}

/// Runs [find_factor] on tokio's blocking pool. The task owns its copy of `n`;
/// a cancelled round completes with `None`.
pub fn spawn_find_factor(
    n: BigUint,
    mut cancel: Cancellation,
) -> JoinHandle<Option<DivisorSearchOutcome>> {
    spawn_blocking(move || find_factor(&n, &mut cancel))
}

/// Smallest divisor of `n` greater than 1, found by trial division. Returns `n`
/// itself when no divisor up to `√n` exists. Checks `cancel` before every
/// candidate and returns `None` once it fires.
pub fn trial_division(n: &BigUint, cancel: &mut Cancellation) -> Option<BigUint> {
    let mut candidate = BigUint::from(2u8);
    while &candidate * &candidate <= *n {
        if cancel.is_cancelled() {
            debug!("Trial division of {n} cancelled at {candidate}");
            return None;
        }
        if (n % &candidate).is_zero() {
            return Some(candidate);
        }
        candidate += 1u8;
    }
    Some(n.clone())
}

/// Runs [trial_division] on tokio's blocking pool.
pub fn spawn_trial_division(n: BigUint, mut cancel: Cancellation) -> JoinHandle<Option<BigUint>> {
    spawn_blocking(move || trial_division(&n, &mut cancel))
}
