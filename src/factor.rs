use crate::cancel::Cancellation;
use crate::oracle::{DEFAULT_PRIMALITY_ROUNDS, NumPrimeOracle, PrimalityOracle};
use crate::rho::{
    DivisorSearchOutcome, find_factor, spawn_find_factor, spawn_trial_division, trial_division,
};
use itertools::Itertools;
use log::{debug, error, info, warn};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, Zero};
use std::future::pending;
use std::time::Duration;
use tokio::select;
use tokio::sync::broadcast::Sender;
use tokio::time::sleep;

/// Prime factors of an integer, with multiplicity, plus the sign of the input.
///
/// `0` factors as `[0]` and `±1` as `[1]`; every other magnitude is a prime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedFactorList {
    magnitudes: Vec<BigUint>,
    negative: bool,
}

impl SignedFactorList {
    pub fn new(mut magnitudes: Vec<BigUint>, negative: bool) -> Self {
        magnitudes.sort_unstable();
        SignedFactorList {
            magnitudes,
            negative,
        }
    }

    /// Magnitudes in ascending order.
    #[inline]
    pub fn magnitudes(&self) -> &[BigUint] {
        &self.magnitudes
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Product of the magnitudes, with the recorded sign applied.
    pub fn product(&self) -> BigInt {
        let magnitude: BigUint = self.magnitudes.iter().product();
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, magnitude)
    }

    /// The magnitudes followed by a single `-1` when the input was negative.
    pub fn to_signed_vec(&self) -> Vec<BigInt> {
        let mut factors: Vec<BigInt> = self.magnitudes.iter().cloned().map(BigInt::from).collect();
        if self.negative {
            factors.push(BigInt::from(-1));
        }
        factors
    }
}

#[derive(Clone, Debug)]
pub struct FactorizerConfig {
    /// Random strong-probable-prime bases used by the default primality oracle.
    pub primality_rounds: usize,
    /// Wall-clock bound on each divisor-search round in
    /// [Factorizer::factor_cancellable]. A round that runs out of time is
    /// abandoned in favour of trial division.
    pub round_timeout: Option<Duration>,
}

impl Default for FactorizerConfig {
    fn default() -> Self {
        FactorizerConfig {
            primality_rounds: DEFAULT_PRIMALITY_ROUNDS,
            round_timeout: None,
        }
    }
}

/// Splits integers into primes, one divisor-search round at a time.
pub struct Factorizer<O: PrimalityOracle = NumPrimeOracle> {
    oracle: O,
    round_timeout: Option<Duration>,
}

impl Default for Factorizer {
    fn default() -> Self {
        Factorizer::from_config(&FactorizerConfig::default())
    }
}

impl Factorizer {
    pub fn from_config(config: &FactorizerConfig) -> Self {
        Factorizer {
            oracle: NumPrimeOracle::with_rounds(config.primality_rounds),
            round_timeout: config.round_timeout,
        }
    }
}

/// Values still to be split, and those the oracle has already accepted.
struct WorkingSet {
    pending: Vec<BigUint>,
    primes: Vec<BigUint>,
}

impl WorkingSet {
    fn new(magnitude: BigUint) -> Self {
        WorkingSet {
            pending: vec![magnitude],
            primes: Vec::new(),
        }
    }

    /// Moves confirmed primes out of the way and returns the next composite.
    fn next_composite<O: PrimalityOracle>(&mut self, oracle: &O) -> Option<BigUint> {
        while let Some(n) = self.pending.pop() {
            if n.is_one() {
                continue;
            }
            if oracle.is_probably_prime(&n) {
                self.primes.push(n);
            } else {
                return Some(n);
            }
        }
        None
    }

    /// Replaces `composite` with `divisor` and `composite / divisor`.
    fn split(&mut self, composite: BigUint, divisor: BigUint) {
        if divisor == composite {
            // Trial division found nothing below the square root.
            warn!("{composite} has no divisor up to its square root; treating it as prime");
            self.primes.push(composite);
            return;
        }
        let quotient = &composite / &divisor;
        debug!("Split {composite} into {divisor} * {quotient}");
        self.pending.push(quotient);
        self.pending.push(divisor);
    }
}

impl<O: PrimalityOracle> Factorizer<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Factorizer {
            oracle,
            round_timeout: None,
        }
    }

    pub fn with_round_timeout(mut self, round_timeout: Option<Duration>) -> Self {
        self.round_timeout = round_timeout;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Factor lists for `0` and `±1`, which need no search.
    fn trivial(n: &BigInt) -> Option<SignedFactorList> {
        if n.is_zero() {
            Some(SignedFactorList::new(vec![BigUint::zero()], false))
        } else if n.magnitude().is_one() {
            Some(SignedFactorList::new(vec![BigUint::one()], n.is_negative()))
        } else {
            None
        }
    }

    fn finish(n: &BigInt, working: WorkingSet) -> SignedFactorList {
        let factors = SignedFactorList::new(working.primes, n.is_negative());
        info!(
            "Found factors of {n}: {}",
            factors.magnitudes().iter().join(", ")
        );
        factors
    }

    /// The divisor a round produced, or `None` when the caller has to fall
    /// back to trial division.
    fn found_divisor(composite: &BigUint, outcome: Option<DivisorSearchOutcome>) -> Option<BigUint> {
        match outcome {
            Some(DivisorSearchOutcome::Found(divisor)) => Some(divisor),
            Some(DivisorSearchOutcome::NotFound) => {
                warn!("Divisor search missed for {composite}; falling back to trial division");
                None
            }
            None => {
                warn!("Divisor search for {composite} gave no outcome; falling back to trial division");
                None
            }
        }
    }

    /// Fully factors `n`, blocking until done.
    pub fn factor(&self, n: &BigInt) -> SignedFactorList {
        self.factor_blocking(n, &mut Cancellation::never())
            .unwrap_or_else(|| unreachable!("factoring {n} was cancelled by Cancellation::never()"))
    }

    /// Fully factors `n` on the current thread. Both the divisor search and the
    /// trial-division fallback check `cancel` on every step; returns `None`
    /// once it fires.
    pub fn factor_blocking(&self, n: &BigInt, cancel: &mut Cancellation) -> Option<SignedFactorList> {
        if let Some(factors) = Self::trivial(n) {
            return Some(factors);
        }
        let mut working = WorkingSet::new(n.magnitude().clone());
        while let Some(composite) = working.next_composite(&self.oracle) {
            let outcome = find_factor(&composite, cancel)?;
            let divisor = match Self::found_divisor(&composite, Some(outcome)) {
                Some(divisor) => divisor,
                None => trial_division(&composite, cancel)?,
            };
            working.split(composite, divisor);
        }
        Some(Self::finish(n, working))
    }

    /// Fully factors `n` with at most one blocking task (a divisor-search round
    /// or its trial-division fallback) in flight at a time. Returns `None` if
    /// `cancel` fires first; the in-flight task is cancelled too.
    pub async fn factor_cancellable(
        &self,
        n: &BigInt,
        mut cancel: Cancellation,
    ) -> Option<SignedFactorList> {
        if let Some(factors) = Self::trivial(n) {
            return Some(factors);
        }
        let mut working = WorkingSet::new(n.magnitude().clone());
        while let Some(composite) = working.next_composite(&self.oracle) {
            let (round_sender, round_cancel) = Cancellation::new();
            let mut round = spawn_find_factor(composite.clone(), round_cancel);
            let outcome = select! {
                biased;
                _ = cancel.cancelled() => {
                    stop_task(&round_sender, &composite);
                    warn!("Factoring {n} cancelled during a divisor search");
                    return None;
                }
                joined = &mut round => joined.unwrap_or_else(|e| {
                    warn!("Divisor search task for {composite} failed: {e}");
                    None
                }),
                _ = round_deadline(self.round_timeout) => {
                    stop_task(&round_sender, &composite);
                    None
                }
            };
            let divisor = match Self::found_divisor(&composite, outcome) {
                Some(divisor) => divisor,
                None => {
                    let (fallback_sender, fallback_cancel) = Cancellation::new();
                    let mut fallback = spawn_trial_division(composite.clone(), fallback_cancel);
                    select! {
                        biased;
                        _ = cancel.cancelled() => {
                            stop_task(&fallback_sender, &composite);
                            warn!("Factoring {n} cancelled during trial division");
                            return None;
                        }
                        joined = &mut fallback => match joined {
                            Ok(Some(divisor)) => divisor,
                            Ok(None) => return None,
                            Err(e) => {
                                error!("Trial division task for {composite} failed: {e}");
                                return None;
                            }
                        },
                    }
                }
            };
            working.split(composite, divisor);
        }
        Some(Self::finish(n, working))
    }
}

/// Asks a spawned task to stop. A failed send means the task already finished
/// and dropped its receiver.
fn stop_task(sender: &Sender<()>, composite: &BigUint) {
    if let Err(e) = sender.send(()) {
        debug!("Task for {composite} finished before it could be cancelled: {e}");
    }
}

async fn round_deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => sleep(timeout).await,
        None => pending().await,
    }
}

/// Factors `n` with the default oracle.
pub fn factor(n: &BigInt) -> SignedFactorList {
    Factorizer::default().factor(n)
}

#[cfg(test)]
mod tests {
    use super::{Factorizer, SignedFactorList, factor};
    use crate::cancel::Cancellation;
    use crate::oracle::{MockPrimalityOracle, NumPrimeOracle, PrimalityOracle};
    use num_bigint::{BigInt, BigUint};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    fn magnitudes(list: &SignedFactorList) -> Vec<u64> {
        list.magnitudes()
            .iter()
            .map(|m| u64::try_from(m).unwrap())
            .collect()
    }

    fn assert_complete(n: i64, list: &SignedFactorList) {
        assert_eq!(list.product(), big(n), "{list:?}");
        let oracle = NumPrimeOracle::default();
        for m in list.magnitudes() {
            assert!(oracle.is_probably_prime(m), "{m} is not prime");
        }
    }

    #[test]
    fn test_trivial_inputs() {
        assert_eq!(factor(&big(0)).to_signed_vec(), vec![big(0)]);
        assert_eq!(factor(&big(1)).to_signed_vec(), vec![big(1)]);
        let minus_one = factor(&big(-1));
        assert_eq!(magnitudes(&minus_one), vec![1]);
        assert!(minus_one.is_negative());
        assert_eq!(minus_one.product(), big(-1));
    }

    #[test]
    fn test_negative_input() {
        let list = factor(&big(-12));
        assert_eq!(magnitudes(&list), vec![2, 2, 3]);
        assert!(list.is_negative());
        assert_eq!(
            list.to_signed_vec(),
            vec![big(2), big(2), big(3), big(-1)]
        );
    }

    #[test]
    fn test_small_range() {
        for n in 2..=600 {
            assert_complete(n, &factor(&big(n)));
        }
    }

    #[test]
    fn test_prime_powers_and_products() {
        assert_eq!(magnitudes(&factor(&big(1024))), vec![2; 10]);
        assert_eq!(magnitudes(&factor(&big(625))), vec![5, 5, 5, 5]);
        assert_eq!(magnitudes(&factor(&big(15015))), vec![3, 5, 7, 11, 13]);
        assert_eq!(magnitudes(&factor(&big(97))), vec![97]);
    }

    #[test]
    fn test_large_semiprime() {
        let n = 1_000_003 * 1_000_033;
        let list = factor(&big(n));
        assert_eq!(magnitudes(&list), vec![1_000_003, 1_000_033]);
    }

    #[test]
    fn test_beyond_u64() {
        // (2^64 + 13) * 3 * 3 * 7
        let n: BigInt = "1162144876643701752627".parse().unwrap();
        let list = factor(&n);
        assert_eq!(list.product(), n);
        assert_eq!(list.magnitudes().len(), 4);
        let p: BigUint = "18446744073709551629".parse().unwrap();
        assert!(list.magnitudes().contains(&p));
    }

    #[test]
    fn test_oracle_drives_splitting() {
        let mut oracle = MockPrimalityOracle::new();
        oracle
            .expect_is_probably_prime()
            .returning(|n| [2u32, 3].into_iter().any(|p| *n == BigUint::from(p)));
        let factorizer = Factorizer::with_oracle(oracle);
        let list = factorizer.factor(&big(36));
        assert_eq!(magnitudes(&list), vec![2, 2, 3, 3]);
    }

    #[test]
    fn test_oracle_false_negative_terminates() {
        // An oracle that never confirms anything still ends with every value
        // proven prime by trial division.
        let mut oracle = MockPrimalityOracle::new();
        oracle.expect_is_probably_prime().return_const(false);
        let list = Factorizer::with_oracle(oracle).factor(&big(60));
        assert_eq!(magnitudes(&list), vec![2, 2, 3, 5]);
    }

    #[tokio::test]
    async fn test_cancellable_completes() {
        let factorizer = Factorizer::default();
        let list = factorizer
            .factor_cancellable(&big(-8051), Cancellation::never())
            .await
            .unwrap();
        assert_eq!(magnitudes(&list), vec![83, 97]);
        assert!(list.is_negative());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (sender, cancel) = Cancellation::new();
        sender.send(()).unwrap();
        let result = Factorizer::default()
            .factor_cancellable(&big(1_000_003 * 1_000_033), cancel)
            .await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_cancellable_trivial_inputs_ignore_cancellation() {
        let (sender, cancel) = Cancellation::new();
        sender.send(()).unwrap();
        let result = Factorizer::default().factor_cancellable(&big(0), cancel).await;
        assert_eq!(result.unwrap().to_signed_vec(), vec![big(0)]);
    }

    #[tokio::test]
    async fn test_round_timeout_falls_back_to_trial_division() {
        let factorizer = Factorizer::default().with_round_timeout(Some(Duration::ZERO));
        let list = factorizer
            .factor_cancellable(&big(101 * 1_000_003), Cancellation::never())
            .await
            .unwrap();
        assert_eq!(magnitudes(&list), vec![101, 1_000_003]);
    }

    /// 1000000000000037 * 1000000000000091: too slow to split by either
    /// method within the tests' time bound.
    fn hard_semiprime() -> BigInt {
        "1000000000000128000000000003367".parse().unwrap()
    }

    async fn factor_then_cancel(factorizer: Factorizer) -> Option<SignedFactorList> {
        let (sender, cancel) = Cancellation::new();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            sender.send(()).unwrap();
        });
        timeout(
            Duration::from_secs(5),
            factorizer.factor_cancellable(&hard_semiprime(), cancel),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_cancelled_during_divisor_search() {
        assert_eq!(factor_then_cancel(Factorizer::default()).await, None);
    }

    #[tokio::test]
    async fn test_cancelled_during_trial_division() {
        // Every round times out at once, so the cancel lands in the fallback.
        let factorizer = Factorizer::default().with_round_timeout(Some(Duration::ZERO));
        assert_eq!(factor_then_cancel(factorizer).await, None);
    }

    #[test]
    fn test_blocking_factoring_honours_cancellation() {
        let factorizer = Factorizer::default();
        let (sender, mut cancel) = Cancellation::new();
        assert_eq!(
            factorizer.factor_blocking(&big(-8051), &mut cancel),
            Some(SignedFactorList::new(vec![BigUint::from(83u8), BigUint::from(97u8)], true))
        );
        sender.send(()).unwrap();
        assert_eq!(factorizer.factor_blocking(&hard_semiprime(), &mut cancel), None);
    }
}
