use crate::cancel::Cancellation;
use crate::complex::RationalComplex;
use crate::error::{Error, Result};
use crate::factor::Factorizer;
use crate::oracle::PrimalityOracle;
use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// `n'` with `p' = 1` for primes and `(ab)' = a'b + ab'`, extended to
/// negative `n` by `(-n)' = -(n')`. Fails with [Error::Cancelled] if `cancel`
/// fires while `n` is being factored.
pub fn integer_derivative_with<O: PrimalityOracle>(
    factorizer: &Factorizer<O>,
    n: &BigInt,
    cancel: &mut Cancellation,
) -> Result<BigInt> {
    if n.is_zero() {
        return Err(Error::UndefinedDerivative);
    }
    let magnitude = n.abs();
    if magnitude.is_one() {
        return Ok(BigInt::zero());
    }
    let derivative: BigInt = factorizer
        .factor_blocking(&magnitude, cancel)
        .ok_or(Error::Cancelled)?
        .magnitudes()
        .iter()
        .map(|p| &magnitude / BigInt::from(p.clone()))
        .sum();
    Ok(if n.is_negative() { -derivative } else { derivative })
}

/// Quotient rule on the lowest-terms form: `(a/b)' = (a'b - ab') / b²`.
pub fn rational_derivative_with<O: PrimalityOracle>(
    factorizer: &Factorizer<O>,
    x: &BigRational,
    cancel: &mut Cancellation,
) -> Result<BigRational> {
    if x.is_zero() {
        return Err(Error::UndefinedDerivative);
    }
    let numer = x.numer().abs();
    let denom = x.denom();
    let numer_derivative = integer_derivative_with(factorizer, &numer, cancel)?;
    let denom_derivative = integer_derivative_with(factorizer, denom, cancel)?;
    let derivative = BigRational::new(
        numer_derivative * denom - &numer * denom_derivative,
        denom * denom,
    );
    Ok(if x.is_negative() { -derivative } else { derivative })
}

/// Real and pure-imaginary values are derived component-wise. Any other value
/// keeps its direction and is rescaled by `m' / 2m`, where `m = |x|²`.
pub fn arithmetic_derivative_with<O: PrimalityOracle>(
    factorizer: &Factorizer<O>,
    x: &RationalComplex,
    cancel: &mut Cancellation,
) -> Result<RationalComplex> {
    let result = if x.is_real() {
        RationalComplex::real(rational_derivative_with(factorizer, x.re(), cancel)?)
    } else if x.is_pure_imaginary() {
        RationalComplex::imaginary(rational_derivative_with(factorizer, x.im(), cancel)?)
    } else {
        let norm = x.norm_sqr();
        let norm_derivative = rational_derivative_with(factorizer, &norm, cancel)?;
        x.scale(&(norm_derivative / (norm * BigInt::from(2u8))))
    };
    debug!("Derivative of {x} is {result}");
    Ok(result)
}

pub fn integer_derivative(n: &BigInt) -> Result<BigInt> {
    integer_derivative_with(&Factorizer::default(), n, &mut Cancellation::never())
}

pub fn rational_derivative(x: &BigRational) -> Result<BigRational> {
    rational_derivative_with(&Factorizer::default(), x, &mut Cancellation::never())
}

pub fn arithmetic_derivative(x: &RationalComplex) -> Result<RationalComplex> {
    arithmetic_derivative_with(&Factorizer::default(), x, &mut Cancellation::never())
}
