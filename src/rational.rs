use crate::error::{Error, Result};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// Renders `x` with `precision` digits after the radix point. The last digit
/// is rounded to nearest, with halves rounded away from zero. The sign of `x`
/// is kept even when the rounded digits are all zero.
pub fn to_fixed_string(x: &BigRational, precision: usize) -> String {
    let denom = x.denom();
    let (mut whole, mut frac) = x.numer().abs().div_rem(denom);
    let mut digits = String::new();
    if precision == 0 {
        if (&frac << 1u8) >= *denom {
            whole += 1u8;
        }
    } else {
        let scale = BigInt::from(10u8).pow(precision as u32);
        frac *= &scale;
        let (mut scaled, remainder) = frac.div_rem(denom);
        if (remainder << 1u8) >= *denom {
            scaled += 1u8;
        }
        if scaled >= scale {
            whole += 1u8;
            scaled -= &scale;
        }
        digits = format!(".{:0>precision$}", scaled.to_string());
    }
    let sign = if x.is_negative() { "-" } else { "" };
    format!("{sign}{whole}{digits}")
}

/// Largest power of ten a decimal literal may scale its digits by.
pub const MAX_DECIMAL_SHIFT: u32 = 100_000;

/// Reconstructs the exact value of a decimal literal such as `12`, `1.25`,
/// `.5`, `3.` or `6.02e23`.
pub fn parse_decimal(literal: &str) -> Result<BigRational> {
    let invalid = || Error::Parse(format!("invalid numeric literal {literal:?}"));
    let (mantissa, exponent) = match literal.find(['e', 'E']) {
        Some(index) => (
            &literal[..index],
            literal[index + 1..].parse::<i32>().map_err(|_| invalid())?,
        ),
        None => (literal, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let digits: BigInt = format!("{whole}{fraction}")
        .parse()
        .map_err(|_| invalid())?;
    let shift = i64::from(exponent) - fraction.len() as i64;
    let magnitude = u32::try_from(shift.unsigned_abs())
        .ok()
        .filter(|magnitude| *magnitude <= MAX_DECIMAL_SHIFT)
        .ok_or_else(|| {
            Error::Parse(format!(
                "numeric literal {literal:?} is scaled by more than 10^{MAX_DECIMAL_SHIFT}"
            ))
        })?;
    let power = BigInt::from(10u8).pow(magnitude);
    Ok(if shift >= 0 {
        BigRational::from_integer(digits * power)
    } else if digits.is_zero() {
        BigRational::zero()
    } else {
        BigRational::new(digits, power)
    })
}
