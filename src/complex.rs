use crate::error::{Error, Result};
use crate::rational::to_fixed_string;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// A complex number whose real and imaginary parts are both exact rationals.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct RationalComplex {
    re: BigRational,
    im: BigRational,
}

impl RationalComplex {
    #[inline]
    pub fn new(re: BigRational, im: BigRational) -> Self {
        RationalComplex { re, im }
    }

    /// The imaginary unit.
    pub fn i() -> Self {
        RationalComplex::new(BigRational::zero(), BigRational::one())
    }

    pub fn real(re: BigRational) -> Self {
        RationalComplex::new(re, BigRational::zero())
    }

    pub fn imaginary(im: BigRational) -> Self {
        RationalComplex::new(BigRational::zero(), im)
    }

    #[inline]
    pub fn re(&self) -> &BigRational {
        &self.re
    }

    #[inline]
    pub fn im(&self) -> &BigRational {
        &self.im
    }

    pub fn into_parts(self) -> (BigRational, BigRational) {
        (self.re, self.im)
    }

    #[inline]
    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }

    #[inline]
    pub fn is_pure_imaginary(&self) -> bool {
        self.re.is_zero() && !self.im.is_zero()
    }

    pub fn conj(&self) -> Self {
        RationalComplex::new(self.re.clone(), -&self.im)
    }

    /// Returns `|self|²`, which is zero only for the zero value.
    pub fn norm_sqr(&self) -> BigRational {
        &self.re * &self.re + &self.im * &self.im
    }

    /// Multiplies both components by a real scalar.
    pub fn scale(&self, factor: &BigRational) -> Self {
        RationalComplex::new(&self.re * factor, &self.im * factor)
    }

    pub fn inv(&self) -> Result<Self> {
        let norm = self.norm_sqr();
        if norm.is_zero() {
            return Err(Error::DivideByZero);
        }
        Ok(RationalComplex::new(&self.re / &norm, -&self.im / &norm))
    }

    pub fn checked_div(&self, divisor: &RationalComplex) -> Result<Self> {
        Ok(self * &divisor.inv()?)
    }

    /// Renders each component with `precision` digits after the radix point.
    pub fn to_fixed_string(&self, precision: usize) -> String {
        match (self.re.is_zero(), self.im.is_zero()) {
            (true, true) => "0".to_owned(),
            (_, true) => to_fixed_string(&self.re, precision),
            (true, false) => format!("{}i", to_fixed_string(&self.im, precision)),
            (false, false) => format!(
                "{}{}{}i",
                to_fixed_string(&self.re, precision),
                if self.im.is_positive() { "+" } else { "" },
                to_fixed_string(&self.im, precision)
            ),
        }
    }

    fn fmt_imaginary(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let numer = self.im.numer();
        if numer.is_one() {
            f.write_str("i")?;
        } else if (-numer).is_one() {
            f.write_str("-i")?;
        } else {
            write!(f, "{numer}i")?;
        }
        let denom = self.im.denom();
        if !denom.is_one() {
            write!(f, "/{denom}")?;
        }
        Ok(())
    }
}

impl Display for RationalComplex {
    /// Exact form: `0`, `-3/4`, `2i/5`, `-i`, `12+31i`, `-1/5+2i/5`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.re.is_zero(), self.im.is_zero()) {
            (true, true) => f.write_str("0"),
            (_, true) => write!(f, "{}", self.re),
            (true, false) => self.fmt_imaginary(f),
            (false, false) => {
                write!(f, "{}", self.re)?;
                if self.im.is_positive() {
                    f.write_str("+")?;
                }
                self.fmt_imaginary(f)
            }
        }
    }
}

impl FromStr for RationalComplex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parser::parse(s)
    }
}

impl From<BigRational> for RationalComplex {
    fn from(value: BigRational) -> Self {
        RationalComplex::real(value)
    }
}

impl From<BigInt> for RationalComplex {
    fn from(value: BigInt) -> Self {
        RationalComplex::real(BigRational::from_integer(value))
    }
}

impl From<i64> for RationalComplex {
    fn from(value: i64) -> Self {
        BigInt::from(value).into()
    }
}

impl Add<&RationalComplex> for &RationalComplex {
    type Output = RationalComplex;

    fn add(self, rhs: &RationalComplex) -> RationalComplex {
        RationalComplex::new(&self.re + &rhs.re, &self.im + &rhs.im)
    }
}

impl Sub<&RationalComplex> for &RationalComplex {
    type Output = RationalComplex;

    fn sub(self, rhs: &RationalComplex) -> RationalComplex {
        RationalComplex::new(&self.re - &rhs.re, &self.im - &rhs.im)
    }
}

impl Mul<&RationalComplex> for &RationalComplex {
    type Output = RationalComplex;

    fn mul(self, rhs: &RationalComplex) -> RationalComplex {
        RationalComplex::new(
            &self.re * &rhs.re - &self.im * &rhs.im,
            &self.im * &rhs.re + &self.re * &rhs.im,
        )
    }
}

impl Neg for &RationalComplex {
    type Output = RationalComplex;

    fn neg(self) -> RationalComplex {
        RationalComplex::new(-&self.re, -&self.im)
    }
}

impl Neg for RationalComplex {
    type Output = RationalComplex;

    fn neg(self) -> RationalComplex {
        RationalComplex::new(-self.re, -self.im)
    }
}

macro_rules! forward_owned_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<RationalComplex> for RationalComplex {
            type Output = RationalComplex;

            #[inline]
            fn $method(self, rhs: RationalComplex) -> RationalComplex {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&RationalComplex> for RationalComplex {
            type Output = RationalComplex;

            #[inline]
            fn $method(self, rhs: &RationalComplex) -> RationalComplex {
                (&self).$method(rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl Zero for RationalComplex {
    fn zero() -> Self {
        RationalComplex::default()
    }

    fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }
}

impl One for RationalComplex {
    fn one() -> Self {
        RationalComplex::real(BigRational::one())
    }
}
