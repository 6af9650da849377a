//! Exact arithmetic on complex numbers with rational components, an
//! expression evaluator producing them, and integer factorisation backing an
//! arithmetic derivative.

pub mod cancel;
pub mod complex;
pub mod derivative;
pub mod error;
pub mod factor;
pub mod gcd;
pub mod oracle;
pub mod parser;
pub mod rational;
pub mod rho;

pub use cancel::Cancellation;
pub use complex::RationalComplex;
pub use derivative::{arithmetic_derivative, integer_derivative, rational_derivative};
pub use error::{Error, Result};
pub use factor::{Factorizer, FactorizerConfig, SignedFactorList, factor};
pub use gcd::gcd;
pub use oracle::{NumPrimeOracle, PrimalityOracle};
pub use parser::parse;
pub use rho::DivisorSearchOutcome;
