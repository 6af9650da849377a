use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("division by zero")]
    DivideByZero,

    #[error("arithmetic derivative of 0 is undefined")]
    UndefinedDerivative,

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
