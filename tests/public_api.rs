use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use rational_complex::{
    Cancellation, Error, Factorizer, RationalComplex, arithmetic_derivative, factor, gcd, parse,
};

#[test]
fn evaluates_and_prints_canonical_form() {
    let cases = [
        ("12+31i", "12+31i"),
        ("(1+2i)/(3-4i)", "-1/5+2i/5"),
        ("(2+i)*(2-i)", "5"),
        ("i*i*i", "-i"),
        ("1/3 - 1/3", "0"),
        ("0.5i + 0.25", "1/4+i/2"),
    ];
    for (input, expected) in cases {
        assert_eq!(parse(input).unwrap().to_string(), expected, "{input}");
    }
}

#[test]
fn canonical_form_parses_back_to_the_same_value() {
    for input in ["(7-3i)/(2+5i)", "-1/7", "3i/11", "-i/2", "100-i"] {
        let value = parse(input).unwrap();
        assert_eq!(value.to_string().parse::<RationalComplex>().unwrap(), value);
    }
}

#[test]
fn errors_are_reported_and_recoverable() {
    assert!(matches!(parse("3 + k"), Err(Error::Parse(_))));
    assert_eq!(parse("(1+i)/0"), Err(Error::DivideByZero));
    assert_eq!(parse("2 * (1 - i)").unwrap().to_string(), "2-2i");
}

#[test]
fn oversized_input_is_a_parse_error() {
    assert!(matches!(parse("1e400000000"), Err(Error::Parse(_))));
    let nested = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
    assert!(matches!(parse(&nested), Err(Error::Parse(_))));
    assert_eq!(parse("1e3 + 1").unwrap().to_string(), "1001");
}

#[test]
fn inverse_is_exact() {
    let x = parse("-7/3+5i/2").unwrap();
    assert_eq!(&x * &x.inv().unwrap(), RationalComplex::one());
    assert_eq!(x.to_fixed_string(3), "-2.333+2.500i");
}

#[test]
fn factors_and_gcd() {
    assert_eq!(gcd(&[48, 18]), Some(6));
    assert_eq!(gcd(&[7]), Some(7));
    assert_eq!(gcd(&[0, 5]), Some(5));
    let n = BigInt::from(2 * 2 * 3 * 5 * 7 * 7 * 1009);
    let factors = factor(&n);
    assert_eq!(factors.product(), n);
    assert_eq!(
        factors.to_signed_vec(),
        [2, 2, 3, 5, 7, 7, 1009].map(BigInt::from).to_vec()
    );
}

#[test]
fn derivative_of_integers_and_complex_values() {
    assert_eq!(
        arithmetic_derivative(&parse("12").unwrap()).unwrap(),
        RationalComplex::from(16)
    );
    assert_eq!(
        arithmetic_derivative(&RationalComplex::zero()),
        Err(Error::UndefinedDerivative)
    );
}

#[tokio::test]
async fn cancellable_factoring() {
    let factorizer = Factorizer::default();
    let n = BigInt::from(-(1_000_003i64 * 101));
    let factors = factorizer
        .factor_cancellable(&n, Cancellation::never())
        .await
        .unwrap();
    assert_eq!(factors.product(), n);
    assert!(factors.is_negative());
}

#[tokio::test]
async fn cancelling_a_long_factorisation() {
    // 1000000000000037 * 1000000000000091
    let n: BigInt = "1000000000000128000000000003367".parse().unwrap();
    let factorizer = Factorizer::default().with_round_timeout(Some(Duration::from_millis(10)));
    let (sender, cancel) = Cancellation::new();
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        sender.send(()).unwrap();
    });
    let result = timeout(Duration::from_secs(5), factorizer.factor_cancellable(&n, cancel)).await;
    assert_eq!(result, Ok(None));
}
