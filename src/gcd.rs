use num_integer::Integer;

/// Euclid's algorithm on a single pair. Callers wanting the conventional
/// non-negative result must pass non-negative values.
#[inline]
pub fn gcd_pair<T: Integer + Clone>(a: T, b: T) -> T {
    let (mut a, mut b) = if a < b { (b, a) } else { (a, b) };
    while !b.is_zero() {
        let remainder = a.mod_floor(&b);
        a = b;
        b = remainder;
    }
    a
}

/// Greatest common divisor of every value in `nums`, folded left to right.
/// Returns `None` only when `nums` is empty.
pub fn gcd<T: Integer + Clone>(nums: &[T]) -> Option<T> {
    nums.iter().cloned().reduce(gcd_pair)
}
