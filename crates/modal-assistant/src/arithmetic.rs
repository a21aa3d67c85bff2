//! World arithmetic used by the calculators and the assistant.

/// Miller-Rabin bases that decide primality for every `u64`.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Factors below this are found by trial division; larger ones by Pollard's rho.
const TRIAL_LIMIT: u64 = 1000;

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    (a as u128 * b as u128 % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1 % m;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Deterministic Miller-Rabin over the full `u64` range.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Prime factors in non-decreasing order. Empty for 0 and 1.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }
    let mut d = 2;
    while d < TRIAL_LIMIT && d <= n / d {
        while n % d == 0 {
            factors.push(d);
            n /= d;
        }
        d += 1;
    }
    split(n, &mut factors);
    factors.sort_unstable();
    factors
}

fn split(n: u64, factors: &mut Vec<u64>) {
    if n == 1 {
        return;
    }
    if is_prime(n) {
        factors.push(n);
        return;
    }
    let d = pollard_rho(n);
    split(d, factors);
    split(n / d, factors);
}

/// A non-trivial divisor of `n`, which must be composite and free of factors
/// below `TRIAL_LIMIT`.
fn pollard_rho(n: u64) -> u64 {
    let mut c: u64 = 1;
    loop {
        let step = |x: u64| ((x as u128 * x as u128 + c as u128) % n as u128) as u64;
        let (mut x, mut y, mut d) = (2, 2, 1);
        while d == 1 {
            x = step(x);
            y = step(step(y));
            d = gcd(x.abs_diff(y), n);
        }
        if d != n {
            return d;
        }
        c += 1;
    }
}

/// Size (and probability) of world `n`: 1/n. Infinite for world 0.
pub fn world_size(n: u64) -> f64 {
    1.0 / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primality() {
        for n in [0, 1] {
            assert!(!is_prime(n), "{} is not prime", n);
        }
        for n in [2, 3, 5, 7, 11, 13] {
            assert!(is_prime(n), "{} is prime", n);
        }
        for n in [4, 6, 8, 9, 10] {
            assert!(!is_prime(n), "{} is composite", n);
        }
        assert!(is_prime(7919));
        assert!(!is_prime(7917));
        // strong pseudoprimes to small bases
        assert!(!is_prime(3_215_031_751));
        assert!(!is_prime(3_825_123_056_546_413_051));
        assert!(is_prime(18_446_744_073_709_551_557));
        assert!(!is_prime(u64::MAX));
    }

    #[test]
    fn large_inputs_factor_quickly() {
        assert_eq!(
            prime_factors(18_446_744_073_709_551_557),
            vec![18_446_744_073_709_551_557]
        );
        assert_eq!(
            prime_factors(18_446_743_979_220_271_189),
            vec![4_294_967_279, 4_294_967_291]
        );
        assert_eq!(
            prime_factors(u64::MAX),
            vec![3, 5, 17, 257, 641, 65_537, 6_700_417]
        );
        assert_eq!(prime_factors(1_000_003 * 1_000_003), vec![1_000_003, 1_000_003]);
    }

    #[test]
    fn factorization() {
        assert_eq!(prime_factors(12), vec![2, 2, 3]);
        assert_eq!(prime_factors(97), vec![97]);
        assert!(prime_factors(1).is_empty());
        assert!(prime_factors(0).is_empty());

        for n in 2..5000u64 {
            let factors = prime_factors(n);
            assert_eq!(factors.iter().product::<u64>(), n);
            assert!(factors.windows(2).all(|w| w[0] <= w[1]));
            assert!(factors.iter().all(|f| is_prime(*f)));
        }
    }

    #[test]
    fn world_size_shrinks_with_n() {
        assert_eq!(world_size(1), 1.0);
        assert_eq!(world_size(4), 0.25);
        for n in 1..100u64 {
            assert!(world_size(n + 1) < world_size(n));
        }
        assert!(world_size(0).is_infinite());
    }
}
