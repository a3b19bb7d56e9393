//! Polynomial interpolation and evaluation over a finite field.
//!
//! Coefficients are stored lowest degree first, so `p[0]` is the constant term.

use crate::error::OkvsError;
use anyhow::{bail, Result};
use scuttlebutt::field::FiniteField as FF;

/// Interpolate the unique polynomial of degree `< points.len()` through `points`.
///
/// Lagrange form over the master polynomial $`P(x) = \prod_i (x - x_i)`$: each basis numerator is
/// $`P(x) / (x - x_j)`$ by synthetic division and its denominator is that quotient at $`x_j`$.
/// This takes $`O(n^2)`$ where $`n`$ is the number of points.
pub fn interpolate<F: FF>(points: &[(F, F)]) -> Result<Vec<F>> {
    let n = points.len();
    if n == 0 {
        bail!(OkvsError::InvalidParameter(
            "cannot interpolate zero points".into()
        ));
    }

    // master[i] is the coefficient of x^i
    let mut master = vec![F::zero(); n + 1];
    master[0] = F::one();
    for (deg, (x, _)) in points.iter().enumerate() {
        for i in (1..=deg + 1).rev() {
            let lower = master[i - 1];
            master[i] = lower - *x * master[i];
        }
        master[0] = -(*x * master[0]);
    }

    let mut result = vec![F::zero(); n];
    let mut quotient = vec![F::zero(); n];

    for (xj, yj) in points.iter() {
        quotient[n - 1] = master[n];
        for i in (1..n).rev() {
            quotient[i - 1] = master[i] + *xj * quotient[i];
        }

        let denominator = evaluate(&quotient, *xj);
        if denominator == F::zero() {
            bail!(OkvsError::DuplicateKey);
        }

        let scale = *yj * denominator.inverse();
        for (r, q) in result.iter_mut().zip(quotient.iter()) {
            *r += scale * *q;
        }
    }

    Ok(result)
}

/// Horner evaluation of `coefficients` at `x`.
#[inline]
pub fn evaluate<F: FF>(coefficients: &[F], x: F) -> F {
    let mut acc = F::zero();
    for coeff in coefficients.iter().rev() {
        acc = acc * x + *coeff;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set_utils::FromU128;
    use num_traits::{One, Zero};
    use rand::Rng;
    use scuttlebutt::field::F128b;
    use scuttlebutt::AesRng;

    fn random_points<F: FF>(n: usize, rng: &mut AesRng) -> Vec<(F, F)>
    where
        rand::distributions::Standard: rand::distributions::Distribution<F>,
    {
        (0..n).map(|_| (rng.gen(), rng.gen())).collect()
    }

    #[test]
    fn test_interpolate_random() {
        let mut rng = AesRng::new();

        for n in [1, 2, 3, 10, 100] {
            let points = random_points::<F128b>(n, &mut rng);
            let p = interpolate(&points).unwrap();

            assert_eq!(p.len(), n);
            for (x, y) in points.iter() {
                assert_eq!(evaluate(&p, *x), *y);
            }
        }
    }

    #[test]
    fn test_constant_polynomial() {
        let c = F128b::from_u128(42);
        let points = (1..=5)
            .map(|i| (F128b::from_u128(i), c))
            .collect::<Vec<_>>();

        let p = interpolate(&points).unwrap();

        assert_eq!(p[0], c);
        for coeff in p.iter().skip(1) {
            assert_eq!(*coeff, F128b::zero());
        }
    }

    #[test]
    fn test_duplicate_x() {
        let x = F128b::from_u128(7);
        let points = vec![(x, F128b::from_u128(1)), (x, F128b::from_u128(2))];

        let err = interpolate(&points).unwrap_err();

        assert_eq!(
            err.downcast_ref::<OkvsError>(),
            Some(&OkvsError::DuplicateKey)
        );
    }

    #[test]
    fn test_empty() {
        assert!(interpolate::<F128b>(&[]).is_err());
    }

    #[test]
    fn test_evaluate() {
        // 1 + x^2 at x = 0 and x = 1 (characteristic 2)
        let p = vec![F128b::one(), F128b::zero(), F128b::one()];

        assert_eq!(evaluate(&p, F128b::zero()), F128b::one());
        assert_eq!(evaluate(&p, F128b::one()), F128b::zero());
        assert_eq!(evaluate::<F128b>(&[], F128b::one()), F128b::zero());
    }
}
