use anyhow::{bail, Result};
use scuttlebutt::field::FiniteField as FF;
mod row;
pub(crate) use row::Row;
use row::add_rows;

/*

⎡100110...| y_1 ⎤
⎢110100...| y_2 ⎥
⎣010101...| y_3 ⎦

↓

⎡100001...| v_1 ⎤
⎢010010...| v_2 ⎥
⎣000111...| v_3 ⎦

Then, below equations are satisfied. (v_i, R_i \in F)

R_1 + R_6 + ...= v_1
R_2 + R_5 + ...= v_2
R_4 + R_5 + R_6 + ... = v_3

So, after generating R_i (i != 1, 2, 4) <-$ F, we can decide R_1, R_2, R_4 by

R_1 = v_1 - R_6 - ...
R_2 = v_2 - R_5 - ...
R_4 = v_3 - R_5 - R_6 - ...

Coefficients are in GF(2), so row additions are only valid over fields of characteristic 2.

*/

/// A reduced row whose `pivot` column appears in no other reduced row.
pub(crate) type Pivot<F> = (usize, Row<F>);

/// Bring `matrix` to reduced row echelon form.
///
/// Returns `Ok(None)` when the system is inconsistent. Rows that reduce to `0 = 0` are dropped.
pub(crate) fn gaussian_elimination<F: FF>(
    matrix: Vec<Row<F>>,
    width: usize,
) -> Result<Option<Vec<Pivot<F>>>> {
    check_matrix(&matrix, width)?;

    let n = matrix.len();
    let mut matrix = matrix;
    let mut pivots = Vec::with_capacity(n.min(width));

    let mut i = 0;
    for j in 0..width {
        if i >= n {
            break;
        }

        let Some(t) = (i..n).find(|&k| matrix[k].get(j)) else {
            continue;
        };

        matrix.swap(i, t);

        // row i is zero left of j, so earlier words need no update
        for k in 0..n {
            if k != i && matrix[k].get(j) {
                add_rows(&mut matrix, k, i, j / 64);
            }
        }

        pivots.push(j);
        i += 1;
    }

    if matrix[i..].iter().any(|row| row.target != F::zero()) {
        return Ok(None);
    }

    let res = pivots.into_iter().zip(matrix).collect::<Vec<_>>();

    Ok(Some(res))
}

/// Fix every pivot variable from its reduced row; the other entries of `vars` stay as given.
pub(crate) fn assign_pivots<F: FF>(pivots: &[Pivot<F>], vars: &mut [F]) {
    for (i, row) in pivots.iter() {
        let mut sum = row.target;
        for j in row.ones() {
            if j != *i {
                sum += vars[j];
            }
        }
        vars[*i] = sum;
    }
}

fn check_matrix<F: FF>(matrix: &[Row<F>], width: usize) -> Result<()> {
    if matrix.is_empty() {
        bail!("matrix is empty");
    }

    if width == 0 {
        bail!("matrix row is empty");
    }

    let words = width.div_ceil(64);
    for (i, row) in matrix.iter().enumerate() {
        if row.words.len() != words {
            bail!("matrix row {} has different length", i);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set_utils::FromU128;
    use num_traits::Zero;
    use rand::Rng;
    use scuttlebutt::{field::F128b, AesRng};

    fn inner<RNG: Rng>(n: usize, m: usize, rng: &mut RNG, verbose: bool) -> bool {
        let matrix = (0..n)
            .map(|_| {
                let bits = (0..m).map(|_| rng.gen()).collect::<Vec<bool>>();
                Row::from_bits(&bits, rng.gen::<F128b>())
            })
            .collect::<Vec<_>>();

        let res = match gaussian_elimination(matrix.clone(), m) {
            Ok(Some(res)) => res,
            Ok(None) => {
                if verbose {
                    println!("[No Solution] matrix: {:?}", matrix);
                }
                return false;
            }
            Err(e) => {
                panic!("error: {}", e);
            }
        };

        let mut vars: Vec<F128b> = (0..m).map(|_| rng.gen()).collect::<Vec<_>>();
        assign_pivots(&res, &mut vars);

        for row in matrix.iter() {
            let mut sum = F128b::zero();
            for j in row.ones() {
                sum += vars[j];
            }
            assert_eq!(sum, row.target);
        }

        true
    }

    #[test]
    fn random_small_test() {
        let mut rng = AesRng::new();
        inner(3, 10, &mut rng, true);
    }

    #[test]
    fn random_large_test() {
        let mut rng = AesRng::new();

        let mut success_count = 0;
        let mut fail_count = 0;

        for _ in 0..200 {
            let n = rng.gen_range(10..=100);
            let m = rng.gen_range((2 * n)..=(100 + 2 * n));

            if inner(n, m, &mut rng, false) {
                success_count += 1;
            } else {
                fail_count += 1;
            }
        }

        println!(
            "[successful] success: {}, fail: {}",
            success_count, fail_count
        );

        // wide random systems are full rank except with probability about 2^-n
        assert!(success_count > fail_count);
    }

    #[test]
    fn test_edge_case_1() {
        let matrix = vec![Row::from_bits(&[true, false, false], F128b::from_u128(1))];

        let res = gaussian_elimination(matrix, 3).unwrap().unwrap();

        assert_eq!(
            res,
            vec![(
                0,
                Row::from_bits(&[true, false, false], F128b::from_u128(1))
            )]
        );
    }

    #[test]
    fn test_edge_case_2() {
        let matrix = vec![Row::from_bits(&[false, false, true], F128b::from_u128(1))];

        let res = gaussian_elimination(matrix, 3).unwrap().unwrap();

        assert_eq!(res.len(), 1);
        assert_eq!(res[0].0, 2);
    }

    #[test]
    fn test_wide_rows() {
        // pivots past the first word
        let mut a = Row::zero(130, F128b::from_u128(3));
        a.set(100);
        a.set(129);
        let mut b = Row::zero(130, F128b::from_u128(5));
        b.set(129);

        let res = gaussian_elimination(vec![a.clone(), b.clone()], 130)
            .unwrap()
            .unwrap();

        assert_eq!(res.iter().map(|(p, _)| *p).collect::<Vec<_>>(), vec![100, 129]);

        let mut vars = vec![F128b::zero(); 130];
        assign_pivots(&res, &mut vars);
        assert_eq!(vars[100] + vars[129], F128b::from_u128(3));
        assert_eq!(vars[129], F128b::from_u128(5));
    }

    #[test]
    fn test_dependent_consistent_rows() {
        let matrix = vec![
            Row::from_bits(&[true, true, false], F128b::from_u128(1)),
            Row::from_bits(&[false, true, true], F128b::from_u128(2)),
            Row::from_bits(&[true, false, true], F128b::from_u128(3)),
        ];

        let res = gaussian_elimination(matrix, 3).unwrap().unwrap();

        // 1 + 2 = 3 in characteristic 2, so the third row is redundant
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn test_err_1() {
        let matrix = vec![Row::from_bits(&[], F128b::from_u128(1))];

        assert!(gaussian_elimination(matrix, 0).is_err());
        assert!(gaussian_elimination::<F128b>(vec![], 3).is_err());
    }

    #[test]
    fn test_no_solution_0() {
        let matrix = vec![Row::from_bits(&[false, false, false], F128b::from_u128(1))];

        let res = gaussian_elimination(matrix, 3).unwrap();

        assert!(res.is_none());
    }

    #[test]
    fn test_no_solution_1() {
        let matrix = vec![
            Row::from_bits(&[true, false, false], F128b::from_u128(1)),
            Row::from_bits(&[true, false, false], F128b::from_u128(2)),
        ];

        let res = gaussian_elimination(matrix, 3).unwrap();

        assert!(res.is_none());
    }

    #[test]
    fn test_row_bits() {
        let mut row = Row::zero(100, F128b::zero());
        assert_eq!(row.ones().count(), 0);

        row.set(64);
        row.set(99);

        assert!(!row.get(3));
        assert!(row.get(64));
        assert_eq!(row.ones().collect::<Vec<_>>(), vec![64, 99]);
    }
}
