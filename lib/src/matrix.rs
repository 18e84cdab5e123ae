//! Exact linear algebra over rational numbers.

use malachite::num::arithmetic::traits::{Abs, Gcd, Lcm};
use malachite::num::basic::traits::{One, Zero};
use malachite::{Natural, Rational};

/// Reduces matrix to reduced row echelon form (Gauss-Jordan elimination with exact arithmetic)
/// The largest absolute value in a column is used as the pivot
/// # Arguments
/// * `matrix` - rectangular matrix (every row must have the same length)
/// # Returns
/// * rank of the matrix (number of pivot rows)
/// # Example
/// ```
/// use chemeq::matrix::reduce_row_echelon;
/// use malachite::Rational;
///
/// let mut matrix = vec![
///     vec![Rational::from(2), Rational::from(1), Rational::from(-1), Rational::from(8)],
///     vec![Rational::from(-3), Rational::from(-1), Rational::from(2), Rational::from(-11)],
///     vec![Rational::from(-2), Rational::from(1), Rational::from(2), Rational::from(-3)],
/// ];
///
/// let rank = reduce_row_echelon(&mut matrix);
///
/// assert_eq!(rank, 3);
/// assert_eq!(matrix, vec![
///     vec![Rational::from(1), Rational::from(0), Rational::from(0), Rational::from(2)],
///     vec![Rational::from(0), Rational::from(1), Rational::from(0), Rational::from(3)],
///     vec![Rational::from(0), Rational::from(0), Rational::from(1), Rational::from(-1)],
/// ]);
/// ```
pub fn reduce_row_echelon(matrix: &mut [Vec<Rational>]) -> usize {
    let m = matrix.len();
    let n = matrix.first().map_or(0, Vec::len);

    let mut row = 0;
    let mut col = 0;
    while row < m && col < n {
        let mut i_max = row;
        for (i, row_n) in matrix.iter().enumerate().skip(row + 1) {
            if (&row_n[col]).abs() > (&matrix[i_max][col]).abs() {
                i_max = i;
            }
        }

        if matrix[i_max][col] == Rational::ZERO {
            col += 1;
            continue;
        }
        matrix.swap(row, i_max);

        // scale pivot row so that the leading coefficient is 1
        let factor = Rational::ONE / &matrix[row][col];
        for value in matrix[row].iter_mut().skip(col) {
            *value *= &factor;
        }

        // eliminate the column in every other row
        let (above, rest) = matrix.split_at_mut(row);
        let (pivot_row, below) = rest.split_at_mut(1);
        for other in above.iter_mut().chain(below.iter_mut()) {
            if other[col] == Rational::ZERO {
                continue;
            }
            let f = other[col].clone();
            for (value, pivot_value) in other.iter_mut().zip(pivot_row[0].iter()).skip(col) {
                *value -= &f * pivot_value;
            }
        }

        row += 1;
        col += 1;
    }

    row
}

/// Returns least common multiple of all denominators (1 for no values)
pub fn denominators_lcm<'a>(values: impl IntoIterator<Item = &'a Rational>) -> Natural {
    values
        .into_iter()
        .fold(Natural::ONE, |lcm, value| lcm.lcm(value.denominator_ref()))
}

/// Returns greatest common divisor of all numerators (0 if all values are zero)
pub fn numerators_gcd<'a>(values: impl IntoIterator<Item = &'a Rational>) -> Natural {
    values
        .into_iter()
        .fold(Natural::ZERO, |gcd, value| gcd.gcd(value.numerator_ref()))
}

/// Scales values so that they become coprime integers (keeping their signs and ratios)
/// All-zero input is returned unchanged
pub fn to_primitive_integers(values: &[Rational]) -> Vec<Rational> {
    let lcm = Rational::from(denominators_lcm(values));
    let scaled: Vec<Rational> = values.iter().map(|v| v * &lcm).collect();

    let gcd = numerators_gcd(&scaled);
    if gcd == Natural::ZERO || gcd == Natural::ONE {
        return scaled;
    }
    let gcd = Rational::from(gcd);
    scaled.iter().map(|v| v / &gcd).collect()
}
