use crate::error::{AnalysisError, AnalysisResult};

const MAX_DEGREE: usize = 8;

/// Sample index mapped onto `[-1, 1]`; keeps the normal equations well conditioned.
fn abscissa(i: usize, len: usize) -> f64 {
    if len < 2 {
        0.0
    } else {
        2.0 * i as f64 / (len - 1) as f64 - 1.0
    }
}

/// Least-squares polynomial coefficients (lowest order first) over the normalised index.
pub fn fit_polynomial(data: &[f64], degree: usize) -> AnalysisResult<Vec<f64>> {
    if degree > MAX_DEGREE {
        return Err(AnalysisError::config(format!(
            "baseline degree must be at most {MAX_DEGREE}, got {degree}"
        )));
    }
    if data.len() <= degree {
        return Err(AnalysisError::config(format!(
            "a degree {} baseline needs more than {} samples, got {}",
            degree,
            degree,
            data.len()
        )));
    }
    let k = degree + 1;
    // augmented normal equations [X^T X | X^T y]
    let mut a = vec![vec![0.0; k + 1]; k];
    let mut powers = vec![0.0; 2 * k - 1];
    for (i, &y) in data.iter().enumerate() {
        let u = abscissa(i, data.len());
        let mut p = 1.0;
        for (d, slot) in powers.iter_mut().enumerate() {
            *slot += p;
            if d < k {
                a[d][k] += p * y;
            }
            p *= u;
        }
    }
    for (r, row) in a.iter_mut().enumerate() {
        row[..k].copy_from_slice(&powers[r..r + k]);
    }

    for col in 0..k {
        let pivot = (col..k)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(AnalysisError::config(
                "baseline fit is singular; reduce the polynomial degree",
            ));
        }
        a.swap(col, pivot);
        for r in 0..k {
            if r == col {
                continue;
            }
            let factor = a[r][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..=k {
                a[r][c] -= factor * a[col][c];
            }
        }
    }
    Ok((0..k).map(|r| a[r][k] / a[r][r]).collect())
}

/// Polynomial evaluated at every normalised sample index.
pub fn polynomial_trend(len: usize, coefficients: &[f64]) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let u = abscissa(i, len);
            coefficients.iter().rev().fold(0.0, |acc, c| acc * u + c)
        })
        .collect()
}

/// Subtracts the least-squares polynomial trend of the given degree.
pub fn remove_baseline(data: &[f64], degree: usize) -> AnalysisResult<Vec<f64>> {
    let coefficients = fit_polynomial(data, degree)?;
    let trend = polynomial_trend(data.len(), &coefficients);
    Ok(data.iter().zip(trend).map(|(y, t)| y - t).collect())
}
