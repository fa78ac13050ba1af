use serde::{Deserialize, Serialize};

/// Discrete unit impulse: 1 at offset 0, 0 elsewhere.
pub fn dirac(n: isize) -> f64 {
    if n == 0 {
        1.0
    } else {
        0.0
    }
}

/// FIR filter whose first tap sits at integer offset `lo`.
///
/// Taps are stored densely; offsets outside `[lo, hi]` read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub lo: isize,
    pub taps: Vec<f64>,
}

impl Filter {
    pub fn new(lo: isize, taps: Vec<f64>) -> Self {
        Self { lo, taps }
    }

    /// Evaluates `f` at every offset of `[lo, hi]`.
    pub fn from_fn(lo: isize, hi: isize, f: impl Fn(isize) -> f64) -> Self {
        let taps = (lo..=hi).map(f).collect();
        Self { lo, taps }
    }

    /// Offset of the last tap.
    pub fn hi(&self) -> isize {
        self.lo + self.taps.len() as isize - 1
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn tap(&self, offset: isize) -> f64 {
        let idx = offset - self.lo;
        if idx < 0 {
            return 0.0;
        }
        self.taps.get(idx as usize).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.taps.iter().sum()
    }

    /// (offset, tap) pairs in ascending offset order.
    pub fn iter(&self) -> impl Iterator<Item = (isize, f64)> + '_ {
        self.taps
            .iter()
            .enumerate()
            .map(move |(i, &t)| (self.lo + i as isize, t))
    }

    /// Inserts `factor - 1` zeros between consecutive taps; offsets scale by `factor`.
    pub fn dilate(&self, factor: usize) -> Filter {
        let factor = factor.max(1);
        if self.taps.is_empty() {
            return Filter::new(self.lo * factor as isize, Vec::new());
        }
        let mut taps = vec![0.0; (self.taps.len() - 1) * factor + 1];
        for (i, &t) in self.taps.iter().enumerate() {
            taps[i * factor] = t;
        }
        Filter::new(self.lo * factor as isize, taps)
    }

    /// Full linear convolution; the result starts at `self.lo + other.lo`.
    pub fn convolve(&self, other: &Filter) -> Filter {
        if self.taps.is_empty() || other.taps.is_empty() {
            return Filter::new(self.lo + other.lo, Vec::new());
        }
        let mut taps = vec![0.0; self.taps.len() + other.taps.len() - 1];
        for (i, &a) in self.taps.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            for (j, &b) in other.taps.iter().enumerate() {
                taps[i + j] += a * b;
            }
        }
        Filter::new(self.lo + other.lo, taps)
    }

    /// Time reversal: the tap at offset `n` moves to `-n`.
    pub fn reversed(&self) -> Filter {
        let taps = self.taps.iter().rev().copied().collect();
        Filter::new(-self.hi(), taps)
    }

    /// Re-indexes onto exactly `[lo, hi_exclusive)`, zero-filling and cropping.
    pub fn on_support(&self, lo: isize, hi_exclusive: isize) -> Filter {
        Filter::from_fn(lo, hi_exclusive - 1, |n| self.tap(n))
    }
}

/// Scaling (low-pass) and wavelet (band-pass) filters of the quadratic-spline
/// dyadic wavelet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPair {
    /// `h`, taps sum to 1.
    pub scaling: Filter,
    /// `g`, taps sum to 0.
    pub wavelet: Filter,
}

impl FilterPair {
    /// `h = {1, 3, 3, 1}/8` over offsets `-1..=2` and `g = {-2, 2}` over `0..=1`,
    /// each evaluated from its impulse expansion.
    pub fn quadratic_spline() -> Self {
        let scaling = Filter::from_fn(-1, 2, |n| {
            (dirac(n + 1) + 3.0 * dirac(n) + 3.0 * dirac(n - 1) + dirac(n - 2)) / 8.0
        });
        let wavelet = Filter::from_fn(0, 1, |n| 2.0 * (dirac(n - 1) - dirac(n)));
        Self { scaling, wavelet }
    }
}

impl Default for FilterPair {
    fn default() -> Self {
        Self::quadratic_spline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_filters_have_expected_taps() {
        let pair = FilterPair::quadratic_spline();
        assert_eq!(pair.scaling.lo, -1);
        assert_eq!(pair.scaling.taps, vec![0.125, 0.375, 0.375, 0.125]);
        assert_eq!(pair.wavelet.lo, 0);
        assert_eq!(pair.wavelet.taps, vec![-2.0, 2.0]);
    }

    #[test]
    fn base_filter_sums() {
        let pair = FilterPair::default();
        // taps are dyadic rationals, so these sums are exact
        assert_eq!(pair.scaling.sum(), 1.0);
        assert_eq!(pair.wavelet.sum(), 0.0);
        assert!((pair.scaling.sum() - 1.0).abs() <= 1e-9);
    }

    #[test]
    fn dilation_inserts_holes() {
        let g = FilterPair::default().wavelet.dilate(4);
        assert_eq!(g.lo, 0);
        assert_eq!(g.taps, vec![-2.0, 0.0, 0.0, 0.0, 2.0]);
        let h = FilterPair::default().scaling.dilate(2);
        assert_eq!(h.lo, -2);
        assert_eq!(h.hi(), 4);
        assert_eq!(h.tap(0), 0.375);
        assert_eq!(h.tap(1), 0.0);
    }

    #[test]
    fn convolution_offsets_add() {
        let a = Filter::new(-1, vec![1.0, 1.0]);
        let b = Filter::new(2, vec![1.0, -1.0]);
        let c = a.convolve(&b);
        assert_eq!(c.lo, 1);
        assert_eq!(c.taps, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn reversal_and_support() {
        let f = Filter::new(-1, vec![1.0, 2.0, 3.0]);
        let r = f.reversed();
        assert_eq!(r.lo, -1);
        assert_eq!(r.taps, vec![3.0, 2.0, 1.0]);
        let padded = f.on_support(-3, 3);
        assert_eq!(padded.taps, vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
        assert_eq!(padded.tap(1), 3.0);
        assert_eq!(padded.tap(7), 0.0);
    }
}
