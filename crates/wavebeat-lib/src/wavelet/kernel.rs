//! Time-domain kernels of the undecimated filter bank ("algorithme à trous").
//!
//! The scale-`j` kernel is `g` dilated by `2^(j-1)` convolved with `h` dilated
//! by `2^0 .. 2^(j-2)`. Every kernel falls out of that cascade; no per-scale
//! coefficient tables are stored.

use super::filter::{Filter, FilterPair};
use super::MAX_SCALE;
use crate::error::{AnalysisError, AnalysisResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Kernel support `[a_j, b_j)` with `a_j = -(2^j + 2^(j-1) - 2)` and `b_j = 2^(j-1) + 1`.
pub fn kernel_support(scale: usize) -> (isize, isize) {
    let full = 1isize << scale;
    let half = 1isize << (scale - 1);
    (-(full + half - 2), half + 1)
}

pub(crate) fn check_scale(scale: usize) -> AnalysisResult<()> {
    if (1..=MAX_SCALE).contains(&scale) {
        Ok(())
    } else {
        Err(AnalysisError::config(format!(
            "scale must be within 1..={MAX_SCALE}, got {scale}"
        )))
    }
}

/// Convolution kernel of one scale. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    scale: usize,
    filter: Filter,
}

impl Kernel {
    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Taps in ascending offset order, starting at `a_j`.
    pub fn taps(&self) -> &[f64] {
        &self.filter.taps
    }

    pub fn support(&self) -> (isize, isize) {
        (self.filter.lo, self.filter.hi() + 1)
    }

    pub fn len(&self) -> usize {
        self.filter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.filter.sum()
    }
}

/// Builds the scale-`j` kernel from the base pair.
pub fn synthesize_kernel(pair: &FilterPair, scale: usize) -> AnalysisResult<Kernel> {
    check_scale(scale)?;
    Ok(cascade(pair, scale))
}

fn cascade(pair: &FilterPair, scale: usize) -> Kernel {
    let mut acc = pair.wavelet.dilate(1 << (scale - 1));
    for m in 0..scale - 1 {
        acc = acc.convolve(&pair.scaling.dilate(1 << m));
    }
    // The base pair is written in correlation orientation; convolving with the
    // reversed cascade applies it as a filter.
    let reversed = acc.reversed();
    let (a, b) = kernel_support(scale);
    debug_assert!(reversed.lo >= a && reversed.hi() < b);
    Kernel {
        scale,
        filter: reversed.on_support(a, b),
    }
}

/// Kernels for scales `1..=MAX_SCALE`, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct KernelBank {
    pair: FilterPair,
    kernels: BTreeMap<usize, Kernel>,
}

impl KernelBank {
    pub fn new(pair: FilterPair) -> Self {
        let kernels = (1..=MAX_SCALE)
            .map(|scale| {
                let kernel = cascade(&pair, scale);
                let (a, b) = kernel.support();
                debug!(
                    "synthesized scale {} kernel: {} taps over [{}, {})",
                    scale,
                    kernel.len(),
                    a,
                    b
                );
                (scale, kernel)
            })
            .collect();
        Self { pair, kernels }
    }

    /// Process-wide bank for the quadratic-spline pair.
    pub fn shared() -> &'static KernelBank {
        static BANK: OnceLock<KernelBank> = OnceLock::new();
        BANK.get_or_init(|| KernelBank::new(FilterPair::quadratic_spline()))
    }

    pub fn pair(&self) -> &FilterPair {
        &self.pair
    }

    pub fn kernel(&self, scale: usize) -> AnalysisResult<&Kernel> {
        check_scale(scale)?;
        self.kernels
            .get(&scale)
            .ok_or_else(|| AnalysisError::config(format!("no kernel cached for scale {scale}")))
    }

    pub fn kernels(&self) -> impl Iterator<Item = &Kernel> {
        self.kernels.values()
    }
}

impl Default for KernelBank {
    fn default() -> Self {
        Self::new(FilterPair::quadratic_spline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::response::{magnitude_response, FrequencyGrid};
    use serde::Deserialize;
    use std::{fs::File, path::PathBuf};

    fn scaled(numerators: &[i64], denominator: f64) -> Vec<f64> {
        numerators.iter().map(|&n| n as f64 / denominator).collect()
    }

    #[test]
    fn support_and_band_pass_for_every_scale() {
        let bank = KernelBank::default();
        for j in 1..=MAX_SCALE {
            let kernel = bank.kernel(j).unwrap();
            let (a, b) = kernel_support(j);
            assert_eq!(kernel.support(), (a, b));
            assert_eq!(kernel.len() as isize, b - a);
            assert_eq!(kernel.len(), (1 << (j + 1)) - 1);
            assert!(kernel.sum().abs() < 1e-6, "scale {j} sum {}", kernel.sum());
        }
        assert_eq!(kernel_support(3), (-10, 5));
        assert_eq!(kernel_support(8), (-382, 129));
    }

    #[test]
    fn low_scales_match_closed_forms() {
        let bank = KernelBank::default();
        assert_eq!(bank.kernel(1).unwrap().taps(), &[2.0, -2.0, 0.0]);
        assert_eq!(
            bank.kernel(2).unwrap().taps(),
            scaled(&[1, 3, 2, -2, -3, -1, 0], 4.0).as_slice()
        );
        assert_eq!(
            bank.kernel(3).unwrap().taps(),
            scaled(
                &[1, 3, 6, 10, 11, 9, 4, -4, -9, -11, -10, -6, -3, -1, 0],
                32.0
            )
            .as_slice()
        );
    }

    #[test]
    fn kernels_are_antisymmetric() {
        let bank = KernelBank::default();
        for kernel in bank.kernels() {
            let taps = kernel.taps();
            let n = taps.len() - 1;
            assert_eq!(taps[n], 0.0);
            for i in 0..n {
                assert_eq!(taps[i], -taps[n - 1 - i], "scale {}", kernel.scale());
            }
        }
    }

    #[derive(Deserialize)]
    struct PublishedKernel {
        scale: usize,
        denominator: f64,
        first_offset: isize,
        order: String,
        numerators: Vec<i64>,
    }

    #[derive(Deserialize)]
    struct PublishedKernels {
        kernels: Vec<PublishedKernel>,
    }

    fn published_kernels() -> PublishedKernels {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .to_path_buf();
        let path = root.join("test_data/published_kernels.json");
        serde_json::from_reader(File::open(&path).expect("open kernel fixture"))
            .expect("parse kernel fixture")
    }

    #[test]
    fn cascade_reproduces_published_tables() {
        let bank = KernelBank::default();
        let fixture = published_kernels();
        assert!(fixture.kernels.iter().any(|k| k.scale == 8));
        for table in fixture.kernels {
            let kernel = bank.kernel(table.scale).unwrap();
            let (a, b) = kernel.support();
            assert_eq!(table.first_offset, a);
            // published tables omit the trailing zero tap at b - 1
            assert_eq!(table.numerators.len() as isize, b - a - 1);
            let mut expected = scaled(&table.numerators, table.denominator);
            if table.order == "descending" {
                expected.reverse();
            }
            for (i, want) in expected.iter().enumerate() {
                let got = kernel.filter().tap(a + i as isize);
                assert!(
                    (got - want).abs() < 1e-12,
                    "scale {} offset {}: {} vs {}",
                    table.scale,
                    a + i as isize,
                    got,
                    want
                );
            }
            assert_eq!(kernel.filter().tap(b - 1), 0.0);
        }
    }

    #[test]
    fn kernel_spectrum_is_the_dilated_product() {
        let pair = FilterPair::quadratic_spline();
        let grid = FrequencyGrid::new(125.0).unwrap();
        let hw = magnitude_response(&pair.scaling, &grid);
        let gw = magnitude_response(&pair.wavelet, &grid);
        for j in 1..=5 {
            let kernel = synthesize_kernel(&pair, j).unwrap();
            let direct = magnitude_response(kernel.filter(), &grid);
            for i in 0..=grid.nyquist_index() {
                let mut want = gw[grid.dilated_index(i, 1 << (j - 1))];
                for m in 0..j - 1 {
                    want *= hw[grid.dilated_index(i, 1 << m)];
                }
                assert!(
                    (direct[i] - want).abs() < 1e-9,
                    "scale {j} bin {i}: {} vs {}",
                    direct[i],
                    want
                );
            }
        }
    }

    #[test]
    fn rejects_scales_outside_the_bank() {
        let pair = FilterPair::default();
        assert!(matches!(
            synthesize_kernel(&pair, 0),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
        assert!(KernelBank::default().kernel(MAX_SCALE + 1).is_err());
    }

    #[test]
    fn shared_bank_is_built_once() {
        let a = KernelBank::shared();
        let b = KernelBank::shared();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.kernel(3).unwrap(), &synthesize_kernel(a.pair(), 3).unwrap());
    }
}
