//! Magnitude spectra of the base filters and the Mallat cascade per scale.
//!
//! These are diagnostic products for display; kernel synthesis never reads them.

use super::filter::{Filter, FilterPair};
use crate::error::{ensure_sample_rate, AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Integer-step frequency grid covering one full period `[0, fs]`.
///
/// Bin `i` sits at `i * fs / bins` Hz, which is `i` Hz whenever `fs` is integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyGrid {
    pub fs: f64,
    pub bins: usize,
}

impl FrequencyGrid {
    pub fn new(fs: f64) -> AnalysisResult<Self> {
        ensure_sample_rate(fs)?;
        let bins = fs.round() as usize;
        if bins < 2 {
            return Err(AnalysisError::config(format!(
                "sample rate {fs} Hz is too low for an integer-step frequency grid"
            )));
        }
        Ok(Self { fs, bins })
    }

    pub fn frequency(&self, index: usize) -> f64 {
        index as f64 * self.fs / self.bins as f64
    }

    /// Last retained index of the half spectrum.
    pub fn nyquist_index(&self) -> usize {
        self.bins / 2
    }

    /// Bin holding the frequency `factor` times that of `index`.
    ///
    /// The DTFT is periodic in `fs`, so dilated lookups past the retained half
    /// wrap around the full period instead of reading outside the table.
    pub fn dilated_index(&self, index: usize, factor: usize) -> usize {
        ((index as u128 * factor as u128) % self.bins as u128) as usize
    }
}

/// `|sum_k taps[k] * exp(-i 2 pi k f / fs)|` at every bin of `0..=bins`.
pub fn magnitude_response(filter: &Filter, grid: &FrequencyGrid) -> Vec<f64> {
    (0..=grid.bins)
        .map(|i| {
            let mut re = 0.0;
            let mut im = 0.0;
            for (k, tap) in filter.iter() {
                let phase = 2.0 * PI * (k as f64) * (i as f64) / grid.bins as f64;
                re += tap * phase.cos();
                im -= tap * phase.sin();
            }
            (re * re + im * im).sqrt()
        })
        .collect()
}

/// `Hw` and `Gw` on the retained half spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponses {
    pub grid: FrequencyGrid,
    pub frequencies: Vec<f64>,
    pub hw: Vec<f64>,
    pub gw: Vec<f64>,
    #[serde(skip)]
    gw_period: Vec<f64>,
}

impl BaseResponses {
    pub fn new(pair: &FilterPair, grid: FrequencyGrid) -> Self {
        let half = grid.nyquist_index() + 1;
        let mut hw = magnitude_response(&pair.scaling, &grid);
        let gw_period = magnitude_response(&pair.wavelet, &grid);
        hw.truncate(half);
        Self {
            grid,
            frequencies: (0..half).map(|i| grid.frequency(i)).collect(),
            hw,
            gw: gw_period[..half].to_vec(),
            gw_period,
        }
    }

    /// `Gw` at `factor` times the frequency of bin `index`.
    pub fn gw_dilated(&self, index: usize, factor: usize) -> f64 {
        let i = self.grid.dilated_index(index, factor);
        self.gw_period.get(i).copied().unwrap_or(0.0)
    }
}

/// Composite spectra `Q_j` for `j = 1..=max_scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleResponses {
    pub frequencies: Vec<f64>,
    pub q: BTreeMap<usize, Vec<f64>>,
}

impl ScaleResponses {
    /// `Q_1 = Gw` and `Q_j(f) = Hw(f) * prod_{m=1}^{j-1} Gw(2^m f)`.
    pub fn cascade(base: &BaseResponses, max_scale: usize) -> Self {
        let mut q = BTreeMap::new();
        for j in 1..=max_scale {
            let values = (0..base.hw.len())
                .map(|i| {
                    if j == 1 {
                        return base.gw[i];
                    }
                    (1..j).fold(base.hw[i], |acc, m| acc * base.gw_dilated(i, 1 << m))
                })
                .collect();
            q.insert(j, values);
        }
        Self {
            frequencies: base.frequencies.clone(),
            q,
        }
    }

    pub fn scale(&self, j: usize) -> Option<&[f64]> {
        self.q.get(&j).map(Vec::as_slice)
    }

    /// Bin where `Q_j` peaks.
    pub fn peak_frequency(&self, j: usize) -> Option<f64> {
        let values = self.q.get(&j)?;
        let (idx, _) = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        self.frequencies.get(idx).copied()
    }
}
