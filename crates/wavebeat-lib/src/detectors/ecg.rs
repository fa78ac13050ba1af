use crate::{
    config::{check_window, PipelineConfig},
    error::{ensure_sample_rate, AnalysisError, AnalysisResult},
    metrics::rr::{analyze_rr, HeartRateSummary},
    signal::{Events, Recording, TimeSeries},
    wavelet::{decompose, decompose_recording, KernelBank, RecordingDecomposition},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Intermediate signals and edges of one detector run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatDetection {
    pub rectified: Vec<f64>,
    pub smoothed: Vec<f64>,
    pub pulses: Vec<f64>,
    /// Beat onsets.
    pub rising_edges: Vec<usize>,
    pub falling_edges: Vec<usize>,
}

impl BeatDetection {
    pub fn events(&self) -> Events {
        Events::from_indices(self.rising_edges.clone())
    }
}

/// Full analysis of a recording: decompositions, detector stages and heart rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveletPipelineResult {
    pub fs: f64,
    pub sample_count: usize,
    pub scale: usize,
    /// Display scales up to `max_scale`, minus those in `skipped_scales`.
    pub decomposition: RecordingDecomposition,
    /// Scales whose kernels are longer than the recording.
    pub skipped_scales: Vec<usize>,
    pub detection: BeatDetection,
    pub events: Events,
    pub heart_rate: HeartRateSummary,
}

impl WaveletPipelineResult {
    pub fn summary(&self) -> BeatHrvPipelineResult {
        BeatHrvPipelineResult {
            fs: self.fs,
            sample_count: self.sample_count,
            scale: self.scale,
            events: self.events.clone(),
            heart_rate: self.heart_rate.clone(),
        }
    }
}

/// Beat events and heart rate without the per-sample signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatHrvPipelineResult {
    pub fs: f64,
    pub sample_count: usize,
    pub scale: usize,
    pub events: Events,
    pub heart_rate: HeartRateSummary,
}

impl BeatHrvPipelineResult {
    pub fn from_events(
        ts: &TimeSeries,
        scale: usize,
        events: Events,
    ) -> AnalysisResult<Self> {
        let heart_rate = analyze_rr(&events, ts.fs)?;
        Ok(Self {
            fs: ts.fs,
            sample_count: ts.len(),
            scale,
            events,
            heart_rate,
        })
    }
}

pub fn rectify(signal: &[f64]) -> Vec<f64> {
    signal.iter().map(|x| x.abs()).collect()
}

/// Mirror index without repeating the edge sample (`-1 -> 1`, `n -> n - 2`).
fn reflect_index(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Centred moving average over an odd window; output aligns with the input.
/// Both ends are reflect-padded by `window / 2` samples.
pub fn zero_lag_moving_average(signal: &[f64], window: usize) -> AnalysisResult<Vec<f64>> {
    check_window(window)?;
    if signal.is_empty() {
        return Ok(Vec::new());
    }
    let half = (window / 2) as isize;
    let n = signal.len();
    let padded: Vec<f64> = (-half..n as isize + half)
        .map(|i| signal[reflect_index(i, n)])
        .collect();
    Ok(padded
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect())
}

/// `high` where the signal exceeds `threshold`, 0 elsewhere.
pub fn threshold_pulses(signal: &[f64], threshold: f64, high: f64) -> Vec<f64> {
    signal
        .iter()
        .map(|&v| if v > threshold { high } else { 0.0 })
        .collect()
}

/// `d[i] = p[i] - p[i - 1]`, reading the sample before the start as low.
///
/// A pulse train that starts high therefore opens with a rising edge at 0.
pub fn first_difference(pulses: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    pulses
        .iter()
        .map(|&p| {
            let d = p - prev;
            prev = p;
            d
        })
        .collect()
}

pub fn rising_edges(pulses: &[f64]) -> Vec<usize> {
    first_difference(pulses)
        .iter()
        .enumerate()
        .filter(|(_, d)| **d > 0.0)
        .map(|(i, _)| i)
        .collect()
}

pub fn falling_edges(pulses: &[f64]) -> Vec<usize> {
    first_difference(pulses)
        .iter()
        .enumerate()
        .filter(|(_, d)| **d < 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Rectify, smooth, threshold and edge-detect an already decomposed detail signal.
pub fn detect_beats_in_detail(detail: &[f64], cfg: &PipelineConfig) -> AnalysisResult<BeatDetection> {
    cfg.validate()?;
    let rectified = rectify(detail);
    let smoothed = zero_lag_moving_average(&rectified, cfg.smoothing_window)?;
    let pulses = threshold_pulses(&smoothed, cfg.threshold, cfg.pulse_high);
    let rising = rising_edges(&pulses);
    let falling = falling_edges(&pulses);
    debug!(
        "thresholded {} samples at {}: {} rising / {} falling edges",
        pulses.len(),
        cfg.threshold,
        rising.len(),
        falling.len()
    );
    if rising.len() < 2 {
        return Err(AnalysisError::NoBeatsDetected {
            found: rising.len(),
        });
    }
    Ok(BeatDetection {
        rectified,
        smoothed,
        pulses,
        rising_edges: rising,
        falling_edges: falling,
    })
}

/// Decompose a single ECG channel at the configured scale and detect beats.
pub fn detect_beats(
    ecg: &TimeSeries,
    cfg: &PipelineConfig,
    bank: &KernelBank,
) -> AnalysisResult<BeatDetection> {
    ensure_sample_rate(ecg.fs)?;
    cfg.validate()?;
    let detail = decompose(&ecg.data, bank.kernel(cfg.scale)?)?;
    detect_beats_in_detail(&detail, cfg)
}

/// Single-channel run: beat detection followed by RR analysis.
pub fn run_beat_hrv_pipeline(
    ecg: &TimeSeries,
    cfg: &PipelineConfig,
    bank: &KernelBank,
) -> AnalysisResult<BeatHrvPipelineResult> {
    let detection = detect_beats(ecg, cfg, bank)?;
    BeatHrvPipelineResult::from_events(ecg, cfg.scale, detection.events())
}

/// Decomposes both channels at every scale up to `max_scale` that fits the
/// recording, detects beats on the selected ECG scale and derives heart rate
/// from the rising edges. Only the selected scale must fit.
pub fn run_wavelet_pipeline(
    recording: &Recording,
    cfg: &PipelineConfig,
    bank: &KernelBank,
) -> AnalysisResult<WaveletPipelineResult> {
    cfg.validate()?;
    let len = recording.len();
    let required = bank.kernel(cfg.scale)?.len();
    if len < required {
        return Err(AnalysisError::InsufficientData {
            scale: cfg.scale,
            len,
            required,
        });
    }
    let mut scales = Vec::new();
    let mut skipped_scales = Vec::new();
    for scale in 1..=cfg.max_scale {
        if bank.kernel(scale)?.len() <= len {
            scales.push(scale);
        } else {
            skipped_scales.push(scale);
        }
    }
    if !skipped_scales.is_empty() {
        warn!(
            "{} samples is too short for scale(s) {:?}; left out of the decomposition",
            len, skipped_scales
        );
    }
    let decomposition = decompose_recording(recording, bank, &scales)?;
    let detection = detect_beats_in_detail(decomposition.ecg.detail(cfg.scale)?, cfg)?;
    let events = detection.events();
    let heart_rate = analyze_rr(&events, recording.fs)?;
    info!(
        "scale {}: {} beats in {:.1} s",
        cfg.scale,
        events.len(),
        len as f64 / recording.fs
    );
    Ok(WaveletPipelineResult {
        fs: recording.fs,
        sample_count: len,
        scale: cfg.scale,
        decomposition,
        skipped_scales,
        detection,
        events,
        heart_rate,
    })
}
