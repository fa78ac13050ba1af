use crate::error::{ensure_sample_rate, AnalysisError, AnalysisResult};
use crate::wavelet::{kernel::check_scale, MAX_SCALE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configurable parameters for the wavelet beat detection + RR pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Scale whose ECG detail feeds the detector.
    pub scale: usize,
    /// Deepest scale decomposed for display.
    pub max_scale: usize,
    /// Odd moving-average window (samples).
    pub smoothing_window: usize,
    /// Smoothed energy above this value counts as a pulse.
    pub threshold: f64,
    /// Level assigned to pulse samples.
    pub pulse_high: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale: 3,
            max_scale: MAX_SCALE,
            smoothing_window: 9,
            threshold: 0.31,
            pulse_high: 1.1,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> AnalysisResult<()> {
        check_scale(self.scale)?;
        if self.max_scale < self.scale || self.max_scale > MAX_SCALE {
            return Err(AnalysisError::config(format!(
                "max_scale must be within {}..={MAX_SCALE}, got {}",
                self.scale, self.max_scale
            )));
        }
        check_window(self.smoothing_window)?;
        if !self.threshold.is_finite() {
            return Err(AnalysisError::config("threshold must be finite"));
        }
        if !(self.pulse_high.is_finite() && self.pulse_high > 0.0) {
            return Err(AnalysisError::config(format!(
                "pulse_high must be positive, got {}",
                self.pulse_high
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_window(window: usize) -> AnalysisResult<()> {
    if window == 0 || window % 2 == 0 {
        return Err(AnalysisError::config(format!(
            "smoothing window must be an odd number of samples >= 1, got {window}"
        )));
    }
    Ok(())
}

/// Column layout and conditioning of a tab-separated recording export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordingLayout {
    /// Sampling rate (Hz).
    pub fs: f64,
    /// Header rows before the first sample.
    pub skip_rows: usize,
    /// Column names in file order.
    pub columns: Vec<String>,
    pub time_column: String,
    pub ecg_column: String,
    pub respiration_column: String,
    /// Subtract a least-squares polynomial trend from both channels.
    pub remove_baseline: bool,
    pub baseline_degree: usize,
}

impl Default for RecordingLayout {
    fn default() -> Self {
        Self {
            fs: 125.0,
            skip_rows: 2,
            columns: ["ElapsedTime", "RESP", "PLETH", "V", "AVR", "II"]
                .into_iter()
                .map(String::from)
                .collect(),
            time_column: "ElapsedTime".into(),
            ecg_column: "II".into(),
            respiration_column: "RESP".into(),
            remove_baseline: true,
            baseline_degree: 2,
        }
    }
}

impl RecordingLayout {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        ensure_sample_rate(self.fs)?;
        for name in [
            &self.time_column,
            &self.ecg_column,
            &self.respiration_column,
        ] {
            if self.column_index(name).is_none() {
                return Err(AnalysisError::config(format!(
                    "column '{}' is not in the layout {:?}",
                    name, self.columns
                )));
            }
        }
        Ok(())
    }
}

/// Everything a run needs, loadable from TOML. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub recording: RecordingLayout,
    pub pipeline: PipelineConfig,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).context("parsing settings TOML")?;
        settings.recording.validate()?;
        settings.pipeline.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }
}
