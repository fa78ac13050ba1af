use thiserror::Error;

/// Result type for every fallible analysis step.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Failures reported by the filter bank, the beat detector and the RR analyzer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Bad window size, scale index, sample rate or other option.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The signal is shorter than the support of the kernel it is convolved with.
    #[error("insufficient data: scale {scale} needs at least {required} samples, got {len}")]
    InsufficientData {
        scale: usize,
        len: usize,
        required: usize,
    },

    /// Thresholding produced fewer than two rising edges.
    #[error("no beats detected: thresholding produced {found} rising edge(s), need at least 2")]
    NoBeatsDetected { found: usize },

    /// RR analysis received fewer than two beat events.
    #[error("insufficient beats: RR analysis needs at least 2 beats, got {0}")]
    InsufficientBeats(usize),
}

impl AnalysisError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidConfiguration(msg.into())
    }
}

/// Reject sample rates that cannot normalise an index difference into seconds.
pub(crate) fn ensure_sample_rate(fs: f64) -> AnalysisResult<()> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::config(format!(
            "sample rate must be a positive finite number, got {fs}"
        )))
    }
}
