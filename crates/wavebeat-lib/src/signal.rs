use crate::error::{ensure_sample_rate, AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Beat events as sample indices, in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Event times in seconds from the first sample.
    pub fn times(&self, fs: f64) -> Vec<f64> {
        self.indices.iter().map(|&i| i as f64 / fs).collect()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let rr = events
            .indices
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64 / fs)
            .collect();
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }
}

/// The two channels carried by a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Ecg,
    Respiration,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Ecg, Channel::Respiration];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Ecg => "ECG",
            Channel::Respiration => "RESP",
        }
    }
}

/// Simultaneously sampled ECG and respiration on a shared time axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub fs: f64,
    pub time: Vec<f64>,
    pub ecg: Vec<f64>,
    pub respiration: Vec<f64>,
}

impl Recording {
    /// Validates the sample rate, channel lengths and time axis monotonicity.
    pub fn new(
        fs: f64,
        time: Vec<f64>,
        ecg: Vec<f64>,
        respiration: Vec<f64>,
    ) -> AnalysisResult<Self> {
        ensure_sample_rate(fs)?;
        if ecg.is_empty() {
            return Err(AnalysisError::config("recording has no samples"));
        }
        if ecg.len() != respiration.len() || ecg.len() != time.len() {
            return Err(AnalysisError::config(format!(
                "channel lengths differ: time {}, ECG {}, respiration {}",
                time.len(),
                ecg.len(),
                respiration.len()
            )));
        }
        if let Some(pos) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AnalysisError::config(format!(
                "time axis is not strictly increasing at sample {}",
                pos + 1
            )));
        }
        Ok(Self {
            fs,
            time,
            ecg,
            respiration,
        })
    }

    /// Builds a recording whose time axis is `i / fs`.
    pub fn from_channels(fs: f64, ecg: Vec<f64>, respiration: Vec<f64>) -> AnalysisResult<Self> {
        ensure_sample_rate(fs)?;
        let time = (0..ecg.len()).map(|i| i as f64 / fs).collect();
        Self::new(fs, time, ecg, respiration)
    }

    pub fn len(&self) -> usize {
        self.ecg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ecg.is_empty()
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::Ecg => &self.ecg,
            Channel::Respiration => &self.respiration,
        }
    }

    pub fn series(&self, channel: Channel) -> TimeSeries {
        TimeSeries::new(self.fs, self.channel(channel).to_vec())
    }
}
