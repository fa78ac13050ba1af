use super::hrv::{hrv_time, HRVTime};
use crate::error::{ensure_sample_rate, AnalysisError, AnalysisResult};
use crate::signal::{Events, RRSeries};
use log::info;
use serde::{Deserialize, Serialize};

/// Heart rate derived from consecutive beat events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    /// Intervals between adjacent beats, seconds; one fewer than the beats.
    pub rr: RRSeries,
    pub mean_rr_s: f64,
    /// `60 / mean_rr_s`
    pub mean_hr_bpm: f64,
    /// `60 / rr[i]`
    pub instantaneous_hr_bpm: Vec<f64>,
    /// Cumulative sum of the RR intervals; one entry per instantaneous rate.
    pub time_axis_s: Vec<f64>,
    pub hrv: HRVTime,
}

pub fn analyze_rr(events: &Events, fs: f64) -> AnalysisResult<HeartRateSummary> {
    ensure_sample_rate(fs)?;
    if events.len() < 2 {
        return Err(AnalysisError::InsufficientBeats(events.len()));
    }
    let rr = RRSeries::from_events(events, fs);
    let mean_rr_s = rr.rr.iter().sum::<f64>() / rr.len() as f64;
    let mean_hr_bpm = 60.0 / mean_rr_s;
    let instantaneous_hr_bpm = rr.rr.iter().map(|r| 60.0 / r).collect();
    let time_axis_s = rr
        .rr
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(*acc)
        })
        .collect();
    let hrv = hrv_time(&rr);
    info!(
        "{} beats, mean RR {:.4} s, mean heart rate {:.2} bpm",
        events.len(),
        mean_rr_s,
        mean_hr_bpm
    );
    Ok(HeartRateSummary {
        rr,
        mean_rr_s,
        mean_hr_bpm,
        instantaneous_hr_bpm,
        time_axis_s,
        hrv,
    })
}
