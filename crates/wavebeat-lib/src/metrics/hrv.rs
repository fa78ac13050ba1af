use crate::signal::RRSeries;
use serde::{Deserialize, Serialize};

/// Successive differences above this many seconds count towards pNN50.
const NN50_LIMIT_S: f64 = 0.050;

/// Time-domain HRV statistics of an RR series (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HRVTime {
    pub n: usize,
    pub avnn: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub pnn50: f64,
}

pub fn hrv_time(rr: &RRSeries) -> HRVTime {
    let n = rr.rr.len();
    if n == 0 {
        return HRVTime {
            n,
            avnn: 0.0,
            sdnn: 0.0,
            rmssd: 0.0,
            pnn50: 0.0,
        };
    }
    let avnn = rr.rr.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return HRVTime {
            n,
            avnn,
            sdnn: 0.0,
            rmssd: 0.0,
            pnn50: 0.0,
        };
    }
    let sdnn = (rr.rr.iter().map(|x| (x - avnn).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt();
    let diffs: Vec<f64> = rr.rr.windows(2).map(|w| w[1] - w[0]).collect();
    let rmssd = (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt();
    let nn50 = diffs.iter().filter(|d| d.abs() > NN50_LIMIT_S).count();
    HRVTime {
        n,
        avnn,
        sdnn,
        rmssd,
        pnn50: nn50 as f64 / diffs.len() as f64,
    }
}
