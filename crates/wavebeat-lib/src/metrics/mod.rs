pub mod hrv;
pub mod rr;

pub use hrv::{hrv_time, HRVTime};
pub use rr::{analyze_rr, HeartRateSummary};
