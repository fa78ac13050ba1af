pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod preprocess;
pub mod signal;
pub mod wavelet;

pub use config::{PipelineConfig, RecordingLayout, Settings};
pub use detectors::*;
pub use error::{AnalysisError, AnalysisResult};
pub use metrics::*;
pub use signal::*;
