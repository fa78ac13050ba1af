pub mod ecg;

pub use ecg::{
    detect_beats, detect_beats_in_detail, run_beat_hrv_pipeline, run_wavelet_pipeline,
    BeatDetection, BeatHrvPipelineResult, WaveletPipelineResult,
};
