pub mod recording;
pub mod text;

pub use recording::{parse_elapsed_time, parse_recording, read_recording};
pub use text::{parse_event_indices, parse_f64_series, read_event_indices, read_f64_series};
