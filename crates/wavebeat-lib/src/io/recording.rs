use crate::config::RecordingLayout;
use crate::preprocess::remove_baseline;
use crate::signal::Recording;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Converts an elapsed-time stamp such as `1:02.344` (or `0:01:02.344`, or plain seconds) to seconds.
pub fn parse_elapsed_time(text: &str) -> Option<f64> {
    let text = strip_quotes(text);
    if text.is_empty() {
        return None;
    }
    let mut seconds = 0.0;
    for part in text.split(':') {
        let value: f64 = part.trim().parse().ok()?;
        if !value.is_finite() || value.is_sign_negative() {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }
    Some(seconds)
}

fn strip_quotes(field: &str) -> &str {
    field.trim().trim_matches(|c| c == '\'' || c == '"').trim()
}

fn parse_value(field: Option<&str>) -> Option<f64> {
    let value: f64 = strip_quotes(field?).parse().ok()?;
    value.is_finite().then_some(value)
}

struct ColumnIndices {
    time: usize,
    ecg: usize,
    respiration: usize,
}

impl ColumnIndices {
    fn resolve(layout: &RecordingLayout) -> Result<Self> {
        let locate = |name: &str| {
            layout
                .column_index(name)
                .ok_or_else(|| anyhow::anyhow!("column '{}' is not in the layout {:?}", name, layout.columns))
        };
        Ok(Self {
            time: locate(&layout.time_column)?,
            ecg: locate(&layout.ecg_column)?,
            respiration: locate(&layout.respiration_column)?,
        })
    }

    fn extract(&self, record: &StringRecord) -> Option<(f64, f64, f64)> {
        let time = parse_elapsed_time(record.get(self.time)?)?;
        let ecg = parse_value(record.get(self.ecg))?;
        let respiration = parse_value(record.get(self.respiration))?;
        Some((time, ecg, respiration))
    }
}

/// Parses a tab-separated export from any reader. Rows whose time or used channels
/// cannot be parsed are skipped with a warning.
pub fn parse_recording<R: Read>(reader: R, layout: &RecordingLayout) -> Result<Recording> {
    layout.validate()?;
    let columns = ColumnIndices::resolve(layout)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut time = Vec::new();
    let mut ecg = Vec::new();
    let mut respiration = Vec::new();
    let mut dropped = 0usize;
    for (row, result) in reader.records().enumerate().skip(layout.skip_rows) {
        let record = result.with_context(|| format!("reading row {}", row + 1))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        match columns.extract(&record) {
            Some((t, e, r)) => {
                time.push(t);
                ecg.push(e);
                respiration.push(r);
            }
            None => {
                dropped += 1;
                warn!("skipping unparseable row {}: {:?}", row + 1, record);
            }
        }
    }
    debug!(
        "parsed {} samples ({} rows dropped) at {} Hz",
        ecg.len(),
        dropped,
        layout.fs
    );

    if layout.remove_baseline && !ecg.is_empty() {
        ecg = remove_baseline(&ecg, layout.baseline_degree).context("removing ECG baseline")?;
        respiration = remove_baseline(&respiration, layout.baseline_degree)
            .context("removing respiration baseline")?;
    }
    Ok(Recording::new(layout.fs, time, ecg, respiration)?)
}

/// Reads a tab-separated recording export from disk.
pub fn read_recording(path: &Path, layout: &RecordingLayout) -> Result<Recording> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_recording(file, layout).with_context(|| format!("loading recording {}", path.display()))
}
