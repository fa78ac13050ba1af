use crate::detectors::{BeatDetection, WaveletPipelineResult};
use crate::error::AnalysisResult;
use crate::metrics::HeartRateSummary;
use crate::signal::{Events, TimeSeries};
use crate::wavelet::{Decomposition, ScaleResponses};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_POINTS: usize = 2048;

const PALETTE: [u32; 8] = [
    0x1F77B4, 0xFF7F0E, 0x2CA02C, 0xD62728, 0x9467BD, 0x8C564B, 0xE377C2, 0x17BECF,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

impl Style {
    pub fn solid(width: f32, color: u32) -> Self {
        Self {
            width,
            dash: None,
            color: Color(color),
        }
    }
}

/// `0xRRGGBB`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    /// Drawn as dots, e.g. detected beats.
    Markers(LineSeries),
}

impl Series {
    pub fn inner(&self) -> &LineSeries {
        match self {
            Series::Line(s) | Series::Markers(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis::default(),
            y: Axis::default(),
            series: Vec::new(),
        }
    }

    pub fn with_labels(mut self, x: &str, y: &str) -> Self {
        self.x.label = Some(x.into());
        self.y.label = Some(y.into());
        self
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every finite point, `None` for an empty figure.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .series
            .iter()
            .flat_map(|s| s.inner().points.iter())
            .filter(|p| p[0].is_finite() && p[1].is_finite());
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

/// Keeps the first point of each of `max_points` equal buckets.
pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| (i as f64 * bucket_size).floor() as usize)
        .take_while(|&start| start < points.len())
        .map(|start| points[start])
        .collect()
}

fn sampled_points(data: &[f64], fs: f64) -> Vec<[f64; 2]> {
    data.iter()
        .enumerate()
        .map(|(i, value)| [i as f64 / fs, *value])
        .collect()
}

fn line(name: &str, points: Vec<[f64; 2]>, max_points: usize, width: f32, color: u32) -> Series {
    Series::Line(LineSeries {
        name: name.into(),
        points: decimate_points(&points, max_points),
        style: Style::solid(width, color),
    })
}

pub fn figure_from_timeseries(
    title: &str,
    series: &TimeSeries,
    max_points: usize,
    color: u32,
) -> Figure {
    let mut fig = Figure::new(Some(title.into())).with_labels("time (s)", "amplitude");
    fig.add_series(line(
        title,
        sampled_points(&series.data, series.fs),
        max_points,
        1.4,
        color,
    ));
    fig
}

/// One trace per detail scale, each shifted down so they stack.
pub fn figure_from_decomposition(decomposition: &Decomposition, fs: f64, max_points: usize) -> Figure {
    let title = format!("{} wavelet details", decomposition.channel.label());
    let mut fig = Figure::new(Some(title)).with_labels("time (s)", "detail (offset per scale)");
    let spacing = decomposition
        .details
        .values()
        .flat_map(|d| d.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()))
        .max(f64::EPSILON)
        * 2.0;
    for (row, (scale, detail)) in decomposition.details.iter().enumerate() {
        let offset = -(row as f64) * spacing;
        let points = detail
            .iter()
            .enumerate()
            .map(|(i, v)| [i as f64 / fs, v + offset])
            .collect();
        fig.add_series(line(
            &format!("W{scale}"),
            points,
            max_points,
            1.0,
            PALETTE[row % PALETTE.len()],
        ));
    }
    fig
}

/// Smoothed envelope, threshold pulses and beat onsets.
pub fn figure_from_detection(detection: &BeatDetection, fs: f64, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some("Beat detection".into())).with_labels("time (s)", "amplitude");
    fig.add_series(line(
        "envelope",
        sampled_points(&detection.smoothed, fs),
        max_points,
        1.4,
        PALETTE[0],
    ));
    fig.add_series(line(
        "pulses",
        sampled_points(&detection.pulses, fs),
        max_points,
        1.0,
        PALETTE[1],
    ));
    fig.add_series(beat_markers(&detection.events(), &detection.smoothed, fs));
    fig
}

fn beat_markers(events: &Events, trace: &[f64], fs: f64) -> Series {
    let points = events
        .indices
        .iter()
        .filter_map(|&i| trace.get(i).map(|v| [i as f64 / fs, *v]))
        .collect();
    Series::Markers(LineSeries {
        name: "beats".into(),
        points,
        style: Style::solid(3.0, PALETTE[3]),
    })
}

/// Instantaneous heart rate against the cumulative RR time axis.
pub fn figure_from_heart_rate(summary: &HeartRateSummary) -> Figure {
    let mut fig = Figure::new(Some(format!(
        "Heart rate (mean {:.1} bpm)",
        summary.mean_hr_bpm
    )))
    .with_labels("time (s)", "heart rate (bpm)");
    let points = summary
        .time_axis_s
        .iter()
        .zip(&summary.instantaneous_hr_bpm)
        .map(|(t, hr)| [*t, *hr])
        .collect();
    fig.add_series(line("HR", points, usize::MAX, 2.0, 0xFF0077));
    fig
}

/// Magnitude responses `Q_j`, one trace per scale.
pub fn figure_from_scale_responses(responses: &ScaleResponses) -> Figure {
    let mut fig = Figure::new(Some("Equivalent filter responses".into()))
        .with_labels("frequency (Hz)", "|Q_j|");
    for (row, (scale, q)) in responses.q.iter().enumerate() {
        let points = responses
            .frequencies
            .iter()
            .zip(q)
            .map(|(f, v)| [*f, *v])
            .collect();
        fig.add_series(line(
            &format!("Q{scale}"),
            points,
            usize::MAX,
            1.6,
            PALETTE[row % PALETTE.len()],
        ));
    }
    fig
}

/// Panels for a full analysis run, top to bottom: selected-scale details of
/// both channels, every ECG detail scale, detector stages, heart rate and the
/// `Q_j` responses.
pub fn pipeline_figures(
    result: &WaveletPipelineResult,
    responses: &ScaleResponses,
    max_points: usize,
) -> AnalysisResult<Vec<Figure>> {
    let mut figures = Vec::new();
    for decomposition in [&result.decomposition.ecg, &result.decomposition.respiration] {
        let detail = TimeSeries::new(result.fs, decomposition.detail(result.scale)?.to_vec());
        let title = format!("{} detail W{}", decomposition.channel.label(), result.scale);
        figures.push(figure_from_timeseries(&title, &detail, max_points, PALETTE[0]));
    }
    figures.push(figure_from_decomposition(
        &result.decomposition.ecg,
        result.fs,
        max_points,
    ));
    figures.push(figure_from_detection(&result.detection, result.fs, max_points));
    figures.push(figure_from_heart_rate(&result.heart_rate));
    figures.push(figure_from_scale_responses(responses));
    Ok(figures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::analyze_rr;
    use crate::wavelet::{BaseResponses, FilterPair, FrequencyGrid};
    use crate::Channel;
    use std::collections::BTreeMap;

    #[test]
    fn decimation_keeps_bucket_heads() {
        let points: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 0.0]).collect();
        let out = decimate_points(&points, 5);
        let xs: Vec<f64> = out.iter().map(|p| p[0]).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(decimate_points(&points, 20).len(), 10);
        assert_eq!(decimate_points(&points, 0).len(), 10);
    }

    #[test]
    fn color_channels() {
        assert_eq!(Color(0xFF0077).rgb(), (0xFF, 0x00, 0x77));
    }

    #[test]
    fn heart_rate_figure_uses_cumulative_time() {
        let summary = analyze_rr(&Events::from_indices(vec![0, 100, 225]), 125.0).unwrap();
        let fig = figure_from_heart_rate(&summary);
        let pts = &fig.series[0].inner().points;
        assert_eq!(pts.len(), 2);
        assert!((pts[0][0] - 0.8).abs() < 1e-12);
        assert!((pts[0][1] - 75.0).abs() < 1e-9);
        assert!((pts[1][0] - 1.8).abs() < 1e-12);
        assert!((pts[1][1] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn decomposition_traces_are_stacked() {
        let mut details = BTreeMap::new();
        details.insert(1, vec![1.0, -1.0, 0.5]);
        details.insert(2, vec![0.0, 2.0, 0.0]);
        let decomposition = Decomposition {
            channel: Channel::Ecg,
            details,
        };
        let fig = figure_from_decomposition(&decomposition, 1.0, 100);
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[1].inner().name, "W2");
        // spacing is twice the largest magnitude
        assert_eq!(fig.series[1].inner().points[1], [1.0, 2.0 - 4.0]);
        let (x0, x1, y0, y1) = fig.bounds().unwrap();
        assert_eq!((x0, x1), (0.0, 2.0));
        assert_eq!((y0, y1), (-4.0, 1.0));
    }

    #[test]
    fn response_figure_has_one_trace_per_scale() {
        let base = BaseResponses::new(
            &FilterPair::quadratic_spline(),
            FrequencyGrid::new(125.0).unwrap(),
        );
        let responses = ScaleResponses::cascade(&base, 5);
        let fig = figure_from_scale_responses(&responses);
        assert_eq!(fig.series.len(), 5);
        assert!(fig
            .series
            .iter()
            .all(|s| s.inner().points.len() == responses.frequencies.len()));
    }

    #[test]
    fn pipeline_panels_cover_every_stage() {
        use crate::detectors::run_wavelet_pipeline;
        use crate::wavelet::{KernelBank, MAX_SCALE};
        use crate::{PipelineConfig, Recording};

        let mut ecg = vec![0.0; 500];
        for apex in [60, 185, 310, 435] {
            ecg[apex - 1] = 0.5;
            ecg[apex] = 1.0;
            ecg[apex + 1] = 0.5;
        }
        let recording = Recording::from_channels(125.0, ecg, vec![0.0; 500]).unwrap();
        let result =
            run_wavelet_pipeline(&recording, &PipelineConfig::default(), KernelBank::shared())
                .unwrap();
        let base = BaseResponses::new(
            &FilterPair::quadratic_spline(),
            FrequencyGrid::new(125.0).unwrap(),
        );
        let responses = ScaleResponses::cascade(&base, MAX_SCALE);

        let figures = pipeline_figures(&result, &responses, DEFAULT_MAX_POINTS).unwrap();
        assert_eq!(figures.len(), 6);
        assert_eq!(figures[0].title.as_deref(), Some("ECG detail W3"));
        assert_eq!(figures[1].title.as_deref(), Some("RESP detail W3"));
        // scale 8 does not fit 500 samples
        assert_eq!(figures[2].series.len(), 7);
        assert_eq!(figures[3].series[2].inner().points.len(), 4);
        assert_eq!(figures[4].series[0].inner().points.len(), 3);
        assert_eq!(figures[5].series.len(), MAX_SCALE);
    }

    #[test]
    fn empty_figure_has_no_bounds() {
        assert!(Figure::new(None::<String>).bounds().is_none());
    }
}
