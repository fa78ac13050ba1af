use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use plotters::prelude::*;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};
use wavebeat_lib::{
    detectors::{run_beat_hrv_pipeline, run_wavelet_pipeline},
    io::{recording as recording_io, text as text_io},
    metrics::analyze_rr,
    plot::{self, Figure, Series, DEFAULT_MAX_POINTS},
    signal::{Events, Recording, TimeSeries},
    wavelet::{
        decompose_recording, BaseResponses, Filter, FrequencyGrid, KernelBank, ScaleResponses,
        MAX_SCALE,
    },
    PipelineConfig, Settings,
};

#[derive(Parser)]
#[command(
    name = "wavebeat",
    version,
    about = "Dyadic wavelet filter bank, ECG beat detection and heart-rate analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the settings file.
#[derive(clap::Args, Debug)]
struct PipelineArgs {
    /// TOML settings file ([recording] and [pipeline] tables)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sampling rate (Hz)
    #[arg(long)]
    fs: Option<f64>,
    /// Detail scale used for detection
    #[arg(long)]
    scale: Option<usize>,
    /// Odd moving-average window (samples)
    #[arg(long)]
    window: Option<usize>,
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    pulse_high: Option<f64>,
}

impl PipelineArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(fs) = self.fs {
            settings.recording.fs = fs;
        }
        let cfg: &mut PipelineConfig = &mut settings.pipeline;
        if let Some(scale) = self.scale {
            cfg.scale = scale;
        }
        if let Some(window) = self.window {
            cfg.smoothing_window = window;
        }
        if let Some(threshold) = self.threshold {
            cfg.threshold = threshold;
        }
        if let Some(high) = self.pulse_high {
            cfg.pulse_high = high;
        }
        settings.recording.validate()?;
        settings.pipeline.validate()?;
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the base filter pair and the synthesized kernels as JSON
    Filters {
        #[arg(long, default_value_t = MAX_SCALE)]
        max_scale: usize,
    },
    /// Print Hw, Gw and the composite Q_j magnitude responses as JSON
    Responses {
        #[arg(long, default_value_t = 125.0)]
        fs: f64,
        #[arg(long, default_value_t = MAX_SCALE)]
        max_scale: usize,
    },
    /// Decompose both channels of a recording and print one detail scale
    Decompose {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Run wavelet beat detection -> RR -> heart rate in one shot
    BeatHrvPipeline {
        /// Tab-separated multi-channel recording
        #[arg(long, conflicts_with = "samples")]
        input: Option<PathBuf>,
        /// Newline-delimited single-channel ECG samples (stdin when neither is given)
        #[arg(long)]
        samples: Option<PathBuf>,
        /// Include decompositions and detector intermediates in the output
        #[arg(long, requires = "input")]
        full: bool,
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Heart-rate summary from newline-delimited beat sample indices
    HrvRr {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        fs: f64,
    },
    /// Render detail signals, detector stages and heart rate to a PNG via plotters
    Plot {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        args: PipelineArgs,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Filters { max_scale } => cmd_filters(max_scale)?,
        Commands::Responses { fs, max_scale } => cmd_responses(fs, max_scale)?,
        Commands::Decompose { input, args } => cmd_decompose(&input, &args)?,
        Commands::BeatHrvPipeline {
            input,
            samples,
            full,
            args,
        } => cmd_beat_hrv_pipeline(input.as_deref(), samples.as_deref(), full, &args)?,
        Commands::HrvRr { input, fs } => cmd_hrv_rr(input.as_deref(), fs)?,
        Commands::Plot { input, out, args } => cmd_plot(&input, &out, &args)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => text_io::parse_f64_series(&read_stdin()?),
    }
}

fn read_indices(input: Option<&Path>) -> Result<Vec<usize>> {
    match input {
        Some(path) => text_io::read_event_indices(path),
        None => text_io::parse_event_indices(&read_stdin()?),
    }
}

fn load_recording(input: &Path, settings: &Settings) -> Result<Recording> {
    let recording = recording_io::read_recording(input, &settings.recording)?;
    info!(
        "loaded {} samples ({:.1} s) from {}",
        recording.len(),
        recording.len() as f64 / recording.fs,
        input.display()
    );
    Ok(recording)
}

#[derive(Serialize)]
struct KernelOutput<'a> {
    scale: usize,
    support: (isize, isize),
    taps: &'a [f64],
}

#[derive(Serialize)]
struct FiltersOutput<'a> {
    scaling: &'a Filter,
    wavelet: &'a Filter,
    kernels: Vec<KernelOutput<'a>>,
}

fn cmd_filters(max_scale: usize) -> Result<()> {
    anyhow::ensure!(
        (1..=MAX_SCALE).contains(&max_scale),
        "max-scale must be within 1..={MAX_SCALE}, got {max_scale}"
    );
    let bank = KernelBank::shared();
    let kernels = bank
        .kernels()
        .take_while(|k| k.scale() <= max_scale)
        .map(|k| KernelOutput {
            scale: k.scale(),
            support: k.support(),
            taps: k.taps(),
        })
        .collect();
    print_json(&FiltersOutput {
        scaling: &bank.pair().scaling,
        wavelet: &bank.pair().wavelet,
        kernels,
    })
}

#[derive(Serialize)]
struct ResponsesOutput {
    fs: f64,
    frequencies: Vec<f64>,
    hw: Vec<f64>,
    gw: Vec<f64>,
    q: ScaleResponses,
    peak_hz: Vec<(usize, f64)>,
}

fn cmd_responses(fs: f64, max_scale: usize) -> Result<()> {
    anyhow::ensure!(
        (1..=MAX_SCALE).contains(&max_scale),
        "max-scale must be within 1..={MAX_SCALE}, got {max_scale}"
    );
    let base = BaseResponses::new(KernelBank::shared().pair(), FrequencyGrid::new(fs)?);
    let q = ScaleResponses::cascade(&base, max_scale);
    let peak_hz = (1..=max_scale)
        .filter_map(|j| q.peak_frequency(j).map(|f| (j, f)))
        .collect();
    print_json(&ResponsesOutput {
        fs,
        frequencies: base.frequencies,
        hw: base.hw,
        gw: base.gw,
        q,
        peak_hz,
    })
}

#[derive(Serialize)]
struct DecomposeOutput<'a> {
    fs: f64,
    scale: usize,
    time: &'a [f64],
    ecg: &'a [f64],
    respiration: &'a [f64],
}

fn cmd_decompose(input: &Path, args: &PipelineArgs) -> Result<()> {
    let settings = args.settings()?;
    let recording = load_recording(input, &settings)?;
    let scale = settings.pipeline.scale;
    let decomposition = decompose_recording(&recording, KernelBank::shared(), &[scale])?;
    print_json(&DecomposeOutput {
        fs: recording.fs,
        scale,
        time: &recording.time,
        ecg: decomposition.ecg.detail(scale)?,
        respiration: decomposition.respiration.detail(scale)?,
    })
}

fn cmd_beat_hrv_pipeline(
    input: Option<&Path>,
    samples: Option<&Path>,
    full: bool,
    args: &PipelineArgs,
) -> Result<()> {
    let settings = args.settings()?;
    let bank = KernelBank::shared();
    if let Some(path) = input {
        let recording = load_recording(path, &settings)?;
        let result = run_wavelet_pipeline(&recording, &settings.pipeline, bank)?;
        return if full {
            print_json(&result)
        } else {
            print_json(&result.summary())
        };
    }
    let ts = TimeSeries::new(settings.recording.fs, read_samples(samples)?);
    let summary = run_beat_hrv_pipeline(&ts, &settings.pipeline, bank)?;
    print_json(&summary)
}

fn cmd_hrv_rr(input: Option<&Path>, fs: f64) -> Result<()> {
    let events = Events::from_indices(read_indices(input)?);
    print_json(&analyze_rr(&events, fs)?)
}

fn cmd_plot(input: &Path, out: &Path, args: &PipelineArgs) -> Result<()> {
    let settings = args.settings()?;
    let recording = load_recording(input, &settings)?;
    let bank = KernelBank::shared();
    let result = run_wavelet_pipeline(&recording, &settings.pipeline, bank)?;
    let base = BaseResponses::new(bank.pair(), FrequencyGrid::new(recording.fs)?);
    let responses = ScaleResponses::cascade(&base, MAX_SCALE);
    let figures = plot::pipeline_figures(&result, &responses, DEFAULT_MAX_POINTS)?;
    draw_plotters_figures(out, &figures)?;
    info!("wrote {} panels to {}", figures.len(), out.display());
    Ok(())
}

fn rgb(color: plot::Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

/// Widens a degenerate range so plotters can map it.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

fn draw_plotters_figures(path: &Path, figures: &[Figure]) -> Result<()> {
    let height = 280 * figures.len().max(1) as u32;
    let root = BitMapBackend::new(path, (1000, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((figures.len().max(1), 1));
    for (fig, area) in figures.iter().zip(panels.iter()) {
        let (x_min, x_max, y_min, y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
        let (x_min, x_max) = padded(x_min, x_max);
        let (y_min, y_max) = padded(y_min, y_max);
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 20),
            )
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let color = rgb(line.style.color);
                    chart
                        .draw_series(LineSeries::new(
                            line.points.iter().map(|p| (p[0], p[1])),
                            color.stroke_width(line.style.width.round().max(1.0) as u32),
                        ))?
                        .label(line.name.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
                }
                Series::Markers(markers) => {
                    let color = rgb(markers.style.color);
                    let radius = markers.style.width.round().max(1.0) as i32;
                    chart
                        .draw_series(
                            markers
                                .points
                                .iter()
                                .map(|p| Circle::new((p[0], p[1]), radius, color.filled())),
                        )?
                        .label(markers.name.as_str())
                        .legend(move |(x, y)| Circle::new((x + 8, y), 3, color.filled()));
                }
            }
        }
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}
