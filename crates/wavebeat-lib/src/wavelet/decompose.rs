use super::kernel::{check_scale, Kernel, KernelBank};
use crate::error::{AnalysisError, AnalysisResult};
use crate::signal::{Channel, Recording};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic;
use std::thread;

/// Linear convolution trimmed to the input length.
///
/// Samples outside the signal are zero. Output `i` is full-convolution sample
/// `i + (len(kernel) - 1) / 2`, so an odd kernel is centred on its middle tap.
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let m = kernel.len();
    if n == 0 || m == 0 {
        return vec![0.0; n];
    }
    let shift = (m - 1) / 2;
    (0..n)
        .map(|i| {
            let t = i + shift;
            let k_lo = t.saturating_sub(n - 1);
            let k_hi = t.min(m - 1);
            (k_lo..=k_hi).map(|k| kernel[k] * signal[t - k]).sum()
        })
        .collect()
}

/// Detail signal of `signal` at the kernel's scale, same length as the input.
pub fn decompose(signal: &[f64], kernel: &Kernel) -> AnalysisResult<Vec<f64>> {
    if signal.len() < kernel.len() {
        return Err(AnalysisError::InsufficientData {
            scale: kernel.scale(),
            len: signal.len(),
            required: kernel.len(),
        });
    }
    Ok(convolve_same(signal, kernel.taps()))
}

/// Detail signals of one channel keyed by scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub channel: Channel,
    pub details: BTreeMap<usize, Vec<f64>>,
}

impl Decomposition {
    pub fn detail(&self, scale: usize) -> AnalysisResult<&[f64]> {
        check_scale(scale)?;
        self.details.get(&scale).map(Vec::as_slice).ok_or_else(|| {
            AnalysisError::config(format!(
                "scale {} was not decomposed for {}",
                scale,
                self.channel.label()
            ))
        })
    }

    pub fn scales(&self) -> impl Iterator<Item = usize> + '_ {
        self.details.keys().copied()
    }
}

pub fn decompose_channel(
    channel: Channel,
    signal: &[f64],
    bank: &KernelBank,
    scales: impl IntoIterator<Item = usize>,
) -> AnalysisResult<Decomposition> {
    let mut details = BTreeMap::new();
    for scale in scales {
        let detail = decompose(signal, bank.kernel(scale)?)?;
        details.insert(scale, detail);
    }
    debug!(
        "decomposed {} ({} samples) at {} scale(s)",
        channel.label(),
        signal.len(),
        details.len()
    );
    Ok(Decomposition { channel, details })
}

/// Both channels of a recording decomposed at `1..=max_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingDecomposition {
    pub ecg: Decomposition,
    pub respiration: Decomposition,
}

impl RecordingDecomposition {
    pub fn channel(&self, channel: Channel) -> &Decomposition {
        match channel {
            Channel::Ecg => &self.ecg,
            Channel::Respiration => &self.respiration,
        }
    }
}

/// Decomposes each channel at `scales` on its own scoped thread and joins both
/// before returning.
pub fn decompose_recording(
    recording: &Recording,
    bank: &KernelBank,
    scales: &[usize],
) -> AnalysisResult<RecordingDecomposition> {
    let (ecg, respiration) = thread::scope(|s| {
        let ecg = s.spawn(|| {
            decompose_channel(Channel::Ecg, &recording.ecg, bank, scales.iter().copied())
        });
        let resp = s.spawn(|| {
            decompose_channel(
                Channel::Respiration,
                &recording.respiration,
                bank,
                scales.iter().copied(),
            )
        });
        let ecg = ecg.join().unwrap_or_else(|e| panic::resume_unwind(e));
        let resp = resp.join().unwrap_or_else(|e| panic::resume_unwind(e));
        (ecg, resp)
    });
    Ok(RecordingDecomposition {
        ecg: ecg?,
        respiration: respiration?,
    })
}
