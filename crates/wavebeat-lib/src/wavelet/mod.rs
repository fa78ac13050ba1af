//! Dyadic quadratic-spline filter bank: base filters, spectra, kernels and
//! multiscale convolution.

pub mod decompose;
pub mod filter;
pub mod kernel;
pub mod response;

pub use decompose::{
    convolve_same, decompose, decompose_channel, decompose_recording, Decomposition,
    RecordingDecomposition,
};
pub use filter::{dirac, Filter, FilterPair};
pub use kernel::{kernel_support, synthesize_kernel, Kernel, KernelBank};
pub use response::{magnitude_response, BaseResponses, FrequencyGrid, ScaleResponses};

/// Deepest scale of the filter bank.
pub const MAX_SCALE: usize = 8;
