// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// The default build trains on the CPU with NdArray. Building
// with `--features wgpu` trains on the GPU and makes `--fp 16`
// run in half precision.

use burn::backend::Autodiff;

#[cfg(not(feature = "wgpu"))]
pub type FullBackend = Autodiff<burn::backend::NdArray<f32>>;

#[cfg(feature = "wgpu")]
pub type FullBackend = Autodiff<burn::backend::Wgpu<f32, i32>>;

#[cfg(feature = "wgpu")]
pub type HalfBackend = Autodiff<burn::backend::Wgpu<burn::tensor::f16, i32>>;

/// Human-readable backend name for log lines.
pub fn backend_name() -> &'static str {
    if cfg!(feature = "wgpu") {
        "wgpu"
    } else {
        "ndarray"
    }
}
