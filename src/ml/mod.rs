// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches tensors, modules or optimizers.
//
//   model.rs         : ConvMixer with patch embedding, mixer
//                      layers, pooling, linear classifier
//   residual.rs      : y = T(x) + x with a shape check
//   schedule.rs      : per-step warmup + cosine learning rate
//   callbacks.rs     : callback hooks, early stopping,
//                      learning-rate monitor
//   checkpointing.rs : top-k + last checkpoint retention
//   trainer.rs       : the fit / validate / test loop
//   backend.rs       : CPU or GPU backend per build feature
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Trockman & Kolter (2022) Patches Are All You Need?

/// ConvMixer architecture
pub mod model;

/// Residual connection
pub mod residual;

/// Learning-rate schedule
pub mod schedule;

/// Training callbacks
pub mod callbacks;

/// Checkpoint retention callback
pub mod checkpointing;

/// Fit + test loop
pub mod trainer;

/// Backend type aliases
pub mod backend;
