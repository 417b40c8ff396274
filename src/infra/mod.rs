// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the training loop and its
// callbacks:
//
//   checkpoint.rs : Saving and loading model weights with
//                   Burn's named MessagePack recorder.
//                   File names carry the epoch and val_loss.
//
//   metrics.rs    : Versioned run directory with the run
//                   configuration (hparams.json) and CSV
//                   files for epoch metrics, learning rate
//                   and test results.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
