// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// Every flag of the single `train` entry point. Flag names
// keep their underscore spelling (`--batch_size`).
//
// clap's derive macros generate:
//   - help text (--help)
//   - type conversion (string → usize, f64, ModelKind, ...)
//
// `--dataset` stays a plain string here; it is resolved by
// the data layer so the error lists every valid name.

use clap::Args;

use crate::application::train_use_case::TrainConfig;
use crate::domain::options::{ModelKind, Precision};

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Peak learning rate reached after warmup
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Model architecture (`cnn` = ConvMixer)
    #[arg(long, default_value = "cnn")]
    pub model: ModelKind,

    /// Images per optimizer step
    #[arg(long = "batch_size", default_value_t = 32)]
    pub batch_size: usize,

    /// Directory for checkpoints and run logs
    #[arg(long, default_value = "logs")]
    pub dirpath: String,

    /// One of `cifar10`, `cifar100`, `svhn`
    #[arg(long, default_value = "cifar10")]
    pub dataset: String,

    /// Maximum number of passes over the training data
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Epochs of linear learning-rate warmup
    #[arg(long = "warmup_epochs", default_value_t = 10)]
    pub warmup_epochs: usize,

    /// Floating point precision, 16 or 32
    #[arg(long, default_value = "32")]
    pub fp: Precision,

    /// Number of best checkpoints (lowest val_loss) to keep
    #[arg(long = "save_top_k", default_value_t = 3)]
    pub save_top_k: usize,

    /// Validation checks without improvement before stopping
    #[arg(long, default_value_t = 4)]
    pub patience: usize,

    /// Root directory holding the dataset files
    #[arg(long = "data_dir", default_value = "data")]
    pub data_dir: String,

    /// Seed for weight init, the validation split and shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loading threads (0 loads on the training thread)
    #[arg(long = "num_workers", default_value_t = 2)]
    pub num_workers: usize,

    /// Share of the training split held out for validation
    #[arg(long = "val_fraction", default_value_t = 0.1)]
    pub val_fraction: f64,

    /// Channels of every mixer layer
    #[arg(long = "hidden_dim", default_value_t = 256)]
    pub hidden_dim: usize,

    /// Number of mixer layers
    #[arg(long, default_value_t = 8)]
    pub depth: usize,

    /// Depthwise convolution kernel size (odd)
    #[arg(long = "kernel_size", default_value_t = 5)]
    pub kernel_size: usize,

    /// Side of the square patches
    #[arg(long = "patch_size", default_value_t = 2)]
    pub patch_size: usize,
}

/// Boundary between Layer 1 and Layer 2: the application
/// layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            lr:            a.lr,
            model:         a.model,
            batch_size:    a.batch_size,
            dirpath:       a.dirpath,
            dataset:       a.dataset,
            epochs:        a.epochs,
            warmup_epochs: a.warmup_epochs,
            fp:            a.fp,
            save_top_k:    a.save_top_k,
            patience:      a.patience,
            data_dir:      a.data_dir,
            seed:          a.seed,
            num_workers:   a.num_workers,
            val_fraction:  a.val_fraction,
            hidden_dim:    a.hidden_dim,
            depth:         a.depth,
            kernel_size:   a.kernel_size,
            patch_size:    a.patch_size,
        }
    }
}
