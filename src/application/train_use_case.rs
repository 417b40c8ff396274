// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Validate hyperparameters       (Layer 2)
//   Step 2: Resolve the dataset by name    (Layer 4 - data)
//   Step 3: Validate the model shape       (Layer 5 - ml)
//   Step 4: Read + split the dataset       (Layer 4 - data)
//   Step 5: Open a versioned run log       (Layer 6 - infra)
//   Step 6: Fit, then test                 (Layer 5 - ml)
//
// Steps 1-3 touch no files, so a bad flag fails before any
// data is read.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    cifar::CIFAR_SIDE,
    datamodule::{get_dataset, DataModule},
};
use crate::domain::{
    error::ConfigError,
    image::CHANNELS,
    options::{ModelKind, Precision},
};
use crate::infra::metrics::{MetricsLogger, TestMetrics};
use crate::ml::{model::ConvMixerConfig, trainer::run_training};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a run. Fixed at start-up and saved
// as hparams.json next to the metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub lr:            f64,
    pub model:         ModelKind,
    pub batch_size:    usize,
    pub dirpath:       String,
    pub dataset:       String,
    pub epochs:        usize,
    pub warmup_epochs: usize,
    pub fp:            Precision,
    pub save_top_k:    usize,
    pub patience:      usize,
    pub data_dir:      String,
    pub seed:          u64,
    pub num_workers:   usize,
    pub val_fraction:  f64,
    pub hidden_dim:    usize,
    pub depth:         usize,
    pub kernel_size:   usize,
    pub patch_size:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            lr:            1e-3,
            model:         ModelKind::Cnn,
            batch_size:    32,
            dirpath:       "logs".to_string(),
            dataset:       "cifar10".to_string(),
            epochs:        100,
            warmup_epochs: 10,
            fp:            Precision::Full,
            save_top_k:    3,
            patience:      4,
            data_dir:      "data".to_string(),
            seed:          42,
            num_workers:   2,
            val_fraction:  0.1,
            hidden_dim:    256,
            depth:         8,
            kernel_size:   5,
            patch_size:    2,
        }
    }
}

impl TrainConfig {
    /// Check the numeric hyperparameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(out_of_range("lr", "a positive number", self.lr));
        }
        if self.batch_size == 0 {
            return Err(out_of_range("batch_size", "at least 1", self.batch_size));
        }
        if self.epochs == 0 {
            return Err(out_of_range("epochs", "at least 1", self.epochs));
        }
        if !(self.val_fraction > 0.0 && self.val_fraction < 1.0) {
            return Err(out_of_range("val_fraction", "strictly between 0 and 1", self.val_fraction));
        }
        Ok(())
    }

    fn model_config(&self, num_classes: usize) -> ConvMixerConfig {
        ConvMixerConfig::new(CHANNELS, self.hidden_dim, self.depth)
            .with_kernel_size(self.kernel_size)
            .with_patch_size(self.patch_size)
            .with_num_classes(num_classes)
    }
}

fn out_of_range(name: &'static str, expected: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange { name, expected, value: value.to_string() }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run fit then test; returns the test metrics.
    pub fn execute(&self) -> Result<TestMetrics> {
        let cfg = &self.config;

        // ── Step 1: Hyperparameters ───────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Dataset dispatch ──────────────────────────────────────────
        let source = get_dataset(&cfg.dataset, Path::new(&cfg.data_dir))?;

        // ── Step 3: Model shape ───────────────────────────────────────────────
        cfg.model_config(source.num_classes()).validate()?;
        // Every supported dataset is 32x32
        if cfg.patch_size > CIFAR_SIDE {
            return Err(out_of_range("patch_size", "at most the 32-pixel image side", cfg.patch_size).into());
        }

        // ── Step 4: Load data ─────────────────────────────────────────────────
        tracing::info!("Loading {} from '{}'", source.name(), cfg.data_dir);
        let data = DataModule::setup(source.as_ref(), cfg.val_fraction, cfg.seed)
            .with_context(|| format!("Failed to prepare dataset '{}'", cfg.dataset))?;

        // ── Step 5: Run log ───────────────────────────────────────────────────
        let logger = MetricsLogger::new(&cfg.dirpath, cfg.model.as_str())?;
        logger.log_hyperparams(cfg)?;
        tracing::debug!("Saved hyperparameters to '{}'", logger.dir().join("hparams.json").display());

        // ── Step 6: Fit + test (Layer 5) ──────────────────────────────────────
        run_training(cfg, data, logger)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cifar::tests::write_cifar10;
    use crate::domain::error::ModelError;

    fn small(dir: &Path) -> TrainConfig {
        TrainConfig {
            dirpath:       dir.join("logs").to_string_lossy().into_owned(),
            data_dir:      dir.join("data").to_string_lossy().into_owned(),
            batch_size:    16,
            epochs:        2,
            warmup_epochs: 1,
            hidden_dim:    8,
            depth:         1,
            kernel_size:   3,
            patch_size:    4,
            num_workers:   0,
            val_fraction:  0.2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let cfg = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { name: "batch_size", .. })
        ));
    }

    #[test]
    fn test_val_fraction_bounds() {
        for bad in [0.0, 1.0, -0.5, f64::NAN] {
            let cfg = TrainConfig { val_fraction: bad, ..TrainConfig::default() };
            assert!(cfg.validate().is_err(), "val_fraction {bad} accepted");
        }
    }

    #[test]
    fn test_unknown_dataset_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { dataset: "mnist".into(), ..small(dir.path()) };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownDataset("mnist".into()))
        );
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn test_even_kernel_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { kernel_size: 4, ..small(dir.path()) };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(matches!(err.downcast_ref::<ModelError>(), Some(ModelError::InvalidConfig(_))));
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn test_patch_larger_than_images_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        write_cifar10(&dir.path().join("data"), 2);
        let cfg = TrainConfig { patch_size: 64, ..small(dir.path()) };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::OutOfRange { name: "patch_size", .. })
        ));
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn test_missing_data_names_the_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrainUseCase::new(small(dir.path())).execute().unwrap_err();
        assert!(format!("{err:#}").contains("cifar10"));
    }

    #[test]
    fn test_cifar10_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_cifar10(&dir.path().join("data"), 8);
        let cfg = small(dir.path());

        let test = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(test.test_loss.is_finite());

        let run_dir = dir.path().join("logs").join("cnn").join("version_0");
        let saved: TrainConfig = serde_json::from_str(
            &std::fs::read_to_string(run_dir.join("hparams.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved, cfg);
        assert!(run_dir.join("test.csv").is_file());
        assert!(dir.path().join("logs").join("last.mpk").is_file());
    }
}
