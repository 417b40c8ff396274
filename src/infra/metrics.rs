// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Writes run metrics as CSV under a fresh version directory:
//
//   <save_dir>/<name>/version_<n>/
//     hparams.json   ← the run configuration
//     metrics.csv    ← one row per epoch
//     lr.csv         ← learning rate of every optimizer step
//     steps.csv      ← training loss of every optimizer step
//     test.csv       ← one row after the test phase
//
// <n> is one past the highest existing version, so repeated
// runs with the same --dirpath never overwrite each other.
//
// Example metrics.csv:
//   epoch,step,train_loss,val_loss,val_acc
//   0,1407,1.842113,1.611742,0.412000
//   1,2814,1.402275,1.298510,0.534600

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// One row of metrics for a finished epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 0-indexed epoch
    pub epoch: usize,

    /// Global optimizer step count at the end of the epoch
    pub step: usize,

    /// Mean cross-entropy over the epoch's training batches
    pub train_loss: f64,

    /// Mean cross-entropy on the validation set
    pub val_loss: f64,

    /// Fraction of validation images classified correctly
    pub val_acc: f64,
}

/// Result of the test phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub test_loss: f64,
    pub test_acc:  f64,
}

#[derive(Debug, Clone)]
pub struct MetricsLogger {
    dir: PathBuf,
}

impl MetricsLogger {
    /// Create `<save_dir>/<name>/version_<n>` and write the CSV headers.
    pub fn new(save_dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let base    = save_dir.as_ref().join(name);
        let version = next_version(&base)?;
        let dir     = base.join(format!("version_{version}"));

        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let logger = Self { dir };
        logger.write_header("metrics.csv", "epoch,step,train_loss,val_loss,val_acc")?;
        logger.write_header("lr.csv", "step,lr-Adam")?;
        logger.write_header("steps.csv", "step,train_loss")?;

        tracing::info!("Logging metrics to '{}'", logger.dir.display());
        Ok(logger)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist the run configuration next to the metrics.
    pub fn log_hyperparams<T: Serialize>(&self, hparams: &T) -> Result<()> {
        let path = self.dir.join("hparams.json");
        let json = serde_json::to_string_pretty(hparams)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(())
    }

    pub fn log_epoch(&self, m: &EpochMetrics) -> Result<()> {
        self.append(
            "metrics.csv",
            &format!(
                "{},{},{:.6},{:.6},{:.6}",
                m.epoch, m.step, m.train_loss, m.val_loss, m.val_acc
            ),
        )?;
        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn log_lr(&self, step: usize, lr: f64) -> Result<()> {
        self.append("lr.csv", &format!("{step},{lr:.8e}"))
    }

    pub fn log_step(&self, step: usize, train_loss: f64) -> Result<()> {
        self.append("steps.csv", &format!("{step},{train_loss:.6}"))
    }

    pub fn log_test(&self, m: &TestMetrics) -> Result<()> {
        self.write_header("test.csv", "test_loss,test_acc")?;
        self.append("test.csv", &format!("{:.6},{:.6}", m.test_loss, m.test_acc))
    }

    fn write_header(&self, file: &str, header: &str) -> Result<()> {
        let path = self.dir.join(file);
        if !path.exists() {
            let mut f = fs::File::create(&path)
                .with_context(|| format!("Cannot create '{}'", path.display()))?;
            writeln!(f, "{header}")?;
        }
        Ok(())
    }

    fn append(&self, file: &str, row: &str) -> Result<()> {
        let path  = self.dir.join(file);
        let mut f = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("Cannot append to '{}'", path.display()))?;
        writeln!(f, "{row}")?;
        Ok(())
    }
}

/// One past the highest `version_<n>` directory under `base`, or 0.
fn next_version(base: &Path) -> Result<usize> {
    if !base.is_dir() {
        return Ok(0);
    }
    let mut next = 0;
    for entry in fs::read_dir(base)
        .with_context(|| format!("Cannot read '{}'", base.display()))?
    {
        let name = entry?.file_name();
        if let Some(n) = name
            .to_str()
            .and_then(|s| s.strip_prefix("version_"))
            .and_then(|s| s.parse::<usize>().ok())
        {
            next = next.max(n + 1);
        }
    }
    Ok(next)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_increment() {
        let dir = tempfile::tempdir().unwrap();
        let a   = MetricsLogger::new(dir.path(), "cnn").unwrap();
        let b   = MetricsLogger::new(dir.path(), "cnn").unwrap();
        assert!(a.dir().ends_with("cnn/version_0"));
        assert!(b.dir().ends_with("cnn/version_1"));
    }

    #[test]
    fn test_epoch_rows_are_appended() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), "cnn").unwrap();
        logger.log_epoch(&EpochMetrics { epoch: 0, step: 10, train_loss: 2.0, val_loss: 1.5, val_acc: 0.25 }).unwrap();
        logger.log_epoch(&EpochMetrics { epoch: 1, step: 20, train_loss: 1.0, val_loss: 1.25, val_acc: 0.5 }).unwrap();

        let csv   = fs::read_to_string(logger.dir().join("metrics.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,step,train_loss,val_loss,val_acc");
        assert_eq!(lines[1], "0,10,2.000000,1.500000,0.250000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_lr_and_test_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), "cnn").unwrap();
        logger.log_lr(0, 1e-3).unwrap();
        logger.log_lr(1, 5e-4).unwrap();
        logger.log_test(&TestMetrics { test_loss: 0.5, test_acc: 0.875 }).unwrap();

        let lr = fs::read_to_string(logger.dir().join("lr.csv")).unwrap();
        assert_eq!(lr.lines().count(), 3);
        assert!(lr.lines().nth(1).unwrap().starts_with("0,"));

        let test = fs::read_to_string(logger.dir().join("test.csv")).unwrap();
        assert_eq!(test, "test_loss,test_acc\n0.500000,0.875000\n");
    }

    #[test]
    fn test_hyperparams_are_json() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), "cnn").unwrap();
        logger.log_hyperparams(&serde_json::json!({ "lr": 0.001 })).unwrap();

        let text = fs::read_to_string(logger.dir().join("hparams.json")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["lr"], 0.001);
    }
}
