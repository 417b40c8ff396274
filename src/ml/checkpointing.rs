// ============================================================
// Layer 5 — Checkpoint Retention
// ============================================================
// Keeps the K checkpoints with the lowest val_loss, plus a
// `last` checkpoint rewritten after every validation pass.
// At most K + 1 checkpoint files exist at any time.
//
//   epoch  val_loss  top-2 after           files
//   0      2.10      {0}                   e0, last
//   1      1.70      {0, 1}                e0, e1, last
//   2      1.90      {1, 2}  (evicts 0)    e1, e2, last
//   3      2.50      {1, 2}  (rejected)    e1, e2, last

use anyhow::Result;
use burn::prelude::*;
use std::path::PathBuf;

use crate::infra::{
    checkpoint::{checkpoint_stem, CheckpointManager, LAST_CHECKPOINT},
    metrics::EpochMetrics,
};
use crate::ml::{
    callbacks::{Callback, CallbackAction},
    model::ConvMixer,
};

// ─── TopK ─────────────────────────────────────────────────────────────────────
/// Outcome of offering a scored item to a [`TopK`].
#[derive(Debug, PartialEq)]
pub enum Retention<T> {
    /// The item is not among the best K.
    Rejected,
    /// The item was kept; `evicted` is the item it displaced, if any.
    Kept { evicted: Option<T> },
}

/// The `k` lowest-scored items seen so far. NaN scores rank last.
#[derive(Debug, Clone)]
pub struct TopK<T> {
    k:       usize,
    entries: Vec<(f64, T)>,
}

impl<T> TopK<T> {
    pub fn new(k: usize) -> Self {
        Self { k, entries: Vec::with_capacity(k) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn offer(&mut self, score: f64, item: T) -> Retention<T> {
        let score = if score.is_nan() { f64::INFINITY } else { score };

        if self.k == 0 {
            return Retention::Rejected;
        }
        if self.entries.len() < self.k {
            self.entries.push((score, item));
            return Retention::Kept { evicted: None };
        }

        let Some(worst) = self.worst_index() else {
            return Retention::Rejected;
        };
        // Ties keep the older checkpoint
        if score < self.entries[worst].0 {
            let (_, old) = std::mem::replace(&mut self.entries[worst], (score, item));
            Retention::Kept { evicted: Some(old) }
        } else {
            Retention::Rejected
        }
    }

    /// Lowest-scored item, if any.
    pub fn best(&self) -> Option<&T> {
        self.entries
            .iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }

    pub fn scores(&self) -> Vec<f64> {
        self.entries.iter().map(|(s, _)| *s).collect()
    }

    fn worst_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .max_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
            .map(|(i, _)| i)
    }
}

// ─── ModelCheckpoint ──────────────────────────────────────────────────────────
pub struct ModelCheckpoint {
    manager: CheckpointManager,
    top_k:   TopK<PathBuf>,
}

impl ModelCheckpoint {
    pub fn new(manager: CheckpointManager, save_top_k: usize) -> Self {
        Self { manager, top_k: TopK::new(save_top_k) }
    }

    pub fn best_model_path(&self) -> Option<&PathBuf> {
        self.top_k.best()
    }
}

impl<B: Backend> Callback<B> for ModelCheckpoint {
    fn name(&self) -> &str {
        "ModelCheckpoint"
    }

    fn on_validation_end(&mut self, metrics: &EpochMetrics, model: &ConvMixer<B>) -> Result<CallbackAction> {
        let stem = checkpoint_stem(metrics.epoch, metrics.val_loss);
        let path = self.manager.path_for::<B>(&stem);

        match self.top_k.offer(metrics.val_loss, path) {
            Retention::Kept { evicted } => {
                let saved = self.manager.save_model(model, &stem)?;
                tracing::info!("Epoch {}: saved '{}'", metrics.epoch, saved.display());
                if let Some(old) = evicted {
                    self.manager.remove(&old)?;
                }
            }
            Retention::Rejected => {
                tracing::debug!(
                    "Epoch {}: val_loss={:.4} not in top {}",
                    metrics.epoch,
                    metrics.val_loss,
                    self.top_k.k,
                );
            }
        }

        self.manager.save_model(model, LAST_CHECKPOINT)?;
        Ok(CallbackAction::Continue)
    }

    fn on_fit_end(&mut self) -> Result<()> {
        let files = self.manager.list::<B>()?;
        tracing::info!(
            "Kept {} top-k checkpoints (val_loss {:?}) plus last: {} files in '{}'",
            self.top_k.len(),
            self.top_k.scores(),
            files.len(),
            self.manager.dir().display(),
        );
        match self.best_model_path() {
            Some(path) => tracing::info!("Best checkpoint: '{}'", path.display()),
            None       => tracing::info!("No top-k checkpoints kept"),
        }
        Ok(())
    }
}
