// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves ConvMixer weights with Burn's named
// MessagePack recorder at full precision.
//
// File naming convention (inside --dirpath):
//   epoch=000-val_loss=2.14.mpk   ← a top-k checkpoint
//   epoch=003-val_loss=1.02.mpk
//   last.mpk                      ← most recent epoch, overwritten
//
// Which files exist at any moment is decided by the
// ModelCheckpoint callback; this type only does the I/O.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FileRecorder, FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::ConvMixer;

pub type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Stem of the always-kept most recent checkpoint.
pub const LAST_CHECKPOINT: &str = "last";

/// `epoch={epoch:03}-val_loss={val_loss:.2}`
pub fn checkpoint_stem(epoch: usize, val_loss: f64) -> String {
    format!("epoch={epoch:03}-val_loss={val_loss:.2}")
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path, extension included, of the checkpoint called `stem`.
    ///
    /// The extension is appended rather than set: stems contain a
    /// decimal point (`val_loss=0.52`) that must survive.
    pub fn path_for<B: Backend>(&self, stem: &str) -> PathBuf {
        let ext = <CheckpointRecorder as FileRecorder<B>>::file_extension();
        self.dir.join(format!("{stem}.{ext}"))
    }

    /// Write `model`'s weights as `<stem>.mpk`, replacing any existing file.
    pub fn save_model<B: Backend>(&self, model: &ConvMixer<B>, stem: &str) -> Result<PathBuf> {
        let path = self.path_for::<B>(stem);

        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| anyhow::anyhow!("Failed to save checkpoint to '{}': {e}", path.display()))?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .with_context(|| format!("Cannot remove checkpoint '{}'", path.display()))?;
        tracing::debug!("Removed checkpoint '{}'", path.display());
        Ok(())
    }

    /// Every checkpoint file currently in the directory, sorted by name.
    pub fn list<B: Backend>(&self) -> Result<Vec<PathBuf>> {
        let ext = <CheckpointRecorder as FileRecorder<B>>::file_extension();
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read '{}'", self.dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some(ext))
            .collect();
        files.sort();
        Ok(files)
    }
}
