// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only sees ImageSource; it never
// knows whether images came from CIFAR binary records, a
// folder of PNGs or a random generator.

use anyhow::Result;

use crate::domain::image::{ImageItem, Normalization, Split};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Anything that can produce labelled images for a split.
///
/// Implementations:
///   - CifarBinarySource  → CIFAR-10 / CIFAR-100 binary records
///   - SvhnFolderSource   → SVHN as a directory of PNGs per digit
///   - SyntheticSource    → seeded random images (tests)
pub trait ImageSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Number of distinct labels.
    fn num_classes(&self) -> usize;

    /// Channel statistics used by the batcher.
    fn normalization(&self) -> Normalization;

    /// Read every item in the requested split.
    fn load(&self, split: Split) -> Result<Vec<ImageItem>>;
}
