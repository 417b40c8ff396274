// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From files on disk to tensor batches:
//
//   CIFAR .bin / SVHN .png
//       │
//       ▼
//   ImageSource        → reads a split into Vec<ImageItem>
//       │
//       ▼
//   DataModule         → train / val / test ImageDatasets
//       │
//       ▼
//   ImageBatcher       → normalised [N, 3, H, W] tensors
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop

/// CIFAR-10 / CIFAR-100 binary record reader
pub mod cifar;

/// SVHN as a folder of PNGs
pub mod svhn;

/// Seeded random images
pub mod synthetic;

/// Burn Dataset over in-memory images
pub mod dataset;

/// Burn Batcher producing image/label tensors
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;

/// Dataset-name dispatch and the DataModule
pub mod datamodule;
