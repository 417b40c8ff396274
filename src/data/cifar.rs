// ============================================================
// Layer 4 — CIFAR Binary Loader
// ============================================================
// Reads the "binary version" of CIFAR-10 and CIFAR-100 as
// distributed by the dataset authors.
//
// Record layout (fixed size, no header):
//   CIFAR-10:  <1 x label byte><3072 x pixel bytes>
//   CIFAR-100: <1 x coarse label><1 x fine label><3072 x pixel bytes>
//
// The 3072 pixel bytes are 1024 red, 1024 green then 1024
// blue values of a 32x32 image, row-major within each plane,
// which is exactly ImageItem's CHW layout.
//
// Directory layout expected under --data_dir:
//   cifar-10-batches-bin/data_batch_1.bin … data_batch_5.bin
//   cifar-10-batches-bin/test_batch.bin
//   cifar-100-binary/train.bin
//   cifar-100-binary/test.bin

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::{
    image::{ImageItem, Normalization, Split, CHANNELS},
    traits::ImageSource,
};

pub const CIFAR_SIDE: usize  = 32;
const PIXEL_BYTES: usize      = CHANNELS * CIFAR_SIDE * CIFAR_SIDE;

/// Which of the two CIFAR variants a source reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CifarVariant {
    Cifar10,
    Cifar100,
}

impl CifarVariant {
    pub fn num_classes(&self) -> usize {
        match self {
            Self::Cifar10  => 10,
            Self::Cifar100 => 100,
        }
    }

    /// Bytes preceding the pixels in every record.
    fn label_bytes(&self) -> usize {
        match self {
            Self::Cifar10  => 1,
            Self::Cifar100 => 2,
        }
    }

    fn record_len(&self) -> usize {
        self.label_bytes() + PIXEL_BYTES
    }

    fn subdir(&self) -> &'static str {
        match self {
            Self::Cifar10  => "cifar-10-batches-bin",
            Self::Cifar100 => "cifar-100-binary",
        }
    }

    fn files(&self, split: Split) -> Vec<String> {
        match (self, split) {
            (Self::Cifar10, Split::Train) => {
                (1..=5).map(|i| format!("data_batch_{i}.bin")).collect()
            }
            (Self::Cifar10, Split::Test)   => vec!["test_batch.bin".to_string()],
            (Self::Cifar100, Split::Train) => vec!["train.bin".to_string()],
            (Self::Cifar100, Split::Test)  => vec!["test.bin".to_string()],
        }
    }
}

/// CIFAR-10 / CIFAR-100 reader rooted at a data directory.
pub struct CifarBinarySource {
    variant: CifarVariant,
    root:    PathBuf,
}

impl CifarBinarySource {
    pub fn new(variant: CifarVariant, data_dir: impl AsRef<Path>) -> Self {
        Self {
            variant,
            root: data_dir.as_ref().join(variant.subdir()),
        }
    }
}

impl ImageSource for CifarBinarySource {
    fn name(&self) -> &str {
        match self.variant {
            CifarVariant::Cifar10  => "cifar10",
            CifarVariant::Cifar100 => "cifar100",
        }
    }

    fn num_classes(&self) -> usize {
        self.variant.num_classes()
    }

    fn normalization(&self) -> Normalization {
        match self.variant {
            CifarVariant::Cifar10  => Normalization::CIFAR10,
            CifarVariant::Cifar100 => Normalization::CIFAR100,
        }
    }

    fn load(&self, split: Split) -> Result<Vec<ImageItem>> {
        let mut items = Vec::new();
        for file in self.variant.files(split) {
            let path  = self.root.join(&file);
            let bytes = fs::read(&path)
                .with_context(|| format!("Cannot read CIFAR file '{}'", path.display()))?;
            let parsed = parse_records(self.variant, &bytes)
                .with_context(|| format!("Malformed CIFAR file '{}'", path.display()))?;
            tracing::debug!("Read {} records from '{}'", parsed.len(), path.display());
            items.extend(parsed);
        }
        Ok(items)
    }
}

/// Decode a whole CIFAR binary file into items.
pub fn parse_records(variant: CifarVariant, bytes: &[u8]) -> Result<Vec<ImageItem>> {
    let record_len = variant.record_len();
    if bytes.len() % record_len != 0 {
        bail!(
            "file length {} is not a multiple of the {}-byte record size",
            bytes.len(),
            record_len
        );
    }

    bytes
        .chunks_exact(record_len)
        .enumerate()
        .map(|(i, record)| {
            // CIFAR-100 keeps the fine label in the second byte
            let label = record[variant.label_bytes() - 1] as usize;
            if label >= variant.num_classes() {
                bail!("record {i} has label {label}, expected < {}", variant.num_classes());
            }
            let pixels = record[variant.label_bytes()..].to_vec();
            Ok(ImageItem::new(pixels, label, CIFAR_SIDE, CIFAR_SIDE))
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build one record whose pixel bytes are all `fill`.
    pub(crate) fn record(variant: CifarVariant, label: u8, fill: u8) -> Vec<u8> {
        let mut rec = match variant {
            CifarVariant::Cifar10  => vec![label],
            CifarVariant::Cifar100 => vec![label / 5, label],
        };
        rec.extend(std::iter::repeat(fill).take(PIXEL_BYTES));
        rec
    }

    /// Write a complete CIFAR-10 directory with `per_file` records per file.
    pub(crate) fn write_cifar10(root: &Path, per_file: usize) {
        let dir = root.join("cifar-10-batches-bin");
        fs::create_dir_all(&dir).unwrap();
        let names = CifarVariant::Cifar10
            .files(Split::Train)
            .into_iter()
            .chain(CifarVariant::Cifar10.files(Split::Test));
        for name in names {
            let bytes: Vec<u8> = (0..per_file)
                .flat_map(|i| record(CifarVariant::Cifar10, (i % 10) as u8, i as u8))
                .collect();
            fs::write(dir.join(name), bytes).unwrap();
        }
    }

    #[test]
    fn test_parse_cifar10_records() {
        let bytes = [
            record(CifarVariant::Cifar10, 3, 10),
            record(CifarVariant::Cifar10, 9, 20),
        ]
        .concat();
        let items = parse_records(CifarVariant::Cifar10, &bytes).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, 3);
        assert_eq!(items[1].label, 9);
        assert_eq!(items[1].pixels.len(), PIXEL_BYTES);
        assert!(items[1].pixels.iter().all(|&p| p == 20));
    }

    #[test]
    fn test_cifar100_uses_fine_label() {
        let bytes = record(CifarVariant::Cifar100, 87, 0);
        assert_eq!(bytes[0], 17); // coarse label
        let items = parse_records(CifarVariant::Cifar100, &bytes).unwrap();
        assert_eq!(items[0].label, 87);
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let mut bytes = record(CifarVariant::Cifar10, 1, 0);
        bytes.pop();
        assert!(parse_records(CifarVariant::Cifar10, &bytes).is_err());
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        let bytes = record(CifarVariant::Cifar10, 10, 0);
        assert!(parse_records(CifarVariant::Cifar10, &bytes).is_err());
    }

    #[test]
    fn test_source_reads_all_training_batches() {
        let dir = tempfile::tempdir().unwrap();
        write_cifar10(dir.path(), 4);

        let source = CifarBinarySource::new(CifarVariant::Cifar10, dir.path());
        assert_eq!(source.load(Split::Train).unwrap().len(), 20);
        assert_eq!(source.load(Split::Test).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_directory_names_the_path() {
        let dir    = tempfile::tempdir().unwrap();
        let source = CifarBinarySource::new(CifarVariant::Cifar100, dir.path());
        let err    = source.load(Split::Train).unwrap_err();
        assert!(format!("{err:#}").contains("cifar-100-binary"));
    }
}
