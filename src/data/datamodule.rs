// ============================================================
// Layer 4 — Data Module and Dataset Dispatch
// ============================================================
// get_dataset() maps a dataset name to its ImageSource.
// DataModule::setup() then reads the source once and holds
// the three datasets a run needs:
//
//   train split ──shuffle(seed)──► train  (1 - val_fraction)
//                               └► val    (val_fraction)
//   test split  ────────────────► test

use anyhow::Result;
use std::path::Path;

use crate::data::{
    cifar::{CifarBinarySource, CifarVariant},
    dataset::ImageDataset,
    splitter::split_train_val,
    svhn::SvhnFolderSource,
};
use crate::domain::{
    error::ConfigError,
    image::{Normalization, Split},
    options::DatasetKind,
    traits::ImageSource,
};

/// Resolve a dataset name into the source that reads it.
///
/// Fails with `ConfigError::UnknownDataset` for anything other
/// than `cifar10`, `cifar100` or `svhn`. Nothing is read from
/// disk here.
pub fn get_dataset(name: &str, data_dir: &Path) -> Result<Box<dyn ImageSource>, ConfigError> {
    let kind: DatasetKind = name.parse()?;
    Ok(source_for(kind, data_dir))
}

pub fn source_for(kind: DatasetKind, data_dir: &Path) -> Box<dyn ImageSource> {
    match kind {
        DatasetKind::Cifar10  => Box::new(CifarBinarySource::new(CifarVariant::Cifar10, data_dir)),
        DatasetKind::Cifar100 => Box::new(CifarBinarySource::new(CifarVariant::Cifar100, data_dir)),
        DatasetKind::Svhn     => Box::new(SvhnFolderSource::new(data_dir)),
    }
}

/// Train / validation / test datasets plus what the batcher
/// and the model need to know about them.
pub struct DataModule {
    pub name:        String,
    pub num_classes: usize,
    pub norm:        Normalization,
    pub train:       ImageDataset,
    pub val:         ImageDataset,
    pub test:        ImageDataset,
}

impl DataModule {
    pub fn setup(source: &dyn ImageSource, val_fraction: f64, seed: u64) -> Result<Self> {
        let train_items = source.load(Split::Train)?;
        let test_items  = source.load(Split::Test)?;

        let (train_items, val_items) = split_train_val(train_items, 1.0 - val_fraction, seed);
        tracing::info!(
            "{}: {} train, {} validation, {} test images",
            source.name(),
            train_items.len(),
            val_items.len(),
            test_items.len(),
        );

        let module = Self {
            name:        source.name().to_string(),
            num_classes: source.num_classes(),
            norm:        source.normalization(),
            train:       ImageDataset::new(train_items),
            val:         ImageDataset::new(val_items),
            test:        ImageDataset::new(test_items),
        };
        tracing::debug!(
            "{}: training images per class {:?}",
            module.name,
            module.train.class_histogram(module.num_classes),
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticSource;

    #[test]
    fn test_dispatch_known_names() {
        let dir = Path::new("data");
        assert_eq!(get_dataset("cifar10", dir).unwrap().num_classes(), 10);
        assert_eq!(get_dataset("cifar100", dir).unwrap().num_classes(), 100);
        assert_eq!(get_dataset("svhn", dir).unwrap().name(), "svhn");
    }

    #[test]
    fn test_dispatch_unknown_name_is_invalid_argument() {
        let err = get_dataset("imagenet", Path::new("data")).err().unwrap();
        assert_eq!(err, ConfigError::UnknownDataset("imagenet".into()));
        assert_eq!(
            err.to_string(),
            "dataset_name must be `cifar10`, `cifar100`, `svhn` (got `imagenet`)"
        );
    }

    #[test]
    fn test_setup_splits_training_data() {
        let source = SyntheticSource::new(10, 100, 20, 3);
        let dm     = DataModule::setup(&source, 0.1, 42).unwrap();

        assert_eq!(dm.num_classes, 10);
        assert_eq!(dm.train.sample_count(), 90);
        assert_eq!(dm.val.sample_count(), 10);
        assert_eq!(dm.test.sample_count(), 20);
    }
}
