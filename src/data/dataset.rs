// ============================================================
// Layer 4 — Image Dataset
// ============================================================
// In-memory labelled images behind Burn's Dataset trait, so
// the DataLoader can call .get(index) and .len() on them.

use burn::data::dataset::Dataset;

use crate::domain::image::ImageItem;

/// In-memory list of labelled images, served to Burn's DataLoader.
#[derive(Debug, Clone, Default)]
pub struct ImageDataset {
    items: Vec<ImageItem>,
}

impl ImageDataset {
    pub fn new(items: Vec<ImageItem>) -> Self { Self { items } }

    pub fn sample_count(&self) -> usize { self.items.len() }

    /// Number of items carrying each label, indexed by label.
    pub fn class_histogram(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for item in &self.items {
            if let Some(slot) = counts.get_mut(item.label) {
                *slot += 1;
            }
        }
        counts
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
