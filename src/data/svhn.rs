// ============================================================
// Layer 4 — SVHN Image-Folder Loader
// ============================================================
// SVHN "cropped digits" exported as one PNG per sample:
//
//   <data_dir>/svhn/train/0/*.png … <data_dir>/svhn/train/9/*.png
//   <data_dir>/svhn/test/0/*.png  … <data_dir>/svhn/test/9/*.png
//
// The directory name is the label. Images must be 32x32;
// they are converted to RGB and transposed to CHW.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::{
    image::{ImageItem, Normalization, Split, CHANNELS},
    traits::ImageSource,
};

const SVHN_SIDE: usize    = 32;
const SVHN_CLASSES: usize = 10;

pub struct SvhnFolderSource {
    root: PathBuf,
}

impl SvhnFolderSource {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { root: data_dir.as_ref().join("svhn") }
    }
}

impl ImageSource for SvhnFolderSource {
    fn name(&self) -> &str {
        "svhn"
    }

    fn num_classes(&self) -> usize {
        SVHN_CLASSES
    }

    fn normalization(&self) -> Normalization {
        Normalization::SVHN
    }

    fn load(&self, split: Split) -> Result<Vec<ImageItem>> {
        let split_dir = self.root.join(match split {
            Split::Train => "train",
            Split::Test  => "test",
        });
        if !split_dir.is_dir() {
            bail!("SVHN split directory '{}' does not exist", split_dir.display());
        }

        let mut items = Vec::new();
        for label in 0..SVHN_CLASSES {
            let class_dir = split_dir.join(label.to_string());
            if !class_dir.is_dir() {
                tracing::warn!("No directory for digit {} under '{}'", label, split_dir.display());
                continue;
            }

            // Sorted so item order does not depend on the filesystem
            let mut paths: Vec<PathBuf> = fs::read_dir(&class_dir)
                .with_context(|| format!("Cannot read directory '{}'", class_dir.display()))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
                .collect();
            paths.sort();

            for path in paths {
                items.push(load_png(&path, label)?);
            }
        }

        tracing::info!("Loaded {} SVHN images from '{}'", items.len(), split_dir.display());
        Ok(items)
    }
}

fn load_png(path: &Path, label: usize) -> Result<ImageItem> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode '{}'", path.display()))?
        .into_rgb8();

    let (w, h) = (img.width() as usize, img.height() as usize);
    if (w, h) != (SVHN_SIDE, SVHN_SIDE) {
        bail!("'{}' is {}x{}, expected {}x{}", path.display(), w, h, SVHN_SIDE, SVHN_SIDE);
    }

    // HWC interleaved → CHW planar
    let plane = w * h;
    let mut pixels = vec![0u8; CHANNELS * plane];
    for (i, px) in img.pixels().enumerate() {
        for c in 0..CHANNELS {
            pixels[c * plane + i] = px.0[c];
        }
    }

    Ok(ImageItem::new(pixels, label, h, w))
}
