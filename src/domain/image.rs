// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// A labelled image as it comes off disk, before any tensor
// conversion. Pixels are stored channel-major (CHW) as raw
// bytes: all red values, then all green, then all blue.
//
// This is also the native layout of the CIFAR binary files,
// so those records can be copied straight in.

use serde::{Deserialize, Serialize};

/// Number of colour channels every source produces.
pub const CHANNELS: usize = 3;

/// One labelled RGB image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
    /// CHW bytes, length = CHANNELS * height * width
    pub pixels: Vec<u8>,

    /// Class index in 0..num_classes
    pub label: usize,

    pub height: usize,
    pub width:  usize,
}

impl ImageItem {
    pub fn new(pixels: Vec<u8>, label: usize, height: usize, width: usize) -> Self {
        debug_assert_eq!(pixels.len(), CHANNELS * height * width);
        Self { pixels, label, height, width }
    }

    /// Pixels of a single channel (0 = R, 1 = G, 2 = B).
    pub fn channel(&self, c: usize) -> &[u8] {
        let plane = self.height * self.width;
        &self.pixels[c * plane..(c + 1) * plane]
    }
}

/// Which part of a dataset to read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

/// Per-channel mean and standard deviation, on the 0..1 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: [f32; CHANNELS],
    pub std:  [f32; CHANNELS],
}

impl Normalization {
    pub const CIFAR10: Self = Self {
        mean: [0.4914, 0.4822, 0.4465],
        std:  [0.2470, 0.2435, 0.2616],
    };

    pub const CIFAR100: Self = Self {
        mean: [0.5071, 0.4865, 0.4409],
        std:  [0.2673, 0.2564, 0.2762],
    };

    pub const SVHN: Self = Self {
        mean: [0.4377, 0.4438, 0.4728],
        std:  [0.1980, 0.2010, 0.1970],
    };

    /// Maps 0..255 onto roughly -1..1.
    pub const HALF: Self = Self {
        mean: [0.5; CHANNELS],
        std:  [0.5; CHANNELS],
    };

    /// Normalise one raw byte belonging to channel `c`.
    pub fn apply(&self, c: usize, value: u8) -> f32 {
        (value as f32 / 255.0 - self.mean[c]) / self.std[c]
    }
}
