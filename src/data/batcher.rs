// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ImageItem>
// into one normalised image tensor plus a label tensor.
//
//   Input:  N items, each CHW bytes of shape [3, H, W]
//   Output: images  [N, 3, H, W] float
//           targets [N]          int
//
// Every channel is normalised as (x / 255 - mean_c) / std_c
// on the CPU while flattening, so the tensor is created once.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::domain::image::{ImageItem, Normalization, CHANNELS};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised pixels, shape: [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,

    /// Class indices, shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
    pub norm:   Normalization,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, norm: Normalization) -> Self {
        Self { device, norm }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        // All items in a dataset share one resolution
        let (height, width) = items
            .first()
            .map(|i| (i.height, i.width))
            .unwrap_or((0, 0));
        let plane = height * width;

        let mut pixels: Vec<f32> = Vec::with_capacity(batch_size * CHANNELS * plane);
        for item in &items {
            for c in 0..CHANNELS {
                pixels.extend(item.channel(c).iter().map(|&v| self.norm.apply(c, v)));
            }
        }

        let targets: Vec<i64> = items.iter().map(|i| i.label as i64).collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, CHANNELS, height, width]),
            &self.device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets, [batch_size]),
            &self.device,
        );

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes_and_normalisation() {
        let device  = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device, Normalization::HALF);

        // Two 2x2 images: first all black, second all white
        let items = vec![
            ImageItem::new(vec![0u8; 12], 4, 2, 2),
            ImageItem::new(vec![255u8; 12], 1, 2, 2),
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);
        assert_eq!(batch.targets.dims(), [2]);

        let px: Vec<f32> = batch.images.into_data().to_vec::<f32>().unwrap();
        assert!((px[0] + 1.0).abs() < 1e-5);
        assert!((px[23] - 1.0).abs() < 1e-5);

        let labels: Vec<i64> = batch
            .targets
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(labels, vec![4, 1]);
    }

    #[test]
    fn test_channels_keep_their_own_statistics() {
        let device = Default::default();
        let norm   = Normalization { mean: [0.0, 0.5, 1.0], std: [1.0, 1.0, 1.0] };
        let batcher = ImageBatcher::<TestBackend>::new(device, norm);

        let batch = batcher.batch(vec![ImageItem::new(vec![255u8; 3], 0, 1, 1)]);
        let px: Vec<f32> = batch.images.into_data().to_vec::<f32>().unwrap();
        assert!((px[0] - 1.0).abs() < 1e-5);
        assert!((px[1] - 0.5).abs() < 1e-5);
        assert!(px[2].abs() < 1e-5);
    }
}
