// ============================================================
// Layer 5 — ConvMixer Model
// ============================================================
//
//   image [N, C, H, W]
//     │  patch embedding: Conv(kernel = stride = patch) → GELU → BN
//     ▼
//   [N, hidden, H/p, W/p]
//     │  × depth:
//     │    Residual( depthwise Conv(kernel, groups = hidden) → GELU → BN )
//     │    pointwise Conv(1x1) → GELU → BN
//     ▼
//   adaptive average pool (1x1) + flatten → [N, hidden]
//     │  classifier: Linear(hidden → num_classes)
//     ▼
//   logits [N, num_classes]
//
// Trockman & Kolter (2022), "Patches Are All You Need?"

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        BatchNorm, BatchNormConfig,
        Linear, LinearConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::gelu,
};

use crate::domain::error::ModelError;
use crate::ml::residual::residual;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct ConvMixerConfig {
    pub in_channels: usize,
    pub hidden_dim:  usize,
    pub depth:       usize,
    #[config(default = 5)]
    pub kernel_size: usize,
    #[config(default = 2)]
    pub patch_size:  usize,
    #[config(default = 10)]
    pub num_classes: usize,
}

impl ConvMixerConfig {
    /// Reject configurations whose stages cannot be chained.
    pub fn validate(&self) -> Result<(), ModelError> {
        let positive = [
            ("in_channels", self.in_channels),
            ("hidden_dim", self.hidden_dim),
            ("kernel_size", self.kernel_size),
            ("patch_size", self.patch_size),
            ("num_classes", self.num_classes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ModelError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        // Symmetric padding keeps the spatial size only for odd kernels
        if self.kernel_size % 2 == 0 {
            return Err(ModelError::InvalidConfig(format!(
                "kernel_size must be odd for 'same' padding (got {})",
                self.kernel_size
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ConvMixer<B>, ModelError> {
        self.validate()?;

        let hidden = self.hidden_dim;
        let pad    = (self.kernel_size - 1) / 2;

        let patch_embed = ConvBlock::new(
            Conv2dConfig::new([self.in_channels, hidden], [self.patch_size, self.patch_size])
                .with_stride([self.patch_size, self.patch_size]),
            hidden,
            device,
        );

        let layers = (0..self.depth)
            .map(|_| MixerLayer {
                depthwise: Residual {
                    block: ConvBlock::new(
                        Conv2dConfig::new([hidden, hidden], [self.kernel_size, self.kernel_size])
                            .with_groups(hidden)
                            .with_padding(PaddingConfig2d::Explicit(pad, pad)),
                        hidden,
                        device,
                    ),
                },
                pointwise: ConvBlock::new(Conv2dConfig::new([hidden, hidden], [1, 1]), hidden, device),
            })
            .collect();

        let features = MixerStack {
            patch_embed,
            layers,
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            in_channels: self.in_channels,
            hidden_dim:  hidden,
            patch_size:  self.patch_size,
        };

        Ok(ConvMixer {
            features,
            classifier:  LinearConfig::new(hidden, self.num_classes).init(device),
            num_classes: self.num_classes,
        })
    }
}

// ─── ConvBlock ────────────────────────────────────────────────────────────────
/// Conv → GELU → BatchNorm, the unit every stage is built from.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(conv: Conv2dConfig, channels: usize, device: &B::Device) -> Self {
        Self {
            conv: conv.init(device),
            norm: BatchNormConfig::new(channels).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(gelu(self.conv.forward(x)))
    }
}

// ─── Residual ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Residual<B: Backend> {
    pub block: ConvBlock<B>,
}

impl<B: Backend> Residual<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Result<Tensor<B, 4>, ModelError> {
        residual(x, |x| self.block.forward(x))
    }
}

// ─── MixerLayer ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct MixerLayer<B: Backend> {
    pub depthwise: Residual<B>,
    pub pointwise: ConvBlock<B>,
}

impl<B: Backend> MixerLayer<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Result<Tensor<B, 4>, ModelError> {
        let x = self.depthwise.forward(x)?;
        Ok(self.pointwise.forward(x))
    }
}

// ─── MixerStack ───────────────────────────────────────────────────────────────
/// Everything up to (and including) the pooled feature vector.
#[derive(Module, Debug)]
pub struct MixerStack<B: Backend> {
    pub patch_embed: ConvBlock<B>,
    pub layers:      Vec<MixerLayer<B>>,
    pub pool:        AdaptiveAvgPool2d,
    pub in_channels: usize,
    pub hidden_dim:  usize,
    pub patch_size:  usize,
}

impl<B: Backend> MixerStack<B> {
    /// [N, C, H, W] → [N, hidden_dim]
    pub fn forward(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 2>, ModelError> {
        let [batch, channels, height, width] = images.dims();
        if channels != self.in_channels {
            return Err(ModelError::DimensionMismatch {
                context:  "patch embedding input channels",
                expected: vec![batch, self.in_channels, height, width],
                actual:   vec![batch, channels, height, width],
            });
        }
        // At least one whole patch per side
        if height < self.patch_size || width < self.patch_size {
            return Err(ModelError::DimensionMismatch {
                context:  "patch embedding input size",
                expected: vec![batch, channels, self.patch_size, self.patch_size],
                actual:   vec![batch, channels, height, width],
            });
        }

        let mut x = self.patch_embed.forward(images);
        for layer in &self.layers {
            x = layer.forward(x)?;
        }
        let pooled = self.pool.forward(x); // [N, hidden, 1, 1]
        Ok(pooled.reshape([batch, self.hidden_dim]))
    }
}

// ─── ConvMixer ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ConvMixer<B: Backend> {
    pub features:    MixerStack<B>,
    pub classifier:  Linear<B>,
    pub num_classes: usize,
}

impl<B: Backend> ConvMixer<B> {
    /// images: [N, C, H, W] → logits: [N, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 2>, ModelError> {
        let features = self.features.forward(images)?;
        Ok(self.classifier.forward(features))
    }

    /// Logits plus the mean cross-entropy against `targets`.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> Result<(Tensor<B, 1>, Tensor<B, 2>), ModelError> {
        let logits = self.forward(images)?;
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        let loss   = ce.forward(logits.clone(), targets);
        Ok((loss, logits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn small_config() -> ConvMixerConfig {
        ConvMixerConfig::new(3, 16, 2)
            .with_kernel_size(3)
            .with_patch_size(4)
            .with_num_classes(10)
    }

    #[test]
    fn test_feature_width_independent_of_resolution() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = small_config().init(&device).unwrap();

        for side in [16usize, 32, 48] {
            let x = Tensor::<TestBackend, 4>::random(
                [2, 3, side, side],
                burn::tensor::Distribution::Default,
                &device,
            );
            let features = model.features.forward(x).unwrap();
            assert_eq!(features.dims(), [2, 16]);
        }
    }

    #[test]
    fn test_logits_shape() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = small_config().init(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::zeros([32, 3, 32, 32], &device);
        assert_eq!(model.forward(x).unwrap().dims(), [32, 10]);
    }

    #[test]
    fn test_depth_zero_is_patch_embedding_only() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = ConvMixerConfig::new(3, 8, 0).init(&device).unwrap();
        assert!(model.features.layers.is_empty());
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 8, 8], &device);
        assert_eq!(model.forward(x).unwrap().dims(), [1, 10]);
    }

    #[test]
    fn test_each_layer_has_its_own_depthwise_weights() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = small_config().init(&device).unwrap();
        let a = model.features.layers[0].depthwise.block.conv.weight.id;
        let b = model.features.layers[1].depthwise.block.conv.weight.id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_channel_count_is_dimension_mismatch() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = small_config().init(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::zeros([1, 1, 32, 32], &device);
        assert!(matches!(
            model.forward(x),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_image_smaller_than_patch_is_dimension_mismatch() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = small_config().with_patch_size(64).init(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        assert_eq!(
            model.forward(x).unwrap_err(),
            ModelError::DimensionMismatch {
                context:  "patch embedding input size",
                expected: vec![2, 3, 64, 64],
                actual:   vec![2, 3, 32, 32],
            }
        );
    }

    #[test]
    fn test_even_kernel_is_rejected() {
        let err = small_config().with_kernel_size(4).validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_hidden_dim_is_rejected() {
        let device = Default::default();
        let result: Result<ConvMixer<TestBackend>, _> =
            ConvMixerConfig::new(3, 0, 1).init(&device);
        assert!(result.is_err());
    }

    #[test]
    fn test_forward_loss_is_finite_scalar() {
        let device = Default::default();
        let model: ConvMixer<TestBackend> = small_config().init(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::zeros([4, 3, 16, 16], &device);
        let y = Tensor::<TestBackend, 1, Int>::from_data(
            burn::tensor::TensorData::new(vec![0i64, 1, 2, 3], [4]),
            &device,
        );
        let (loss, logits) = model.forward_loss(x, y).unwrap();
        assert_eq!(logits.dims(), [4, 10]);
        let value: f32 = loss.into_scalar().elem();
        assert!(value.is_finite());
    }
}
