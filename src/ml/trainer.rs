// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fit + test loop using Burn's DataLoader and Adam.
//
//   for epoch in 0..epochs:
//     for batch in train:   forward → loss → backward → Adam(lr(step))
//                           → on_train_step callbacks
//     validate              → metrics.csv row, summary line
//                           → on_validation_end callbacks (may Stop)
//   test                    → test.csv
//
// Training runs on an Autodiff backend B. Validation and test
// use model.valid(), which lives on B::InnerBackend, so their
// batchers are built for the inner backend as well.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    datamodule::DataModule,
    dataset::ImageDataset,
};
use crate::domain::{image::CHANNELS, options::Precision};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger, TestMetrics},
};
use crate::ml::{
    backend::{backend_name, FullBackend},
    callbacks::{
        Callback, CallbackAction, EarlyStopping, LearningRateMonitor, StepContext, TrainLossLogger,
    },
    checkpointing::ModelCheckpoint,
    model::{ConvMixer, ConvMixerConfig},
    schedule::WarmupCosineSchedule,
};

/// What a finished run hands back.
pub struct FitOutcome<B: AutodiffBackend> {
    /// Weights after the last epoch that ran
    pub model:      ConvMixer<B>,
    pub epochs_run: usize,
    pub test:       TestMetrics,
}

/// Mean loss and accuracy over one pass of a data loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
}

/// Pick the backend for `cfg.fp` and run fit + test.
pub fn run_training(cfg: &TrainConfig, data: DataModule, logger: MetricsLogger) -> Result<TestMetrics> {
    match cfg.fp {
        Precision::Full => {
            tracing::info!("Training in 32-bit precision on {}", backend_name());
            Ok(fit::<FullBackend>(cfg, data, logger, Default::default())?.test)
        }
        #[cfg(feature = "wgpu")]
        Precision::Half => {
            tracing::info!("Training in 16-bit precision on {}", backend_name());
            Ok(fit::<crate::ml::backend::HalfBackend>(cfg, data, logger, Default::default())?.test)
        }
        #[cfg(not(feature = "wgpu"))]
        Precision::Half => {
            tracing::warn!(
                "16-bit precision needs the `wgpu` feature; training in 32-bit on {}",
                backend_name()
            );
            Ok(fit::<FullBackend>(cfg, data, logger, Default::default())?.test)
        }
    }
}

pub fn fit<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    data:   DataModule,
    logger: MetricsLogger,
    device: B::Device,
) -> Result<FitOutcome<B>> {
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = ConvMixerConfig::new(CHANNELS, cfg.hidden_dim, cfg.depth)
        .with_kernel_size(cfg.kernel_size)
        .with_patch_size(cfg.patch_size)
        .with_num_classes(data.num_classes);
    let mut model: ConvMixer<B> = model_cfg.init(&device)?;
    tracing::info!(
        "ConvMixer-{}/{} (kernel {}, patch {}) for {} classes: {} parameters",
        cfg.hidden_dim,
        cfg.depth,
        cfg.kernel_size,
        cfg.patch_size,
        data.num_classes,
        model.num_params(),
    );

    // ── Adam + warmup/cosine schedule ─────────────────────────────────────────
    let mut optim = AdamConfig::new().init();

    let steps_per_epoch = data.train.sample_count().div_ceil(cfg.batch_size);
    let schedule = WarmupCosineSchedule::from_epochs(cfg.lr, cfg.warmup_epochs, cfg.epochs, steps_per_epoch);

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = build_loader(
        ImageBatcher::<B>::new(device.clone(), data.norm),
        data.train,
        cfg.batch_size,
        cfg.num_workers,
        Some(cfg.seed),
    );
    let val_loader = build_loader(
        ImageBatcher::<B::InnerBackend>::new(device.clone(), data.norm),
        data.val,
        cfg.batch_size,
        cfg.num_workers,
        None,
    );
    let test_loader = build_loader(
        ImageBatcher::<B::InnerBackend>::new(device.clone(), data.norm),
        data.test,
        cfg.batch_size,
        cfg.num_workers,
        None,
    );

    // ── Callbacks ─────────────────────────────────────────────────────────────
    let mut callbacks: Vec<Box<dyn Callback<B>>> = vec![
        Box::new(ModelCheckpoint::new(CheckpointManager::new(&cfg.dirpath)?, cfg.save_top_k)),
        Box::new(EarlyStopping::new(cfg.patience)),
        Box::new(LearningRateMonitor::new(logger.clone())),
        Box::new(TrainLossLogger::new(logger.clone())),
    ];

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut step       = 0usize;
    let mut epochs_run = 0usize;

    for epoch in 0..cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let lr         = schedule.lr_at(step);
            let batch_size = batch.targets.dims()[0];

            let (loss, _) = model.forward_loss(batch.images, batch.targets)?;
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val * batch_size as f64;
            seen     += batch_size;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);

            let ctx = StepContext { step, lr, loss: loss_val };
            for cb in callbacks.iter_mut() {
                cb.on_train_step(&ctx)?;
            }
            step += 1;
        }
        epochs_run = epoch + 1;

        let train_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
        let val        = evaluate(&model.valid(), val_loader.as_ref())?;

        let metrics = EpochMetrics {
            epoch,
            step,
            train_loss,
            val_loss: val.loss,
            val_acc:  val.accuracy,
        };
        logger.log_epoch(&metrics)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}% | lr={:.2e}",
            epoch,
            cfg.epochs,
            train_loss,
            val.loss,
            val.accuracy * 100.0,
            schedule.lr_at(step.saturating_sub(1)),
        );

        // Every callback sees the epoch, even once one has asked to stop
        let mut stop = false;
        for cb in callbacks.iter_mut() {
            if cb.on_validation_end(&metrics, &model)? == CallbackAction::Stop {
                tracing::info!("{} requested stop after epoch {}", cb.name(), epoch);
                stop = true;
            }
        }
        if stop {
            break;
        }
    }

    for cb in callbacks.iter_mut() {
        cb.on_fit_end()?;
    }

    // ── Test phase (final in-memory weights) ──────────────────────────────────
    let result = evaluate(&model.valid(), test_loader.as_ref())?;
    let test   = TestMetrics { test_loss: result.loss, test_acc: result.accuracy };
    logger.log_test(&test)?;

    println!(
        "Test | test_loss={:.4} | test_acc={:.1}%",
        test.test_loss,
        test.test_acc * 100.0,
    );
    tracing::info!("Training complete after {} epochs", epochs_run);

    Ok(FitOutcome { model, epochs_run, test })
}

/// Mean cross-entropy (weighted by batch size) and accuracy.
/// An empty loader yields a NaN loss.
pub fn evaluate<B: Backend>(
    model:  &ConvMixer<B>,
    loader: &dyn DataLoader<ImageBatch<B>>,
) -> Result<Evaluation> {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let batch_size = batch.targets.dims()[0];
        let (loss, logits) = model.forward_loss(batch.images, batch.targets.clone())?;
        loss_sum += loss.into_scalar().elem::<f64>() * batch_size as f64;

        // argmax(1) returns shape [batch, 1]; flatten to [batch]
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        correct += hits as usize;
        total   += batch_size;
    }

    if total == 0 {
        return Ok(Evaluation { loss: f64::NAN, accuracy: 0.0 });
    }
    Ok(Evaluation {
        loss:     loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
    })
}

fn build_loader<B: Backend>(
    batcher:     ImageBatcher<B>,
    dataset:     ImageDataset,
    batch_size:  usize,
    num_workers: usize,
    shuffle:     Option<u64>,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    let mut builder = DataLoaderBuilder::new(batcher).batch_size(batch_size);
    if let Some(seed) = shuffle {
        builder = builder.shuffle(seed);
    }
    if num_workers > 0 {
        builder = builder.num_workers(num_workers);
    }
    builder.build(dataset)
}
