// ============================================================
// Layer 5 — Training Callbacks
// ============================================================
// Hooks the epoch loop calls at fixed points:
//
//   on_train_step      after every optimizer step
//   on_validation_end  after every validation pass
//   on_fit_end         once, before the test phase
//
// A callback may ask the loop to stop by returning
// CallbackAction::Stop from on_validation_end. Every
// callback still runs for that epoch.

use anyhow::Result;
use burn::prelude::*;

use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::ConvMixer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    Stop,
}

/// State after one optimizer step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// 0-indexed global step that was just taken
    pub step: usize,
    /// Learning rate used for that step
    pub lr:   f64,
    pub loss: f64,
}

pub trait Callback<B: Backend> {
    fn name(&self) -> &str;

    fn on_train_step(&mut self, _ctx: &StepContext) -> Result<()> {
        Ok(())
    }

    fn on_validation_end(
        &mut self,
        _metrics: &EpochMetrics,
        _model:   &ConvMixer<B>,
    ) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    fn on_fit_end(&mut self) -> Result<()> {
        Ok(())
    }
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────
/// Stops training once `val_loss` has failed to improve on
/// `patience` consecutive validation checks.
///
/// An improvement is a value strictly below the best so far.
/// A NaN or infinite value stops training at once.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best:     f64,
    wait:     usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best: f64::INFINITY, wait: 0 }
    }

    /// Feed one monitored value; returns whether to stop.
    pub fn check(&mut self, value: f64) -> CallbackAction {
        if !value.is_finite() {
            tracing::warn!("val_loss = {value} is not finite, stopping");
            return CallbackAction::Stop;
        }

        if value < self.best {
            self.best = value;
            self.wait = 0;
            return CallbackAction::Continue;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            tracing::info!(
                "val_loss did not improve in the last {} checks, best = {:.4}",
                self.wait,
                self.best,
            );
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }
}

impl<B: Backend> Callback<B> for EarlyStopping {
    fn name(&self) -> &str {
        "EarlyStopping"
    }

    fn on_validation_end(&mut self, metrics: &EpochMetrics, _model: &ConvMixer<B>) -> Result<CallbackAction> {
        Ok(self.check(metrics.val_loss))
    }
}

// ─── LearningRateMonitor ──────────────────────────────────────────────────────
/// Records the learning rate of every optimizer step to `lr.csv`.
pub struct LearningRateMonitor {
    logger: MetricsLogger,
}

impl LearningRateMonitor {
    pub fn new(logger: MetricsLogger) -> Self {
        Self { logger }
    }
}

impl<B: Backend> Callback<B> for LearningRateMonitor {
    fn name(&self) -> &str {
        "LearningRateMonitor"
    }

    fn on_train_step(&mut self, ctx: &StepContext) -> Result<()> {
        self.logger.log_lr(ctx.step, ctx.lr)
    }
}

// ─── TrainLossLogger ──────────────────────────────────────────────────────────
/// Records the training loss of every optimizer step to `steps.csv`.
pub struct TrainLossLogger {
    logger: MetricsLogger,
}

impl TrainLossLogger {
    pub fn new(logger: MetricsLogger) -> Self {
        Self { logger }
    }
}

impl<B: Backend> Callback<B> for TrainLossLogger {
    fn name(&self) -> &str {
        "TrainLossLogger"
    }

    fn on_train_step(&mut self, ctx: &StepContext) -> Result<()> {
        self.logger.log_step(ctx.step, ctx.loss)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn run(stopper: &mut EarlyStopping, values: &[f64]) -> Option<usize> {
        values
            .iter()
            .position(|&v| stopper.check(v) == CallbackAction::Stop)
    }

    #[test]
    fn test_stops_after_exactly_patience_non_improving_checks() {
        let mut es = EarlyStopping::new(4);
        // one improvement, then flat
        let stop_at = run(&mut es, &[1.0, 1.0, 1.2, 1.0, 1.5, 0.1]);
        assert_eq!(stop_at, Some(4));
        assert_eq!(es.best, 1.0);
        assert_eq!(es.wait, 4);
    }

    #[test]
    fn test_improvement_resets_wait() {
        let mut es = EarlyStopping::new(2);
        let stop_at = run(&mut es, &[2.0, 2.5, 1.5, 1.6, 1.4, 1.4, 1.4]);
        assert_eq!(stop_at, Some(6));
    }

    #[test]
    fn test_nan_stops_immediately() {
        let mut es = EarlyStopping::new(10);
        assert_eq!(es.check(1.0), CallbackAction::Continue);
        assert_eq!(es.check(f64::NAN), CallbackAction::Stop);
    }

    #[test]
    fn test_infinite_first_value_stops() {
        let mut es = EarlyStopping::new(3);
        assert_eq!(es.check(f64::INFINITY), CallbackAction::Stop);
    }

    #[test]
    fn test_equal_value_is_not_an_improvement() {
        let mut es = EarlyStopping::new(1);
        assert_eq!(es.check(1.0), CallbackAction::Continue);
        assert_eq!(es.check(1.0), CallbackAction::Stop);
    }

    #[test]
    fn test_lr_monitor_writes_one_row_per_step() {
        use burn::backend::NdArray;

        let dir        = tempfile::tempdir().unwrap();
        let logger     = MetricsLogger::new(dir.path(), "cnn").unwrap();
        let mut mon    = LearningRateMonitor::new(logger.clone());
        for step in 0..3 {
            Callback::<NdArray<f32>>::on_train_step(
                &mut mon,
                &StepContext { step, lr: 1e-3, loss: 0.0 },
            )
            .unwrap();
        }

        let csv = std::fs::read_to_string(logger.dir().join("lr.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.lines().last().unwrap().starts_with("2,"));
    }

    #[test]
    fn test_train_loss_logger_writes_step_losses() {
        use burn::backend::NdArray;

        let dir     = tempfile::tempdir().unwrap();
        let logger  = MetricsLogger::new(dir.path(), "cnn").unwrap();
        let mut cb  = TrainLossLogger::new(logger.clone());
        for (step, loss) in [(0, 2.5), (1, 2.25)] {
            Callback::<NdArray<f32>>::on_train_step(&mut cb, &StepContext { step, lr: 1e-3, loss })
                .unwrap();
        }

        let csv = std::fs::read_to_string(logger.dir().join("steps.csv")).unwrap();
        assert_eq!(csv, "step,train_loss\n0,2.500000\n1,2.250000\n");
    }
}
