// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// Per-step schedule: linear warmup, then cosine decay.
//
//   lr(t) = base * (t + 1) / W                              t < W
//   lr(t) = base * 0.5 * (1 + cos(pi * (t - W) / (T - W - 1)))   otherwise
//
// W = warmup steps, T = total steps. The first step after
// warmup runs at `base` and the final step (T - 1) at 0.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmupCosineSchedule {
    base_lr:      f64,
    warmup_steps: usize,
    total_steps:  usize,
}

impl WarmupCosineSchedule {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self {
            base_lr,
            warmup_steps: warmup_steps.min(total_steps),
            total_steps,
        }
    }

    /// Schedule expressed in epochs, as the CLI takes it.
    pub fn from_epochs(base_lr: f64, warmup_epochs: usize, epochs: usize, steps_per_epoch: usize) -> Self {
        Self::new(base_lr, warmup_epochs * steps_per_epoch, epochs * steps_per_epoch)
    }

    /// Learning rate for the 0-indexed optimizer step `step`.
    pub fn lr_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            return self.base_lr * (step + 1) as f64 / self.warmup_steps as f64;
        }

        // Intervals between the first and last decay step
        let span = self
            .total_steps
            .saturating_sub(self.warmup_steps)
            .saturating_sub(1);
        if span == 0 {
            return self.base_lr;
        }

        let progress = ((step - self.warmup_steps) as f64 / span as f64).min(1.0);
        self.base_lr * 0.5 * (1.0 + (PI * progress).cos())
    }
}
