// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands the resulting
// TrainConfig to Layer 2. Nothing here computes.
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::TrainArgs;

use crate::application::train_use_case::TrainUseCase;

#[derive(Parser, Debug)]
#[command(
    name = "convmixer-train",
    version,
    about = "Train a ConvMixer image classifier on CIFAR10, CIFAR100 or SVHN."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: TrainArgs,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        tracing::info!(
            "Starting run: dataset={} model={} fp={} epochs={}",
            self.args.dataset,
            self.args.model,
            self.args.fp,
            self.args.epochs,
        );

        let use_case = TrainUseCase::new(self.args.into());
        let test     = use_case.execute()?;

        println!(
            "Run complete. test_loss={:.4} test_acc={:.1}%",
            test.test_loss,
            test.test_acc * 100.0,
        );
        Ok(())
    }
}
