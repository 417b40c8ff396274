// ============================================================
// Layer 3 — Named Run Options
// ============================================================
// The small enumerated choices a run is configured with.
// Each one parses from the exact string accepted on the
// command line and fails with a ConfigError listing the
// valid values otherwise.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ─── DatasetKind ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Cifar10,
    Cifar100,
    Svhn,
}

impl DatasetKind {

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cifar10  => "cifar10",
            Self::Cifar100 => "cifar100",
            Self::Svhn     => "svhn",
        }
    }
}

impl FromStr for DatasetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cifar10"  => Ok(Self::Cifar10),
            "cifar100" => Ok(Self::Cifar100),
            "svhn"     => Ok(Self::Svhn),
            other      => Err(ConfigError::UnknownDataset(other.to_string())),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── ModelKind ────────────────────────────────────────────────────────────────
/// Only one architecture exists; `cnn` is the ConvMixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Cnn,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cnn => "cnn",
        }
    }
}

impl FromStr for ModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cnn" => Ok(Self::Cnn),
            other => Err(ConfigError::UnknownModel(other.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Precision ────────────────────────────────────────────────────────────────
/// Floating point width used for weights and activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    #[serde(rename = "16")]
    Half,
    #[serde(rename = "32")]
    Full,
}

impl Precision {
    pub fn bits(&self) -> u8 {
        match self {
            Self::Half => 16,
            Self::Full => 32,
        }
    }
}

impl FromStr for Precision {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16"  => Ok(Self::Half),
            "32"  => Ok(Self::Full),
            other => Err(ConfigError::UnknownPrecision(other.to_string())),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}
