//! Execution modes and the per-mode stage policy

use crate::stages::StageId;
use std::fmt;

/// Why the pipeline is being run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecMode {
    /// First mempool admission check
    CheckOnly,
    /// Mempool re-validation after a block commits
    ReCheck,
    /// Gas estimation; nothing is committed
    Simulate,
    /// Block execution; state is committed on success
    Deliver,
}

impl ExecMode {
    /// All modes
    pub const ALL: [ExecMode; 4] = [
        ExecMode::CheckOnly,
        ExecMode::ReCheck,
        ExecMode::Simulate,
        ExecMode::Deliver,
    ];

    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecMode::CheckOnly => "check",
            ExecMode::ReCheck => "recheck",
            ExecMode::Simulate => "simulate",
            ExecMode::Deliver => "deliver",
        }
    }

    /// Whether state from this mode is committed
    pub fn commits(&self) -> bool {
        matches!(self, ExecMode::Deliver)
    }

    /// Stage policy for this mode
    pub fn policy(&self) -> &'static ModePolicy {
        match self {
            ExecMode::CheckOnly => &CHECK_POLICY,
            ExecMode::ReCheck => &RECHECK_POLICY,
            ExecMode::Simulate => &SIMULATE_POLICY,
            ExecMode::Deliver => &DELIVER_POLICY,
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages a mode skips entirely, and stages that run their relaxed variant
#[derive(Debug, PartialEq, Eq)]
pub struct ModePolicy {
    /// Not run at all
    pub skip: &'static [StageId],
    /// Run with [`Context::is_relaxed`](crate::Context::is_relaxed) set
    pub relaxed: &'static [StageId],
}

impl ModePolicy {
    /// Check if `stage` is skipped
    pub fn skips(&self, stage: StageId) -> bool {
        self.skip.contains(&stage)
    }

    /// Check if `stage` runs relaxed
    pub fn relaxes(&self, stage: StageId) -> bool {
        self.relaxed.contains(&stage)
    }
}

static CHECK_POLICY: ModePolicy = ModePolicy {
    skip: &[],
    relaxed: &[],
};

static RECHECK_POLICY: ModePolicy = ModePolicy {
    skip: &[],
    relaxed: &[StageId::SignatureVerifier],
};

static SIMULATE_POLICY: ModePolicy = ModePolicy {
    skip: &[StageId::MinGasPriceValidator],
    relaxed: &[
        StageId::ContextInitializer,
        StageId::TxSizeGasConsumer,
        StageId::FeeDeductor,
        StageId::PubKeySetter,
        StageId::SignatureGasConsumer,
        StageId::SignatureVerifier,
    ],
};

static DELIVER_POLICY: ModePolicy = ModePolicy {
    skip: &[StageId::RedundantRelayFilter],
    relaxed: &[StageId::FeeDeductor],
};
