use reward_core::{Address, ArithmeticError, GrantError, Reason};
use thiserror::Error;

use crate::{Category, SourceKind};

/// Fatal failures of a distribution batch. Any of these means no commitment is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributionError {
    #[error("missing required record source {0}")]
    MissingSource(SourceKind),

    #[error("record source {kind} failed: {message}")]
    Source { kind: SourceKind, message: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(
        "capped pool needs {capped_percent} of supply but category {category} is only allocated {allocation_percent}"
    )]
    Allocation {
        category: Category,
        capped_percent: String,
        allocation_percent: String,
    },

    #[error("inconsistent vesting parameters for account {account} in {bucket} grants")]
    InconsistentVesting { account: Address, bucket: Reason },

    #[error("inconsistent vesting parameters for account {account} in {kind} records")]
    InconsistentRecordVesting { account: Address, kind: SourceKind },

    #[error("over-allocation: granted {total}, expected {expected} (tolerance {tolerance}){detail}")]
    Overallocation {
        total: u128,
        expected: u128,
        tolerance: u128,
        detail: String,
    },

    #[error("under-allocation: granted {total}, expected {expected} (tolerance {tolerance})")]
    Underallocation {
        total: u128,
        expected: u128,
        tolerance: u128,
    },

    #[error("invalid grant for account {account} ({reason}): {source}")]
    InvalidGrant {
        account: Address,
        reason: Reason,
        source: GrantError,
    },

    #[error("arithmetic failure in {stage}: {source}")]
    Arithmetic {
        stage: String,
        source: ArithmeticError,
    },
}

impl DistributionError {
    pub(crate) fn arithmetic(stage: impl ToString) -> impl FnOnce(ArithmeticError) -> Self {
        let stage = stage.to_string();
        move |source| DistributionError::Arithmetic { stage, source }
    }
}
