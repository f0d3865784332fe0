use std::collections::BTreeSet;

use reward_core::fixed_point::{pow10, PERCENT_UNIT, TOKEN_DECIMALS};
use reward_core::{Address, Percent, VestingSchedule, ONE_DAY, ONE_HOUR};
use serde::{Deserialize, Serialize};

use crate::{Category, DistributionError, SourceKind};

/// Inputs of the community / LP eligibility engine. Dollar amounts are USDC atomic units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityParams {
    /// Share of total supply reserved for the category.
    pub allocation_percent: Percent,
    /// Per-holder dollar cap separating the capped and uncapped pools.
    pub per_holder_cap: u128,
    /// Valuation used to price the capped pool.
    pub reference_valuation: u128,
    /// Holders qualifying above this dollar value get their uncapped tokens vested.
    pub vesting_threshold: u128,
    /// Early investors keep their residual only when it exceeds this share of their value.
    pub early_investor_min_excess: Percent,
    /// Dollars per share, 18 decimals.
    pub share_price: u128,
    /// Token atomic units.
    pub total_supply: u128,
    pub distribution_timestamp: u64,
    pub exclude: BTreeSet<Address>,
}

impl CommunityParams {
    pub const DEFAULT_EARLY_INVESTOR_MIN_EXCESS: Percent = Percent(PERCENT_UNIT / 25);

    pub fn validate(&self) -> Result<(), DistributionError> {
        let invalid = |message: &str| Err(DistributionError::Configuration(message.to_string()));
        if self.allocation_percent == Percent::ZERO || self.allocation_percent.0 > PERCENT_UNIT {
            return invalid("allocation percent must be in (0%, 100%]");
        }
        if self.early_investor_min_excess.0 > PERCENT_UNIT {
            return invalid("early investor minimum excess must be at most 100%");
        }
        if self.reference_valuation == 0 {
            return invalid("reference valuation must be positive");
        }
        if self.share_price == 0 {
            return invalid("share price must be positive");
        }
        if self.total_supply == 0 {
            return invalid("total supply must be positive");
        }
        Ok(())
    }
}

/// Grants handed to every test address in non-production runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPolicy {
    pub immediate_amount: u128,
    pub vesting_amount: u128,
    pub vesting: VestingSchedule,
}

impl Default for TestPolicy {
    fn default() -> Self {
        let one_token = pow10(TOKEN_DECIMALS).unwrap_or(1);
        Self {
            immediate_amount: one_token,
            vesting_amount: one_token,
            vesting: VestingSchedule {
                vesting_length: ONE_DAY,
                cliff_length: 0,
                vesting_interval: ONE_HOUR,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// One group per account and reason.
    #[default]
    ByReason,
    /// Community LP, flight academy and test grants share one bucket per account.
    Combined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombinePolicy {
    pub immediate: CombineMode,
    pub vesting: CombineMode,
}

/// What to do when the grants exceed the expected total by no more than the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallocationPolicy {
    /// Take the excess out of the treasury account's grant.
    DebitTreasury { account: Address },
    /// Leave every grant untouched.
    Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Token atomic units the batch is expected to distribute.
    pub expected_total: u128,
    pub tolerance: u128,
    pub overallocation: OverallocationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionParams {
    pub categories: BTreeSet<Category>,
    pub production: bool,
    pub community: CommunityParams,
    pub test: TestPolicy,
    pub combine: CombinePolicy,
    pub validation: ValidationPolicy,
}

impl DistributionParams {
    pub fn validate(&self) -> Result<(), DistributionError> {
        if self.categories.is_empty() {
            return Err(DistributionError::Configuration(
                "no categories enabled".to_string(),
            ));
        }
        if self.production && self.categories.contains(&Category::Test) {
            return Err(DistributionError::Configuration(
                "test grants cannot be enabled in a production run".to_string(),
            ));
        }
        if self.categories.contains(&Category::CommunityLp)
            || self.categories.contains(&Category::EarlyLp)
        {
            self.community.validate()?;
        }
        if self.categories.contains(&Category::Test) {
            self.test.vesting.validate().map_err(|err| {
                DistributionError::Configuration(format!("test vesting schedule: {err}"))
            })?;
        }
        Ok(())
    }

    pub fn required_sources(&self) -> BTreeSet<SourceKind> {
        self.categories
            .iter()
            .flat_map(|category| category.required_sources().iter().copied())
            .collect()
    }
}
