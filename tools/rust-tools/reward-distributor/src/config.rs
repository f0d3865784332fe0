//! TOML run configuration.
//!
//! Amounts are written in human units as strings, e.g. `total_supply = "114285714"` tokens
//! or `per_holder_cap = "750"` dollars, and converted to atomic units here. Percentages are
//! written in percent, so `"4"` is 4%.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reward_allocation::{
    Category, CombineMode, CombinePolicy, CommunityParams, DistributionParams,
    OverallocationPolicy, TestPolicy, ValidationPolicy,
};
use reward_core::fixed_point::{
    parse_units, SHARE_PRICE_DECIMALS, TOKEN_DECIMALS, USDC_DECIMALS,
};
use reward_core::{Address, Percent, VestingSchedule};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub production: bool,
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub policies: PoliciesConfig,
    pub validation: ValidationConfig,
    #[serde(default)]
    pub combine: CombineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocationConfig {
    pub categories: Vec<Category>,
    /// Tokens.
    pub total_supply: String,
    /// Unix seconds.
    pub distribution_timestamp: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoliciesConfig {
    pub community: Option<CommunityConfig>,
    #[serde(default)]
    pub test: TestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommunityConfig {
    /// Percent of total supply.
    pub allocation_percent: String,
    /// Dollars.
    pub per_holder_cap: String,
    /// Dollars.
    pub reference_valuation: String,
    /// Dollars.
    pub vesting_threshold: String,
    /// Percent.
    pub early_investor_min_excess: Option<String>,
    /// Dollars per share.
    pub share_price: String,
    #[serde(default)]
    pub exclude: Vec<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Tokens.
    pub immediate_amount: Option<String>,
    /// Tokens.
    pub vesting_amount: Option<String>,
    pub vesting_length: Option<u64>,
    pub vesting_interval: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallocationConfig {
    DebitTreasury,
    Accept,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Tokens.
    pub expected_total: String,
    /// Tokens.
    pub tolerance: String,
    pub overallocation: OverallocationConfig,
    pub treasury: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombineConfig {
    #[serde(default)]
    pub immediate: CombineMode,
    #[serde(default)]
    pub vesting: CombineMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub records_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub debug_ledger: bool,
}

fn tokens(field: &str, value: &str) -> Result<u128> {
    parse_units(value, TOKEN_DECIMALS).with_context(|| format!("invalid token amount {field}"))
}

fn dollars(field: &str, value: &str) -> Result<u128> {
    parse_units(value, USDC_DECIMALS).with_context(|| format!("invalid dollar amount {field}"))
}

fn percent(field: &str, value: &str) -> Result<Percent> {
    Percent::from_percent_str(value).with_context(|| format!("invalid percentage {field}"))
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<RunConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn to_params(&self, production: bool) -> Result<DistributionParams> {
        let categories: BTreeSet<Category> = self.allocation.categories.iter().copied().collect();
        let needs_community = categories.contains(&Category::CommunityLp)
            || categories.contains(&Category::EarlyLp);
        let community = match &self.policies.community {
            Some(community) => community.to_params(
                tokens("allocation.total_supply", &self.allocation.total_supply)?,
                self.allocation.distribution_timestamp,
            )?,
            None if needs_community => {
                bail!("[policies.community] is required for the community_lp and early_lp categories")
            }
            None => CommunityParams {
                allocation_percent: Percent::ZERO,
                per_holder_cap: 0,
                reference_valuation: 0,
                vesting_threshold: 0,
                early_investor_min_excess: CommunityParams::DEFAULT_EARLY_INVESTOR_MIN_EXCESS,
                share_price: 0,
                total_supply: 0,
                distribution_timestamp: self.allocation.distribution_timestamp,
                exclude: BTreeSet::new(),
            },
        };
        let overallocation = match (self.validation.overallocation, self.validation.treasury) {
            (OverallocationConfig::Accept, _) => OverallocationPolicy::Accept,
            (OverallocationConfig::DebitTreasury, Some(account)) => {
                OverallocationPolicy::DebitTreasury { account }
            }
            (OverallocationConfig::DebitTreasury, None) => {
                bail!("validation.treasury is required when overallocation = \"debit_treasury\"")
            }
        };
        Ok(DistributionParams {
            categories,
            production: production || self.production,
            community,
            test: self.policies.test.to_policy()?,
            combine: CombinePolicy {
                immediate: self.combine.immediate,
                vesting: self.combine.vesting,
            },
            validation: ValidationPolicy {
                expected_total: tokens("validation.expected_total", &self.validation.expected_total)?,
                tolerance: tokens("validation.tolerance", &self.validation.tolerance)?,
                overallocation,
            },
        })
    }
}

impl CommunityConfig {
    fn to_params(&self, total_supply: u128, distribution_timestamp: u64) -> Result<CommunityParams> {
        Ok(CommunityParams {
            allocation_percent: percent("allocation_percent", &self.allocation_percent)?,
            per_holder_cap: dollars("per_holder_cap", &self.per_holder_cap)?,
            reference_valuation: dollars("reference_valuation", &self.reference_valuation)?,
            vesting_threshold: dollars("vesting_threshold", &self.vesting_threshold)?,
            early_investor_min_excess: match &self.early_investor_min_excess {
                Some(value) => percent("early_investor_min_excess", value)?,
                None => CommunityParams::DEFAULT_EARLY_INVESTOR_MIN_EXCESS,
            },
            share_price: parse_units(&self.share_price, SHARE_PRICE_DECIMALS)
                .context("invalid share_price")?,
            total_supply,
            distribution_timestamp,
            exclude: self.exclude.iter().copied().collect(),
        })
    }
}

impl TestConfig {
    fn to_policy(&self) -> Result<TestPolicy> {
        let defaults = TestPolicy::default();
        let vesting_length = self
            .vesting_length
            .unwrap_or(defaults.vesting.vesting_length);
        let vesting_interval = self
            .vesting_interval
            .unwrap_or(defaults.vesting.vesting_interval);
        Ok(TestPolicy {
            immediate_amount: match &self.immediate_amount {
                Some(value) => tokens("policies.test.immediate_amount", value)?,
                None => defaults.immediate_amount,
            },
            vesting_amount: match &self.vesting_amount {
                Some(value) => tokens("policies.test.vesting_amount", value)?,
                None => defaults.vesting_amount,
            },
            vesting: VestingSchedule::new(vesting_length, 0, vesting_interval)
                .context("invalid test vesting schedule")?,
        })
    }
}
