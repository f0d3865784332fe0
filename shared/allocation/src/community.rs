//! Community / LP allocation: turns holder snapshots into capped and uncapped grants.
//!
//! Each holder's dollar value is split at the per-holder cap. The capped pool is priced
//! against the reference valuation, the uncapped pool receives whatever remains of the
//! category's share of supply, and each holder is paid pro rata from both pools.

use reward_core::fixed_point::{
    add, mul_div, mul_div_or_zero, pow10, ratio_exceeds, sub_floor_zero, SHARE_DECIMALS,
    SHARE_PRICE_DECIMALS, USDC_DECIMALS,
};
use reward_core::{
    floor_to_interval, ArithmeticResult, Grant, Percent, Reason, VestingSchedule, ONE_MONTH,
    ONE_YEAR,
};
use tracing::{debug, info};

use crate::{
    Category, CategoryGrants, CommunityParams, DistributionError, EarlyInvestorRecord,
    HolderSnapshot,
};

/// Converts a raw share balance to USDC atomic units at `share_price`.
pub fn dollar_value(raw_balance: u128, share_price: u128) -> ArithmeticResult<u128> {
    let scale = pow10(SHARE_DECIMALS + SHARE_PRICE_DECIMALS - USDC_DECIMALS)?;
    mul_div(raw_balance, share_price, scale, "dollar value")
}

/// A holder's qualifying dollar value, split at the per-holder cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualifyingAmount {
    pub capped_value: u128,
    pub uncapped_value: u128,
}

impl QualifyingAmount {
    pub fn split(value: u128, cap: u128) -> Self {
        let capped_value = value.min(cap);
        Self {
            capped_value,
            uncapped_value: value - capped_value,
        }
    }

    pub fn total(&self) -> u128 {
        self.capped_value + self.uncapped_value
    }
}

/// One holder's pass through the engine, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderAllocation {
    pub holder: HolderSnapshot,
    /// Snapshot value before any early-investor adjustment.
    pub dollar_value: u128,
    pub qualifying: QualifyingAmount,
    pub capped_grant: u128,
    pub uncapped_grant: u128,
    /// Schedule of the uncapped grant; immediate when the holder is under the threshold.
    pub uncapped_vesting: VestingSchedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolTotals {
    pub total_capped: u128,
    pub total_uncapped: u128,
    pub pct_for_capped: Percent,
    pub pct_for_uncapped: Percent,
    pub gfi_for_capped: u128,
    pub gfi_for_uncapped: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityAllocation {
    pub grants: CategoryGrants,
    pub holders: Vec<HolderAllocation>,
    pub totals: PoolTotals,
}

/// Running state of the first pass over holders.
#[derive(Debug, Default)]
struct PoolAccumulator {
    qualifying: Vec<(HolderSnapshot, u128, QualifyingAmount)>,
    total_capped: u128,
    total_uncapped: u128,
}

impl PoolAccumulator {
    fn push(
        mut self,
        holder: HolderSnapshot,
        dollar_value: u128,
        qualifying: QualifyingAmount,
    ) -> Result<Self, DistributionError> {
        let arithmetic = || DistributionError::arithmetic(Category::CommunityLp);
        self.total_capped = add(self.total_capped, qualifying.capped_value, "capped total")
            .map_err(arithmetic())?;
        self.total_uncapped = add(
            self.total_uncapped,
            qualifying.uncapped_value,
            "uncapped total",
        )
        .map_err(arithmetic())?;
        self.qualifying.push((holder, dollar_value, qualifying));
        Ok(self)
    }
}

/// Dollar value that still qualifies once an early investor's original stake is removed.
/// `None` means the holder is left out of the category entirely.
fn qualifying_value(
    params: &CommunityParams,
    holder: &HolderSnapshot,
    dollar_value: u128,
    early_investors: &[EarlyInvestorRecord],
) -> Option<u128> {
    let Some(record) = early_investors
        .iter()
        .find(|record| record.matches(&holder.address))
    else {
        return Some(dollar_value);
    };
    if record.use_custody_exclusion {
        debug!(address = %holder.address, "Holder is custody excluded from community allocation");
        return None;
    }
    let residual = sub_floor_zero(dollar_value, record.usdc_investment);
    if ratio_exceeds(residual, dollar_value, params.early_investor_min_excess) {
        Some(residual)
    } else {
        debug!(
            address = %holder.address,
            residual,
            dollar_value,
            "Early investor excess too small, not qualifying"
        );
        Some(0)
    }
}

/// Schedule for an uncapped grant: a year from first receipt, in whole months still ahead.
fn uncapped_schedule(distribution_timestamp: u64, first_receive_timestamp: u64) -> VestingSchedule {
    let elapsed = distribution_timestamp.saturating_sub(first_receive_timestamp);
    let remaining = floor_to_interval(ONE_YEAR.saturating_sub(elapsed), ONE_MONTH);
    if remaining == 0 {
        VestingSchedule::IMMEDIATE
    } else {
        VestingSchedule {
            vesting_length: remaining,
            cliff_length: 0,
            vesting_interval: ONE_MONTH,
        }
    }
}

fn pool_totals(
    params: &CommunityParams,
    total_capped: u128,
    total_uncapped: u128,
) -> Result<PoolTotals, DistributionError> {
    let arithmetic = || DistributionError::arithmetic(Category::CommunityLp);
    let pct_for_capped =
        Percent::from_ratio(total_capped, params.reference_valuation).map_err(arithmetic())?;
    if pct_for_capped > params.allocation_percent {
        return Err(DistributionError::Allocation {
            category: Category::CommunityLp,
            capped_percent: pct_for_capped.to_string(),
            allocation_percent: params.allocation_percent.to_string(),
        });
    }
    let pct_for_uncapped = params
        .allocation_percent
        .checked_sub(pct_for_capped)
        .map_err(arithmetic())?;
    Ok(PoolTotals {
        total_capped,
        total_uncapped,
        pct_for_capped,
        pct_for_uncapped,
        gfi_for_capped: pct_for_capped
            .apply(params.total_supply)
            .map_err(arithmetic())?,
        gfi_for_uncapped: pct_for_uncapped
            .apply(params.total_supply)
            .map_err(arithmetic())?,
    })
}

pub fn allocate_community(
    params: &CommunityParams,
    holders: &[HolderSnapshot],
    early_investors: &[EarlyInvestorRecord],
) -> Result<CommunityAllocation, DistributionError> {
    let arithmetic = || DistributionError::arithmetic(Category::CommunityLp);

    let accumulator = holders
        .iter()
        .filter(|holder| {
            let excluded = params.exclude.contains(&holder.address);
            if excluded {
                debug!(address = %holder.address, "Holder is in the exclude set");
            }
            !excluded
        })
        .try_fold(PoolAccumulator::default(), |accumulator, holder| {
            let value = dollar_value(holder.raw_balance, params.share_price).map_err(arithmetic())?;
            match qualifying_value(params, holder, value, early_investors) {
                Some(qualifying) => accumulator.push(
                    *holder,
                    value,
                    QualifyingAmount::split(qualifying, params.per_holder_cap),
                ),
                None => Ok(accumulator),
            }
        })?;

    let totals = pool_totals(params, accumulator.total_capped, accumulator.total_uncapped)?;
    info!(
        holders = accumulator.qualifying.len(),
        total_capped = accumulator.total_capped,
        total_uncapped = accumulator.total_uncapped,
        pct_for_capped = %totals.pct_for_capped,
        pct_for_uncapped = %totals.pct_for_uncapped,
        gfi_for_capped = totals.gfi_for_capped,
        gfi_for_uncapped = totals.gfi_for_uncapped,
        "Community pool totals"
    );

    let mut grants = CategoryGrants::new(Category::CommunityLp);
    let mut allocations = Vec::with_capacity(accumulator.qualifying.len());
    for (holder, value, qualifying) in accumulator.qualifying {
        let capped_grant = mul_div_or_zero(
            totals.gfi_for_capped,
            qualifying.capped_value,
            totals.total_capped,
            "capped grant",
        )
        .map_err(arithmetic())?;
        let uncapped_grant = mul_div_or_zero(
            totals.gfi_for_uncapped,
            qualifying.uncapped_value,
            totals.total_uncapped,
            "uncapped grant",
        )
        .map_err(arithmetic())?;

        let uncapped_vesting = if qualifying.total() <= params.vesting_threshold {
            let amount = add(capped_grant, uncapped_grant, "holder grant").map_err(arithmetic())?;
            grants.push(Grant::immediate(holder.address, Reason::CommunityLp, amount));
            VestingSchedule::IMMEDIATE
        } else {
            let schedule =
                uncapped_schedule(params.distribution_timestamp, holder.first_receive_timestamp);
            grants.push(Grant::immediate(
                holder.address,
                Reason::CommunityLp,
                capped_grant,
            ));
            grants.push(Grant {
                account: holder.address,
                reason: Reason::CommunityLp,
                amount: uncapped_grant,
                vesting: schedule,
            });
            schedule
        };
        debug!(
            address = %holder.address,
            dollar_value = value,
            capped_value = qualifying.capped_value,
            uncapped_value = qualifying.uncapped_value,
            capped_grant,
            uncapped_grant,
            vesting_length = uncapped_vesting.vesting_length,
            "Community allocation"
        );
        allocations.push(HolderAllocation {
            holder,
            dollar_value: value,
            qualifying,
            capped_grant,
            uncapped_grant,
            uncapped_vesting,
        });
    }

    Ok(CommunityAllocation {
        grants,
        holders: allocations,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reward_core::fixed_point::{PERCENT_UNIT, TOKEN_DECIMALS};
    use reward_core::Address;
    use rstest::rstest;
    use std::collections::BTreeSet;

    const USD: u128 = 1_000_000;
    const SHARE: u128 = 1_000_000_000_000_000_000;
    const DISTRIBUTION: u64 = 1_700_000_000;

    fn address(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn params() -> CommunityParams {
        CommunityParams {
            allocation_percent: Percent(PERCENT_UNIT / 25),
            per_holder_cap: 750 * USD,
            reference_valuation: 98_000_000 * USD,
            vesting_threshold: 9_500 * USD,
            early_investor_min_excess: CommunityParams::DEFAULT_EARLY_INVESTOR_MIN_EXCESS,
            share_price: SHARE,
            total_supply: 114_285_714 * pow10(TOKEN_DECIMALS).unwrap(),
            distribution_timestamp: DISTRIBUTION,
            exclude: BTreeSet::new(),
        }
    }

    fn holder(byte: u8, dollars: u128, first_receive_timestamp: u64) -> HolderSnapshot {
        HolderSnapshot {
            address: address(byte),
            raw_balance: dollars * SHARE,
            first_receive_timestamp,
        }
    }

    fn early_investor(byte: u8, usdc_investment: u128, custody: bool) -> EarlyInvestorRecord {
        EarlyInvestorRecord {
            canonical_address: address(byte),
            legacy_address: None,
            vesting_token_amount: 1,
            usdc_investment,
            use_custody_exclusion: custody,
            row: 1,
        }
    }

    #[test]
    fn dollar_value_scales_shares_to_usdc() {
        assert_eq!(dollar_value(500 * SHARE, SHARE).unwrap(), 500 * USD);
        // $1.25 per share
        assert_eq!(
            dollar_value(2 * SHARE, SHARE + SHARE / 4).unwrap(),
            2_500_000
        );
        // truncation below one USDC atomic unit
        assert_eq!(dollar_value(1, SHARE).unwrap(), 0);
    }

    #[test_log::test]
    fn two_holder_worked_example() {
        let first_receive_b = DISTRIBUTION - (3 * ONE_MONTH + 10 * 86_400);
        let holders = [holder(0xa, 500, DISTRIBUTION - 1_000), holder(0xb, 20_000, first_receive_b)];
        let allocation = allocate_community(&params(), &holders, &[]).unwrap();

        assert_eq!(
            allocation.totals,
            PoolTotals {
                total_capped: 1_250 * USD,
                total_uncapped: 19_250 * USD,
                pct_for_capped: Percent(12_755_102_040_816),
                pct_for_uncapped: Percent(39_987_244_897_959_184),
                gfi_for_capped: 1_457_725_943_877_513_702_624,
                gfi_for_uncapped: 4_569_970_834_056_122_486_297_376,
            }
        );
        assert_eq!(
            allocation.grants.immediate,
            vec![
                Grant::immediate(address(0xa), Reason::CommunityLp, 583_090_377_551_005_481_049),
                Grant::immediate(address(0xb), Reason::CommunityLp, 874_635_566_326_508_221_574),
            ]
        );
        assert_eq!(
            allocation.grants.vesting,
            vec![Grant {
                account: address(0xb),
                reason: Reason::CommunityLp,
                amount: 4_569_970_834_056_122_486_297_376,
                vesting: VestingSchedule {
                    vesting_length: 8 * ONE_MONTH,
                    cliff_length: 0,
                    vesting_interval: ONE_MONTH,
                },
            }]
        );

        let minted: u128 = allocation
            .grants
            .immediate
            .iter()
            .chain(&allocation.grants.vesting)
            .map(|grant| grant.amount)
            .sum();
        let category_total = params().allocation_percent.apply(params().total_supply).unwrap();
        assert_eq!(minted, 4_571_428_559_999_999_999_999_999);
        assert!(category_total - minted <= 2);
    }

    #[rstest]
    #[case::exactly_at_threshold(9_500 * USD, 1, 0)]
    #[case::one_cent_above(9_500 * USD + 10_000, 1, 1)]
    #[case::under_cap(300 * USD, 1, 0)]
    fn threshold_decides_vesting(
        #[case] value: u128,
        #[case] immediate: usize,
        #[case] vesting: usize,
    ) {
        let holder = HolderSnapshot {
            address: address(1),
            raw_balance: value * 1_000_000_000_000,
            first_receive_timestamp: DISTRIBUTION - ONE_MONTH,
        };
        let allocation = allocate_community(&params(), &[holder], &[]).unwrap();
        assert_eq!(allocation.holders[0].qualifying.total(), value);
        assert_eq!(allocation.grants.immediate.len(), immediate);
        assert_eq!(allocation.grants.vesting.len(), vesting);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(749 * USD)]
    #[case(750 * USD)]
    #[case(750 * USD + 1)]
    #[case(1_000_000 * USD)]
    fn cap_bounds_capped_value(#[case] value: u128) {
        let split = QualifyingAmount::split(value, 750 * USD);
        assert!(split.capped_value <= 750 * USD);
        assert_eq!(split.total(), value);
    }

    #[test]
    fn fully_elapsed_schedule_becomes_immediate() {
        assert_eq!(
            uncapped_schedule(DISTRIBUTION, DISTRIBUTION - 2 * ONE_YEAR),
            VestingSchedule::IMMEDIATE
        );
        // less than a month left floors to nothing
        assert_eq!(
            uncapped_schedule(DISTRIBUTION, DISTRIBUTION - ONE_YEAR + 100),
            VestingSchedule::IMMEDIATE
        );
        // a first receipt after the distribution leaves the full year
        assert_eq!(
            uncapped_schedule(DISTRIBUTION, DISTRIBUTION + 5).vesting_length,
            ONE_YEAR
        );
    }

    #[test]
    fn early_investors_keep_only_meaningful_excess() {
        let holders = [
            holder(1, 1_000, DISTRIBUTION),
            holder(2, 1_000, DISTRIBUTION),
            holder(3, 1_000, DISTRIBUTION),
            holder(4, 1_000, DISTRIBUTION),
        ];
        let mut legacy = early_investor(0x44, 0, false);
        legacy.legacy_address = Some(address(4));
        let investors = [
            early_investor(1, 900 * USD, false),
            early_investor(2, 990 * USD, false),
            early_investor(3, 0, true),
            legacy,
        ];
        let allocation = allocate_community(&params(), &holders, &investors).unwrap();
        let qualifying: Vec<_> = allocation
            .holders
            .iter()
            .map(|h| (h.holder.address, h.qualifying.total()))
            .collect();
        assert_eq!(
            qualifying,
            vec![
                (address(1), 100 * USD),
                (address(2), 0),
                (address(4), 1_000 * USD),
            ]
        );
    }

    #[test]
    fn excluded_holders_get_nothing() {
        let mut params = params();
        params.exclude.insert(address(2));
        let holders = [holder(1, 100, DISTRIBUTION), holder(2, 100, DISTRIBUTION)];
        let allocation = allocate_community(&params, &holders, &[]).unwrap();
        assert_eq!(allocation.holders.len(), 1);
        assert_eq!(allocation.totals.total_capped, 100 * USD);
    }

    #[test]
    fn capped_pool_beyond_allocation_fails() {
        let mut params = params();
        params.reference_valuation = 1_000 * USD;
        let err = allocate_community(&params, &[holder(1, 750, DISTRIBUTION)], &[]).unwrap_err();
        assert_eq!(
            err,
            DistributionError::Allocation {
                category: Category::CommunityLp,
                capped_percent: "75%".to_string(),
                allocation_percent: "4%".to_string(),
            }
        );
    }

    #[test]
    fn no_holders_allocates_nothing() {
        let allocation = allocate_community(&params(), &[], &[]).unwrap();
        assert!(allocation.grants.is_empty());
        assert_eq!(allocation.totals.gfi_for_capped, 0);
    }
}
