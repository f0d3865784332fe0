use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat};
use reward_core::fixed_point::{format_units, SHARE_DECIMALS, TOKEN_DECIMALS, USDC_DECIMALS};
use reward_core::{Address, Grant, Reason};
use serde::Serialize;

use crate::community::dollar_value;
use crate::{DistributionError, HolderAllocation, HolderSnapshot, Partition};

/// One flat row per final grant. Diagnostic only, never committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLedgerRow {
    pub account: Address,
    pub reason: Reason,
    pub amount: String,
    pub amount_tokens: String,
    pub vesting: bool,
    pub vesting_length: u64,
    pub cliff_length: u64,
    pub vesting_interval: u64,
    pub snapshot_balance: Option<String>,
    pub dollar_value: Option<String>,
    /// Community qualifying value at or below the per-holder cap.
    pub qualifying_capped_value: Option<String>,
    /// Community qualifying value above the cap.
    pub qualifying_uncapped_value: Option<String>,
    pub first_receive_timestamp: Option<u64>,
    pub first_receive_time: Option<String>,
}

fn rfc3339(timestamp: u64) -> Option<String> {
    let seconds = i64::try_from(timestamp).ok()?;
    DateTime::from_timestamp(seconds, 0).map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn ledger_row(
    grant: &Grant,
    holder: Option<&HolderSnapshot>,
    community: Option<&HolderAllocation>,
    share_price: u128,
) -> Result<DebugLedgerRow, DistributionError> {
    let dollars = match (community, holder) {
        (Some(allocation), _) => Some(allocation.dollar_value),
        (None, Some(holder)) => Some(
            dollar_value(holder.raw_balance, share_price)
                .map_err(DistributionError::arithmetic("debug ledger"))?,
        ),
        (None, None) => None,
    };
    let dollars_of = |value: u128| format_units(value, USDC_DECIMALS);
    Ok(DebugLedgerRow {
        account: grant.account,
        reason: grant.reason,
        amount: grant.amount.to_string(),
        amount_tokens: format_units(grant.amount, TOKEN_DECIMALS),
        vesting: grant.is_vesting(),
        vesting_length: grant.vesting.vesting_length,
        cliff_length: grant.vesting.cliff_length,
        vesting_interval: grant.vesting.vesting_interval,
        snapshot_balance: holder.map(|holder| format_units(holder.raw_balance, SHARE_DECIMALS)),
        dollar_value: dollars.map(dollars_of),
        qualifying_capped_value: community
            .map(|allocation| dollars_of(allocation.qualifying.capped_value)),
        qualifying_uncapped_value: community
            .map(|allocation| dollars_of(allocation.qualifying.uncapped_value)),
        first_receive_timestamp: holder.map(|holder| holder.first_receive_timestamp),
        first_receive_time: holder.and_then(|holder| rfc3339(holder.first_receive_timestamp)),
    })
}

/// Ledger rows for both halves of `partition`, non-vesting first. Snapshot columns are
/// filled for accounts that appear in `holders`, qualifying columns for accounts that took
/// part in the community category.
pub fn debug_ledger(
    partition: &Partition,
    holders: &[HolderSnapshot],
    community: &[HolderAllocation],
    share_price: u128,
) -> Result<Vec<DebugLedgerRow>, DistributionError> {
    let holders: BTreeMap<Address, &HolderSnapshot> =
        holders.iter().map(|holder| (holder.address, holder)).collect();
    let community: BTreeMap<Address, &HolderAllocation> = community
        .iter()
        .map(|allocation| (allocation.holder.address, allocation))
        .collect();
    partition
        .immediate
        .iter()
        .chain(&partition.vesting)
        .map(|grant| {
            ledger_row(
                grant,
                holders.get(&grant.account).copied(),
                community.get(&grant.account).copied(),
                share_price,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::QualifyingAmount;
    use reward_core::{VestingSchedule, ONE_MONTH};

    #[test]
    fn rows_carry_snapshot_context() {
        let holder = HolderSnapshot {
            address: Address::new([1; 20]),
            raw_balance: 1_500_000_000_000_000_000,
            first_receive_timestamp: 1_700_000_000,
        };
        let partition = Partition {
            vesting: vec![Grant::new(
                Address::new([2; 20]),
                Reason::Advisor,
                5,
                VestingSchedule::new(ONE_MONTH, 0, ONE_MONTH).unwrap(),
            )
            .unwrap()],
            immediate: vec![Grant::immediate(
                holder.address,
                Reason::CommunityLp,
                2_500_000_000_000_000_000,
            )],
            total: 2_500_000_000_000_000_005,
        };
        let community = HolderAllocation {
            holder,
            dollar_value: 3_000_000,
            qualifying: QualifyingAmount::split(3_000_000, 1_000_000),
            capped_grant: 1_000_000_000_000_000_000,
            uncapped_grant: 1_500_000_000_000_000_000,
            uncapped_vesting: VestingSchedule::IMMEDIATE,
        };
        let rows = debug_ledger(
            &partition,
            &[holder],
            &[community],
            2_000_000_000_000_000_000,
        )
        .unwrap();
        assert_eq!(
            rows[0],
            DebugLedgerRow {
                account: holder.address,
                reason: Reason::CommunityLp,
                amount: "2500000000000000000".to_string(),
                amount_tokens: "2.5".to_string(),
                vesting: false,
                vesting_length: 0,
                cliff_length: 0,
                vesting_interval: 0,
                snapshot_balance: Some("1.5".to_string()),
                dollar_value: Some("3".to_string()),
                qualifying_capped_value: Some("1".to_string()),
                qualifying_uncapped_value: Some("2".to_string()),
                first_receive_timestamp: Some(1_700_000_000),
                first_receive_time: Some("2023-11-14T22:13:20Z".to_string()),
            }
        );
        assert!(rows[1].vesting);
        assert_eq!(rows[1].snapshot_balance, None);
        assert_eq!(rows[1].qualifying_capped_value, None);
        assert_eq!(rows[1].amount_tokens, "0.000000000000000005");
    }
}
