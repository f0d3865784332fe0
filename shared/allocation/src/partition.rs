use reward_core::fixed_point::sum;
use reward_core::{Address, Grant};
use tracing::{info, warn};

use crate::{DistributionError, OverallocationPolicy, ValidationPolicy};

/// Final grants, split by whether they vest. Each half is committed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub vesting: Vec<Grant>,
    pub immediate: Vec<Grant>,
    pub total: u128,
}

fn total_of(grants: &[Grant]) -> Result<u128, DistributionError> {
    sum(grants.iter().map(|grant| grant.amount), "grant total")
        .map_err(DistributionError::arithmetic("validation"))
}

/// Takes `excess` out of the treasury's grant, preferring its non-vesting grant.
fn debit_treasury(
    grants: &mut Vec<Grant>,
    treasury: Address,
    excess: u128,
    total: u128,
    policy: &ValidationPolicy,
) -> Result<(), DistributionError> {
    let overallocation = |detail: String| DistributionError::Overallocation {
        total,
        expected: policy.expected_total,
        tolerance: policy.tolerance,
        detail,
    };
    let position = grants
        .iter()
        .position(|grant| grant.account == treasury && !grant.is_vesting())
        .or_else(|| grants.iter().position(|grant| grant.account == treasury))
        .ok_or_else(|| overallocation(format!("; no grant for treasury {treasury} to debit")))?;
    let grant = &mut grants[position];
    if grant.amount < excess {
        return Err(overallocation(format!(
            "; treasury {treasury} grant of {} cannot cover {excess}",
            grant.amount
        )));
    }
    grant.amount -= excess;
    warn!(
        treasury = %treasury,
        excess,
        remaining = grant.amount,
        "Debited treasury grant to correct over-allocation"
    );
    if grant.amount == 0 {
        grants.remove(position);
    }
    Ok(())
}

/// Drops empty grants, checks the grand total against the expected total and splits the
/// list into vesting and non-vesting grants.
pub fn partition_grants(
    grants: Vec<Grant>,
    policy: &ValidationPolicy,
) -> Result<Partition, DistributionError> {
    let mut grants: Vec<Grant> = grants.into_iter().filter(|grant| grant.amount > 0).collect();
    let total = total_of(&grants)?;
    let expected = policy.expected_total;

    if total > expected {
        let excess = total - expected;
        if excess > policy.tolerance {
            return Err(DistributionError::Overallocation {
                total,
                expected,
                tolerance: policy.tolerance,
                detail: String::new(),
            });
        }
        match policy.overallocation {
            OverallocationPolicy::DebitTreasury { account } => {
                debit_treasury(&mut grants, account, excess, total, policy)?
            }
            OverallocationPolicy::Accept => {
                warn!(total, expected, excess, "Accepting over-allocation within tolerance")
            }
        }
    } else if total < expected {
        let shortfall = expected - total;
        if shortfall > policy.tolerance {
            return Err(DistributionError::Underallocation {
                total,
                expected,
                tolerance: policy.tolerance,
            });
        }
        info!(total, expected, shortfall, "Accepting under-allocation within tolerance");
    }

    let (vesting, immediate): (Vec<Grant>, Vec<Grant>) =
        grants.into_iter().partition(Grant::is_vesting);
    let total = total_of(&vesting)? + total_of(&immediate)?;
    info!(
        vesting = vesting.len(),
        immediate = immediate.len(),
        total,
        "Partitioned grants"
    );
    Ok(Partition {
        vesting,
        immediate,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reward_core::{Reason, VestingSchedule, ONE_MONTH};
    use rstest::rstest;

    const TREASURY: Address = Address::new([0xee; 20]);

    fn address(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn monthly() -> VestingSchedule {
        VestingSchedule::new(6 * ONE_MONTH, 0, ONE_MONTH).unwrap()
    }

    fn policy(expected_total: u128, overallocation: OverallocationPolicy) -> ValidationPolicy {
        ValidationPolicy {
            expected_total,
            tolerance: 10,
            overallocation,
        }
    }

    fn grants() -> Vec<Grant> {
        vec![
            Grant::immediate(address(1), Reason::Advisor, 100),
            Grant::new(address(2), Reason::Investment, 200, monthly()).unwrap(),
            Grant::immediate(address(3), Reason::Advisor, 0),
            Grant::new(TREASURY, Reason::Contributor, 50, monthly()).unwrap(),
            Grant::immediate(TREASURY, Reason::Contributor, 50),
        ]
    }

    #[test]
    fn splits_on_vesting_and_drops_empty_grants() {
        let partition = partition_grants(grants(), &policy(400, OverallocationPolicy::Accept)).unwrap();
        assert_eq!(partition.total, 400);
        assert_eq!(partition.vesting.len(), 2);
        assert_eq!(
            partition.immediate,
            vec![
                Grant::immediate(address(1), Reason::Advisor, 100),
                Grant::immediate(TREASURY, Reason::Contributor, 50),
            ]
        );
    }

    #[test_log::test]
    fn small_overallocation_debits_treasury_non_vesting_grant() {
        let partition = partition_grants(
            grants(),
            &policy(393, OverallocationPolicy::DebitTreasury { account: TREASURY }),
        )
        .unwrap();
        assert_eq!(partition.total, 393);
        assert_eq!(partition.immediate[1].amount, 43);
        // other recipients are untouched
        assert_eq!(partition.immediate[0].amount, 100);
        assert_eq!(partition.vesting[1].amount, 50);
    }

    #[test]
    fn treasury_vesting_grant_is_used_without_a_non_vesting_one() {
        let mut grants = grants();
        grants.pop();
        let partition = partition_grants(
            grants,
            &policy(345, OverallocationPolicy::DebitTreasury { account: TREASURY }),
        )
        .unwrap();
        assert_eq!(partition.vesting[1].amount, 45);
    }

    #[test]
    fn missing_treasury_grant_fails() {
        let err = partition_grants(
            grants(),
            &policy(395, OverallocationPolicy::DebitTreasury { account: address(9) }),
        )
        .unwrap_err();
        assert!(matches!(err, DistributionError::Overallocation { total: 400, .. }));
    }

    #[test]
    fn accepted_overallocation_keeps_grants() {
        let partition = partition_grants(grants(), &policy(391, OverallocationPolicy::Accept)).unwrap();
        assert_eq!(partition.total, 400);
    }

    #[rstest]
    #[case::over(389)]
    #[case::under(411)]
    fn beyond_tolerance_is_fatal(#[case] expected: u128) {
        let err = partition_grants(grants(), &policy(expected, OverallocationPolicy::Accept)).unwrap_err();
        match err {
            DistributionError::Overallocation { total, .. } => {
                assert!(expected < 400);
                assert_eq!(total, 400);
            }
            DistributionError::Underallocation { total, .. } => {
                assert!(expected > 400);
                assert_eq!(total, 400);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn small_underallocation_is_accepted() {
        let partition = partition_grants(grants(), &policy(405, OverallocationPolicy::Accept)).unwrap();
        assert_eq!(partition.total, 400);
    }
}
