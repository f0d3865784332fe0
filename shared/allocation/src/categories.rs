//! Grant builders for every category except community LP, which lives in [`crate::community`].

use reward_core::fixed_point::{add, format_units, USDC_DECIMALS};
use reward_core::{Address, Grant, Reason, VestingSchedule};
use tracing::debug;

use crate::community::dollar_value;
use crate::{
    Category, CategoryGrants, DistributionError, DistributionParams, HolderSnapshot,
    ParticipantTerms, Records, SkipReason, SkippedRow, SourceKind, TestPolicy,
    EARLY_LP_SCHEDULE, THREE_YEAR_CLIFF_SCHEDULE, TWO_YEAR_MONTHLY_SCHEDULE,
};

fn push_grant(
    grants: &mut CategoryGrants,
    account: Address,
    reason: Reason,
    amount: u128,
    vesting: VestingSchedule,
) -> Result<(), DistributionError> {
    let grant = Grant::new(account, reason, amount, vesting)
        .map_err(|source| DistributionError::InvalidGrant {
            account,
            reason,
            source,
        })?;
    grants.push(grant);
    Ok(())
}

/// Summed snapshot value of every holder address an early investor is known by.
/// `None` when neither address holds anything.
fn early_investor_value(
    holders: &[HolderSnapshot],
    share_price: u128,
    matches: impl Fn(&Address) -> bool,
) -> Result<Option<u128>, DistributionError> {
    let arithmetic = || DistributionError::arithmetic(Category::EarlyLp);
    let mut total = None;
    for holder in holders.iter().filter(|holder| matches(&holder.address)) {
        let value = dollar_value(holder.raw_balance, share_price).map_err(arithmetic())?;
        total = Some(add(total.unwrap_or(0), value, "early investor value").map_err(arithmetic())?);
    }
    Ok(total)
}

pub fn early_lp_grants(
    params: &DistributionParams,
    records: &Records,
) -> Result<CategoryGrants, DistributionError> {
    let mut grants = CategoryGrants::new(Category::EarlyLp);
    for record in &records.early_investors {
        let skip = |reason| {
            SkippedRow::new(
                SourceKind::EarlyInvestors,
                record.row,
                Some(record.canonical_address.to_string()),
                reason,
            )
        };
        if record.use_custody_exclusion {
            grants.skipped.push(skip(SkipReason::CustodyExclusion));
            continue;
        }
        let value = early_investor_value(
            &records.holders,
            params.community.share_price,
            |address| record.matches(address),
        )?;
        match value {
            Some(value) if value >= record.usdc_investment => {}
            value => {
                grants.skipped.push(skip(SkipReason::BelowInvestment {
                    dollar_value: format_units(value.unwrap_or(0), USDC_DECIMALS),
                    usdc_investment: format_units(record.usdc_investment, USDC_DECIMALS),
                }));
                continue;
            }
        }
        push_grant(
            &mut grants,
            record.canonical_address,
            Reason::EarlyLp,
            record.vesting_token_amount,
            EARLY_LP_SCHEDULE,
        )?;
    }
    Ok(grants)
}

/// Immediate tranche plus a two year monthly tranche, each only when nonzero.
fn split_grants(
    category: Category,
    kind: SourceKind,
    reason: Reason,
    records: &Records,
) -> Result<CategoryGrants, DistributionError> {
    let mut grants = CategoryGrants::new(category);
    for record in records.participants(kind) {
        let ParticipantTerms::Split {
            immediate_amount,
            vesting_amount,
        } = record.terms
        else {
            continue;
        };
        push_grant(
            &mut grants,
            record.address,
            reason,
            immediate_amount,
            VestingSchedule::IMMEDIATE,
        )?;
        push_grant(
            &mut grants,
            record.address,
            reason,
            vesting_amount,
            TWO_YEAR_MONTHLY_SCHEDULE,
        )?;
    }
    Ok(grants)
}

fn flat_grants(
    category: Category,
    kind: SourceKind,
    reason: Reason,
    records: &Records,
) -> Result<CategoryGrants, DistributionError> {
    let mut grants = CategoryGrants::new(category);
    for record in records.participants(kind) {
        if let ParticipantTerms::Flat { amount } = record.terms {
            push_grant(
                &mut grants,
                record.address,
                reason,
                amount,
                THREE_YEAR_CLIFF_SCHEDULE,
            )?;
        }
    }
    Ok(grants)
}

pub fn flight_academy_grants(records: &Records) -> Result<CategoryGrants, DistributionError> {
    split_grants(
        Category::FlightAcademy,
        SourceKind::FlightAcademy,
        Reason::FlightAcademy,
        records,
    )
}

pub fn contributor_grants(records: &Records) -> Result<CategoryGrants, DistributionError> {
    split_grants(
        Category::Contributor,
        SourceKind::Contributor,
        Reason::Contributor,
        records,
    )
}

pub fn investment_grants(records: &Records) -> Result<CategoryGrants, DistributionError> {
    flat_grants(
        Category::Investment,
        SourceKind::Investment,
        Reason::Investment,
        records,
    )
}

pub fn advisor_grants(records: &Records) -> Result<CategoryGrants, DistributionError> {
    flat_grants(
        Category::Advisor,
        SourceKind::Advisor,
        Reason::Advisor,
        records,
    )
}

/// Contractor schedules come verbatim from the record. Contractors are paid under the
/// contributor reason.
pub fn contractor_grants(records: &Records) -> Result<CategoryGrants, DistributionError> {
    let mut grants = CategoryGrants::new(Category::Contractor);
    for record in records.participants(SourceKind::Contractor) {
        if let ParticipantTerms::Explicit { amount, vesting } = record.terms {
            push_grant(
                &mut grants,
                record.address,
                Reason::Contributor,
                amount,
                vesting,
            )?;
        }
    }
    Ok(grants)
}

pub fn test_grants(
    policy: &TestPolicy,
    records: &Records,
) -> Result<CategoryGrants, DistributionError> {
    let mut grants = CategoryGrants::new(Category::Test);
    for record in records.participants(SourceKind::Test) {
        debug!(address = %record.address, "Adding test grants");
        push_grant(
            &mut grants,
            record.address,
            Reason::Test,
            policy.immediate_amount,
            VestingSchedule::IMMEDIATE,
        )?;
        push_grant(
            &mut grants,
            record.address,
            Reason::Test,
            policy.vesting_amount,
            policy.vesting,
        )?;
    }
    Ok(grants)
}
