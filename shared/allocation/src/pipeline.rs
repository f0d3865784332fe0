use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use reward_core::Grant;
use tracing::info;

use crate::categories::{
    advisor_grants, contractor_grants, contributor_grants, early_lp_grants,
    flight_academy_grants, investment_grants, test_grants,
};
use crate::community::allocate_community;
use crate::{
    combine_grants, load_records, partition_grants, Category, CategoryGrants, DistributionError,
    DistributionParams, HolderAllocation, Partition, PoolTotals, RecordSource, Records,
    SkippedRow,
};

/// Per-holder detail of the community category, for the debug ledger and run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityReport {
    pub holders: Vec<HolderAllocation>,
    pub totals: PoolTotals,
}

/// Everything a batch produces before commitment.
#[derive(Debug, Clone)]
pub struct DistributionPlan {
    pub partition: Partition,
    pub skipped: Vec<SkippedRow>,
    pub community: Option<CommunityReport>,
    pub records: Records,
}

fn build_category(
    category: Category,
    params: &DistributionParams,
    records: &Records,
) -> Result<(CategoryGrants, Option<CommunityReport>), DistributionError> {
    let grants = match category {
        Category::CommunityLp => {
            let allocation =
                allocate_community(&params.community, &records.holders, &records.early_investors)?;
            let report = CommunityReport {
                holders: allocation.holders,
                totals: allocation.totals,
            };
            return Ok((allocation.grants, Some(report)));
        }
        Category::EarlyLp => early_lp_grants(params, records)?,
        Category::FlightAcademy => flight_academy_grants(records)?,
        Category::Investment => investment_grants(records)?,
        Category::Advisor => advisor_grants(records)?,
        Category::Contractor => contractor_grants(records)?,
        Category::Contributor => contributor_grants(records)?,
        Category::Test => test_grants(&params.test, records)?,
    };
    Ok((grants, None))
}

/// Runs every enabled category builder in parallel over `records`. Results come back in
/// category order whatever order the builders finish in.
pub fn build_category_grants(
    params: &DistributionParams,
    records: &Records,
) -> Result<(Vec<CategoryGrants>, Option<CommunityReport>), DistributionError> {
    let categories: Vec<Category> = params.categories.iter().copied().collect();
    let built = categories
        .par_iter()
        .map(|category| build_category(*category, params, records))
        .collect::<Result<Vec<_>, _>>()?;
    let mut community = None;
    let mut grants = Vec::with_capacity(built.len());
    for (category_grants, report) in built {
        info!(
            category = %category_grants.category,
            immediate = category_grants.immediate.len(),
            vesting = category_grants.vesting.len(),
            skipped = category_grants.skipped.len(),
            "Built category grants"
        );
        community = community.or(report);
        grants.push(category_grants);
    }
    Ok((grants, community))
}

/// Combines the builders' output and validates it against the expected total.
pub fn finalize_grants(
    params: &DistributionParams,
    category_grants: Vec<CategoryGrants>,
) -> Result<(Partition, Vec<SkippedRow>), DistributionError> {
    let mut immediate: Vec<Grant> = vec![];
    let mut vesting: Vec<Grant> = vec![];
    let mut skipped = vec![];
    for grants in category_grants {
        immediate.extend(grants.immediate);
        vesting.extend(grants.vesting);
        skipped.extend(grants.skipped);
    }
    let mut combined = combine_grants(immediate, params.combine.immediate)?;
    combined.extend(combine_grants(vesting, params.combine.vesting)?);
    Ok((partition_grants(combined, &params.validation)?, skipped))
}

/// Loads records, builds, combines and validates all grants of one batch.
pub fn plan_distribution(
    params: &DistributionParams,
    source: &dyn RecordSource,
) -> Result<DistributionPlan, DistributionError> {
    params.validate()?;
    let mut records = load_records(source, &params.required_sources())?;
    let (category_grants, community) = build_category_grants(params, &records)?;
    let (partition, category_skipped) = finalize_grants(params, category_grants)?;

    let mut skipped = std::mem::take(&mut records.skipped);
    skipped.extend(category_skipped);
    info!(
        vesting = partition.vesting.len(),
        immediate = partition.immediate.len(),
        total = partition.total,
        skipped = skipped.len(),
        "Planned distribution"
    );
    Ok(DistributionPlan {
        partition,
        skipped,
        community,
        records,
    })
}
