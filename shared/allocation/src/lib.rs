pub mod categories;
mod category;
mod combiner;
pub mod community;
mod debug_ledger;
mod error;
mod params;
mod partition;
mod pipeline;
mod records;
mod source;

pub use category::{
    Category, CategoryGrants, EARLY_LP_SCHEDULE, THREE_YEAR_CLIFF_SCHEDULE,
    TWO_YEAR_MONTHLY_SCHEDULE,
};
pub use combiner::{combine_grants, reason_bucket};
pub use community::{
    allocate_community, CommunityAllocation, HolderAllocation, PoolTotals, QualifyingAmount,
};
pub use debug_ledger::{debug_ledger, DebugLedgerRow};
pub use error::DistributionError;
pub use params::{
    CombineMode, CombinePolicy, CommunityParams, DistributionParams, OverallocationPolicy,
    TestPolicy, ValidationPolicy,
};
pub use partition::{partition_grants, Partition};
pub use pipeline::{
    build_category_grants, finalize_grants, plan_distribution, CommunityReport, DistributionPlan,
};
pub use records::{
    load_records, EarlyInvestorRecord, HolderSnapshot, ParticipantRecord, ParticipantTerms,
    Records, SkipReason, SkippedRow, SourceKind,
};
pub use source::{InMemoryRecordSource, RecordSource};
