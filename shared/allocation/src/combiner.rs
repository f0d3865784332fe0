use indexmap::IndexMap;
use reward_core::fixed_point::add;
use reward_core::{Address, Grant, Reason};
use tracing::debug;

use crate::{CombineMode, DistributionError};

/// The group a reason is merged under.
pub fn reason_bucket(reason: Reason, mode: CombineMode) -> Reason {
    match (mode, reason) {
        (CombineMode::Combined, Reason::CommunityLp | Reason::FlightAcademy | Reason::Test) => {
            Reason::CombinedLpAndFlightAcademy
        }
        _ => reason,
    }
}

/// Merges draft grants into one grant per account and reason bucket.
///
/// Grants in a group must share their vesting schedule. A group made of a single reason
/// keeps that reason; a group mixing reasons is tagged with the bucket. Groups come out in
/// the order their first grant was seen.
pub fn combine_grants(
    grants: impl IntoIterator<Item = Grant>,
    mode: CombineMode,
) -> Result<Vec<Grant>, DistributionError> {
    let mut groups: IndexMap<(Address, Reason), Grant> = IndexMap::new();
    for grant in grants {
        let bucket = reason_bucket(grant.reason, mode);
        let Some(merged) = groups.get_mut(&(grant.account, bucket)) else {
            groups.insert((grant.account, bucket), grant);
            continue;
        };
        if merged.vesting != grant.vesting {
            return Err(DistributionError::InconsistentVesting {
                account: grant.account,
                bucket,
            });
        }
        merged.amount = add(merged.amount, grant.amount, "combined grant")
            .map_err(DistributionError::arithmetic("combining grants"))?;
        if merged.reason != grant.reason {
            merged.reason = bucket;
        }
    }
    debug!(groups = groups.len(), mode = ?mode, "Combined grants");
    Ok(groups.into_values().collect())
}
