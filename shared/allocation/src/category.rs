use std::fmt;

use reward_core::{Grant, VestingSchedule, ONE_MONTH, ONE_YEAR};
use serde::{Deserialize, Serialize};

use crate::{SkippedRow, SourceKind};

/// Six months, linear, monthly steps.
pub const EARLY_LP_SCHEDULE: VestingSchedule = VestingSchedule {
    vesting_length: 6 * ONE_MONTH,
    cliff_length: 0,
    vesting_interval: ONE_MONTH,
};

/// Two years, no cliff, monthly steps. Flight academy and contributor vesting tranches.
pub const TWO_YEAR_MONTHLY_SCHEDULE: VestingSchedule = VestingSchedule {
    vesting_length: 2 * ONE_YEAR,
    cliff_length: 0,
    vesting_interval: ONE_MONTH,
};

/// Three years with a six month cliff, monthly steps. Investors and advisors.
pub const THREE_YEAR_CLIFF_SCHEDULE: VestingSchedule = VestingSchedule {
    vesting_length: 3 * ONE_YEAR,
    cliff_length: 6 * ONE_MONTH,
    vesting_interval: ONE_MONTH,
};

/// A funding category, each with its own grant builder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CommunityLp,
    EarlyLp,
    FlightAcademy,
    Investment,
    Advisor,
    Contractor,
    Contributor,
    Test,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::CommunityLp,
        Category::EarlyLp,
        Category::FlightAcademy,
        Category::Investment,
        Category::Advisor,
        Category::Contractor,
        Category::Contributor,
        Category::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CommunityLp => "community_lp",
            Category::EarlyLp => "early_lp",
            Category::FlightAcademy => "flight_academy",
            Category::Investment => "investment",
            Category::Advisor => "advisor",
            Category::Contractor => "contractor",
            Category::Contributor => "contributor",
            Category::Test => "test",
        }
    }

    /// Record sources the category's builder reads. All of them must exist.
    pub fn required_sources(&self) -> &'static [SourceKind] {
        match self {
            Category::CommunityLp | Category::EarlyLp => {
                &[SourceKind::Holders, SourceKind::EarlyInvestors]
            }
            Category::FlightAcademy => &[SourceKind::FlightAcademy],
            Category::Investment => &[SourceKind::Investment],
            Category::Advisor => &[SourceKind::Advisor],
            Category::Contractor => &[SourceKind::Contractor],
            Category::Contributor => &[SourceKind::Contributor],
            Category::Test => &[SourceKind::Test],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draft grants of one category, split by whether they vest, plus the rows it skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGrants {
    pub category: Category,
    pub immediate: Vec<Grant>,
    pub vesting: Vec<Grant>,
    pub skipped: Vec<SkippedRow>,
}

impl CategoryGrants {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            immediate: vec![],
            vesting: vec![],
            skipped: vec![],
        }
    }

    /// Files `grant` under immediate or vesting by its schedule. Zero amounts are dropped.
    pub fn push(&mut self, grant: Grant) {
        if grant.amount == 0 {
            return;
        }
        if grant.is_vesting() {
            self.vesting.push(grant);
        } else {
            self.immediate.push(grant);
        }
    }

    pub fn len(&self) -> usize {
        self.immediate.len() + self.vesting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reward_core::{Address, Reason};

    #[test]
    fn fixed_schedules_are_valid() {
        for schedule in [
            EARLY_LP_SCHEDULE,
            TWO_YEAR_MONTHLY_SCHEDULE,
            THREE_YEAR_CLIFF_SCHEDULE,
        ] {
            schedule.validate().unwrap();
        }
    }

    #[test]
    fn push_files_by_schedule_and_drops_zero() {
        let account = Address::new([7; 20]);
        let mut grants = CategoryGrants::new(Category::Advisor);
        grants.push(Grant::immediate(account, Reason::Advisor, 0));
        grants.push(Grant::immediate(account, Reason::Advisor, 3));
        grants.push(Grant::new(account, Reason::Advisor, 4, THREE_YEAR_CLIFF_SCHEDULE).unwrap());
        assert_eq!(grants.immediate.len(), 1);
        assert_eq!(grants.vesting.len(), 1);
        assert_eq!(grants.len(), 2);
    }
}
