use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

pub const ONE_HOUR: u64 = 60 * 60;
pub const ONE_DAY: u64 = 24 * ONE_HOUR;
pub const ONE_YEAR: u64 = 365 * ONE_DAY;
/// A twelfth of [`ONE_YEAR`], so twelve monthly steps vest exactly one year.
pub const ONE_MONTH: u64 = ONE_YEAR / 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrantError {
    #[error("cliff length {cliff_length} exceeds vesting length {vesting_length}")]
    CliffExceedsVesting {
        cliff_length: u64,
        vesting_length: u64,
    },

    #[error("vesting length {vesting_length} needs an interval in 1..={vesting_length}, got {vesting_interval}")]
    InvalidInterval {
        vesting_length: u64,
        vesting_interval: u64,
    },

    #[error("immediate grants must not carry a cliff or interval (cliff {cliff_length}, interval {vesting_interval})")]
    ImmediateWithSchedule {
        cliff_length: u64,
        vesting_interval: u64,
    },

    #[error("unknown grant reason {0:?}")]
    UnknownReason(String),
}

/// Why an account receives a grant. Closed taxonomy; raw strings are parsed into it at the
/// record boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    CommunityLp,
    EarlyLp,
    FlightAcademy,
    Investment,
    Advisor,
    Contributor,
    CombinedLpAndFlightAcademy,
    Test,
}

impl Reason {
    pub const ALL: [Reason; 8] = [
        Reason::CommunityLp,
        Reason::EarlyLp,
        Reason::FlightAcademy,
        Reason::Investment,
        Reason::Advisor,
        Reason::Contributor,
        Reason::CombinedLpAndFlightAcademy,
        Reason::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::CommunityLp => "community_lp",
            Reason::EarlyLp => "early_lp",
            Reason::FlightAcademy => "flight_academy",
            Reason::Investment => "investment",
            Reason::Advisor => "advisor",
            Reason::Contributor => "contributor",
            Reason::CombinedLpAndFlightAcademy => "combined_lp_and_flight_academy",
            Reason::Test => "test",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = GrantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Reason::ALL
            .into_iter()
            .find(|reason| reason.as_str() == normalized)
            .ok_or_else(|| GrantError::UnknownReason(value.to_string()))
    }
}

/// How a grant unlocks: `vesting_length` seconds in total, nothing before `cliff_length`,
/// then in steps of `vesting_interval`. A zero length means fully claimable at once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct VestingSchedule {
    pub vesting_length: u64,
    pub cliff_length: u64,
    pub vesting_interval: u64,
}

impl VestingSchedule {
    pub const IMMEDIATE: VestingSchedule = VestingSchedule {
        vesting_length: 0,
        cliff_length: 0,
        vesting_interval: 0,
    };

    pub fn new(
        vesting_length: u64,
        cliff_length: u64,
        vesting_interval: u64,
    ) -> Result<Self, GrantError> {
        let schedule = Self {
            vesting_length,
            cliff_length,
            vesting_interval,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), GrantError> {
        if self.vesting_length == 0 {
            if self.cliff_length != 0 || self.vesting_interval != 0 {
                return Err(GrantError::ImmediateWithSchedule {
                    cliff_length: self.cliff_length,
                    vesting_interval: self.vesting_interval,
                });
            }
            return Ok(());
        }
        if self.cliff_length > self.vesting_length {
            return Err(GrantError::CliffExceedsVesting {
                cliff_length: self.cliff_length,
                vesting_length: self.vesting_length,
            });
        }
        if self.vesting_interval == 0 || self.vesting_interval > self.vesting_length {
            return Err(GrantError::InvalidInterval {
                vesting_length: self.vesting_length,
                vesting_interval: self.vesting_interval,
            });
        }
        Ok(())
    }

    pub fn is_immediate(&self) -> bool {
        self.vesting_length == 0
    }
}

/// Rounds `duration` down to a whole number of `interval`s.
pub fn floor_to_interval(duration: u64, interval: u64) -> u64 {
    if interval == 0 {
        return duration;
    }
    duration - duration % interval
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub account: Address,
    pub reason: Reason,
    pub amount: u128,
    pub vesting: VestingSchedule,
}

impl Grant {
    pub fn new(
        account: Address,
        reason: Reason,
        amount: u128,
        vesting: VestingSchedule,
    ) -> Result<Self, GrantError> {
        vesting.validate()?;
        Ok(Self {
            account,
            reason,
            amount,
            vesting,
        })
    }

    pub fn immediate(account: Address, reason: Reason, amount: u128) -> Self {
        Self {
            account,
            reason,
            amount,
            vesting: VestingSchedule::IMMEDIATE,
        }
    }

    pub fn is_vesting(&self) -> bool {
        !self.vesting.is_immediate()
    }

    /// Canonical ordering key used when committing a grant list.
    pub fn sort_key(&self) -> (Address, Reason, u128, u64, u64, u64) {
        (
            self.account,
            self.reason,
            self.amount,
            self.vesting.vesting_length,
            self.vesting.cliff_length,
            self.vesting.vesting_interval,
        )
    }
}
