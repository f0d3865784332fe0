mod address;
pub mod fixed_point;
mod grant;

pub use address::{Address, AddressError, ADDRESS_BYTES};
pub use fixed_point::{ArithmeticError, ArithmeticResult, Percent};
pub use grant::{
    floor_to_interval, Grant, GrantError, Reason, VestingSchedule, ONE_DAY, ONE_HOUR, ONE_MONTH,
    ONE_YEAR,
};
