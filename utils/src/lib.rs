//! Shared utilities for the staking engine.

pub mod accumulator;
pub mod logging;
pub mod numeric;
pub mod race;
pub mod time;

pub use accumulator::BigAccumulator;
pub use logging::{init_logging, LogFormat};
pub use numeric::{round, scale_by_ratio, FixedDecimal, NumericError};
pub use race::{first_ok, RaceError};
pub use time::{format_duration, Clock, SystemClock};
