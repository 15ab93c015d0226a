//! Scheduled transfers.
//!
//! Owners create and cancel schedules through [`ScheduleService`]; the
//! [`ScheduleRunner`] claims due schedules and executes them through the
//! transfer engine exactly once.

mod service;
mod types;
mod worker;

#[cfg(test)]
mod tests;

pub use service::{CreateScheduleRequest, ScheduleService};
pub use types::{ScheduleOutcome, ScheduleStatus, ScheduledTransfer};
pub use worker::{ScheduleRunner, SweepReport};
