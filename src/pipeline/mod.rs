//! Crawl orchestration.
//!
//! - `Monitor`: runs cycles and owns the pagination walk
//! - `Scheduler`: repeats cycles on the configured interval
//! - comment eligibility policy (`CommentFilter::admits`)

mod eligibility;
mod monitor;
mod schedule;
#[cfg(test)]
mod testing;

pub use monitor::{ActiveState, Monitor};
pub use schedule::Scheduler;
