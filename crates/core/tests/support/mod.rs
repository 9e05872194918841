//! Shared test helpers for `openslot-core` integration tests.
//!
//! In-memory fakes for every port plus fixture builders, so the flow
//! tests can focus on behaviour instead of boilerplate.

pub mod availability;
pub mod calendar;
pub mod directory;
pub mod locks;

use chrono::{DateTime, Duration, TimeZone, Utc};
use openslot_domain::{
    Account, AccountId, AvailableBlock, OwnerId, Preferences, ScheduleOwner, ScheduleVisitor,
};

/// Fixed-date timestamp helper: 2024-06-`day` `hour`:`min` UTC.
pub fn ts(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, min, 0).unwrap()
}

/// A block of `minutes` length starting at `start`.
pub fn block(start: DateTime<Utc>, minutes: i64, limit: u32) -> AvailableBlock {
    AvailableBlock::new(start, start + Duration::minutes(minutes), limit).unwrap()
}

/// An eligible directory account.
pub fn account(id: &str) -> Account {
    Account {
        id: AccountId::from(id),
        username: id.to_owned(),
        display_name: format!("Test {id}"),
        email: format!("{id}@example.edu"),
        eligible: true,
    }
}

/// A schedule owner with default preferences.
pub fn owner(n: i64, id: &str) -> ScheduleOwner {
    ScheduleOwner { id: OwnerId(n), account: account(id), preferences: Preferences::default() }
}

/// A visitor wrapping a fresh account.
pub fn visitor(id: &str) -> ScheduleVisitor {
    ScheduleVisitor { account: account(id) }
}
