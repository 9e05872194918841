use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openslot_core::ports::AvailabilityStore;
use openslot_domain::{
    AvailableBlock, AvailableSchedule, OwnerId, Result as DomainResult, ScheduleOwner,
};

/// In-memory fake for [`AvailabilityStore`]: one published schedule per
/// owner, with target resolution running against minimum-duration slots
/// exactly like the persisted store does.
#[derive(Default, Clone)]
pub struct MockAvailabilityStore {
    schedules: Arc<Mutex<HashMap<OwnerId, AvailableSchedule>>>,
    calls: Arc<AtomicUsize>,
}

impl MockAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the owner's published schedule.
    pub fn with_schedule(self, owner_id: OwnerId, schedule: AvailableSchedule) -> Self {
        self.schedules.lock().unwrap().insert(owner_id, schedule);
        self
    }

    /// Total number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn schedule_for(&self, owner: &ScheduleOwner) -> AvailableSchedule {
        self.schedules.lock().unwrap().get(&owner.id).cloned().unwrap_or_default()
    }

    fn slots_for(&self, owner: &ScheduleOwner) -> Vec<AvailableBlock> {
        let minutes = i64::from(owner.preferred_meeting_durations().min_minutes());
        self.schedule_for(owner).expand(minutes)
    }
}

#[async_trait]
impl AvailabilityStore for MockAvailabilityStore {
    async fn retrieve(&self, owner: &ScheduleOwner) -> DomainResult<AvailableSchedule> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.schedule_for(owner))
    }

    async fn retrieve_range(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<AvailableSchedule> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.schedule_for(owner).subset(start, end))
    }

    async fn resolve_target_block(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
    ) -> DomainResult<Option<AvailableBlock>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.slots_for(owner).into_iter().find(|b| b.start() == start))
    }

    async fn resolve_double_length_block(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
    ) -> DomainResult<Option<AvailableBlock>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let slots = self.slots_for(owner);
        let Some(first) = slots.iter().find(|b| b.start() == start) else {
            return Ok(None);
        };
        let Some(second) = slots.iter().find(|b| b.start() == first.end()) else {
            return Ok(None);
        };
        Ok(first.merge(second).ok())
    }
}
