use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openslot_core::ports::CalendarStore;
use openslot_domain::{
    Account, AccountId, AvailableBlock, AvailableSchedule, CalendarEvent, OwnerId,
    Result as DomainResult, ScheduleOwner, ScheduleVisitor, SchedulingError,
};
use uuid::Uuid;

/// In-memory fake for [`CalendarStore`].
///
/// Keeps one event list per account, records every call by name, and can
/// inject a failure into the next call. Reflection writes can be slowed
/// down to make concurrent runs observable.
#[derive(Default, Clone)]
pub struct MockCalendarStore {
    events: Arc<Mutex<HashMap<AccountId, Vec<CalendarEvent>>>>,
    reflected: Arc<Mutex<HashMap<OwnerId, AvailableSchedule>>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_next: Arc<Mutex<Option<SchedulingError>>>,
    reflect_delay_ms: Arc<AtomicUsize>,
    reflect_in_flight: Arc<AtomicUsize>,
    reflect_max_in_flight: Arc<AtomicUsize>,
}

impl MockCalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event into the account's calendar.
    pub fn with_event(self, account: &AccountId, event: CalendarEvent) -> Self {
        self.events.lock().unwrap().entry(account.clone()).or_default().push(event);
        self
    }

    /// Names of all calls made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Total number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Make the next call fail with the given error.
    pub fn fail_next_call(&self, error: SchedulingError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    /// Delay every reflection write, so overlap between concurrent runs
    /// becomes observable.
    pub fn set_reflect_delay(&self, delay: Duration) {
        self.reflect_delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// The last reflected schedule for the owner, if any.
    pub fn reflected_schedule(&self, owner_id: OwnerId) -> Option<AvailableSchedule> {
        self.reflected.lock().unwrap().get(&owner_id).cloned()
    }

    /// Highest number of reflection writes that ran at the same time.
    pub fn max_concurrent_reflections(&self) -> usize {
        self.reflect_max_in_flight.load(Ordering::SeqCst)
    }

    /// All events currently in the account's calendar.
    pub fn events_for(&self, account: &AccountId) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().get(account).cloned().unwrap_or_default()
    }

    fn record(&self, name: &'static str) -> DomainResult<()> {
        self.calls.lock().unwrap().push(name);
        match self.fail_next.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn find_appointment(
        &self,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
    ) -> Option<CalendarEvent> {
        self.events
            .lock()
            .unwrap()
            .get(&owner.account.id)
            .into_iter()
            .flatten()
            .find(|e| e.assistant_appointment && e.start == block.start() && e.end == block.end())
            .cloned()
    }
}

#[async_trait]
impl CalendarStore for MockCalendarStore {
    async fn get_calendar(
        &self,
        account: &Account,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<CalendarEvent>> {
        self.record("get_calendar")?;
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(&account.id)
            .into_iter()
            .flatten()
            .filter(|e| e.overlaps_range(start, end))
            .cloned()
            .collect())
    }

    async fn get_existing_appointment(
        &self,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
    ) -> DomainResult<Option<CalendarEvent>> {
        self.record("get_existing_appointment")?;
        Ok(self.find_appointment(owner, block))
    }

    async fn create_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
        description: &str,
    ) -> DomainResult<CalendarEvent> {
        self.record("create_appointment")?;
        let event = CalendarEvent {
            uid: Uuid::new_v4().to_string(),
            summary: format!("Appointment with {}", owner.account.display_name),
            description: Some(description.to_owned()),
            start: block.start(),
            end: block.end(),
            owner: Some(owner.account.id.clone()),
            visitor_attendees: vec![visitor.account.id.clone()],
            assistant_appointment: true,
            visitor_limit: Some(block.visitor_limit()),
            availability_reflection: false,
            transparent: false,
        };
        self.events
            .lock()
            .unwrap()
            .entry(owner.account.id.clone())
            .or_default()
            .push(event.clone());
        Ok(event)
    }

    async fn cancel_appointment(
        &self,
        _visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
    ) -> DomainResult<()> {
        self.record("cancel_appointment")?;
        if let Some(list) = self.events.lock().unwrap().get_mut(&owner.account.id) {
            list.retain(|e| e.uid != event.uid);
        }
        Ok(())
    }

    async fn join_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
    ) -> DomainResult<CalendarEvent> {
        self.record("join_appointment")?;
        let mut events = self.events.lock().unwrap();
        let stored = events
            .get_mut(&owner.account.id)
            .and_then(|list| list.iter_mut().find(|e| e.uid == event.uid))
            .ok_or(SchedulingError::NoAppointmentExists)?;
        if !stored.is_attending_visitor(&visitor.account.id) {
            stored.visitor_attendees.push(visitor.account.id.clone());
        }
        Ok(stored.clone())
    }

    async fn leave_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
    ) -> DomainResult<CalendarEvent> {
        self.record("leave_appointment")?;
        let mut events = self.events.lock().unwrap();
        let stored = events
            .get_mut(&owner.account.id)
            .and_then(|list| list.iter_mut().find(|e| e.uid == event.uid))
            .ok_or(SchedulingError::NoAppointmentExists)?;
        stored.visitor_attendees.retain(|a| a != &visitor.account.id);
        Ok(stored.clone())
    }

    async fn check_for_conflicts(
        &self,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
    ) -> DomainResult<()> {
        self.record("check_for_conflicts")?;
        let conflicted = self
            .events
            .lock()
            .unwrap()
            .get(&owner.account.id)
            .into_iter()
            .flatten()
            .any(|e| {
                e.causes_conflict(&owner.account.id)
                    && e.overlaps_range(block.start(), block.end())
            });
        if conflicted {
            return Err(SchedulingError::ConflictExists);
        }
        Ok(())
    }

    async fn reflect_available_schedule(
        &self,
        owner: &ScheduleOwner,
        schedule: &AvailableSchedule,
    ) -> DomainResult<()> {
        self.record("reflect_available_schedule")?;
        let in_flight = self.reflect_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.reflect_max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay_ms = self.reflect_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
        }

        self.reflected.lock().unwrap().insert(owner.id, schedule.clone());
        self.reflect_in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn purge_available_schedule_reflections(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.record("purge_available_schedule_reflections")?;
        let mut reflected = self.reflected.lock().unwrap();
        if let Some(schedule) = reflected.get(&owner.id) {
            let kept: AvailableSchedule = schedule
                .blocks()
                .filter(|b| b.start() < start || b.start() >= end)
                .cloned()
                .collect();
            reflected.insert(owner.id, kept);
        }
        Ok(())
    }
}
