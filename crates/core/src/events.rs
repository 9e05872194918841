//! Appointment change notifications.
//!
//! Every successful scheduling mutation is published to a
//! [`ChangeListener`]. Downstream consumers (reminder mail, usage
//! statistics) subscribe outside this crate; the default listener just
//! writes structured log events.

use async_trait::async_trait;
use openslot_domain::{AccountId, AvailableBlock, CalendarEvent, OwnerId};

/// A completed appointment mutation.
#[derive(Debug, Clone)]
pub enum AppointmentChange {
    /// A new appointment was created with the visitor as sole attendee.
    Created {
        /// The created event.
        event: CalendarEvent,
        /// The schedule owner.
        owner: OwnerId,
        /// The booking visitor.
        visitor: AccountId,
        /// The booked block.
        block: AvailableBlock,
    },
    /// The visitor joined an existing multi-visitor appointment.
    Joined {
        /// The joined event.
        event: CalendarEvent,
        /// The schedule owner.
        owner: OwnerId,
        /// The joining visitor.
        visitor: AccountId,
        /// The booked block.
        block: AvailableBlock,
    },
    /// The visitor left an appointment that persists for others.
    Left {
        /// The event after the visitor left.
        event: CalendarEvent,
        /// The schedule owner.
        owner: OwnerId,
        /// The departing visitor.
        visitor: AccountId,
        /// The affected block.
        block: AvailableBlock,
    },
    /// The appointment was cancelled outright.
    Cancelled {
        /// The cancelled event.
        event: CalendarEvent,
        /// The schedule owner.
        owner: OwnerId,
        /// The cancelling visitor.
        visitor: AccountId,
        /// The affected block.
        block: AvailableBlock,
        /// Reason supplied by the visitor, if any.
        reason: Option<String>,
    },
}

/// Receives appointment changes after they are persisted. Publication is
/// fire-and-forget: listeners must not fail the scheduling operation.
#[async_trait]
pub trait ChangeListener: Send + Sync {
    /// Handle a completed change.
    async fn publish(&self, change: AppointmentChange);
}

/// Default listener: emits a structured tracing event per change.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingChangeListener;

#[async_trait]
impl ChangeListener for TracingChangeListener {
    async fn publish(&self, change: AppointmentChange) {
        match change {
            AppointmentChange::Created { event, owner, visitor, .. } => {
                tracing::info!(event_uid = %event.uid, %owner, %visitor, "appointment.created");
            }
            AppointmentChange::Joined { event, owner, visitor, .. } => {
                tracing::info!(event_uid = %event.uid, %owner, %visitor, "appointment.joined");
            }
            AppointmentChange::Left { event, owner, visitor, .. } => {
                tracing::info!(event_uid = %event.uid, %owner, %visitor, "appointment.left");
            }
            AppointmentChange::Cancelled { event, owner, visitor, reason, .. } => {
                tracing::info!(
                    event_uid = %event.uid,
                    %owner,
                    %visitor,
                    reason = reason.as_deref().unwrap_or(""),
                    "appointment.cancelled"
                );
            }
        }
    }
}
