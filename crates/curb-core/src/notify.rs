//! # Reminder Notifications
//!
//! Fire-and-forget hand-off of expiration reminders. Transport
//! (push, SMS) lives behind whatever drains the queue.

use crate::error::{ParkingError, ParkingResult};
use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Reminder for one session, keyed by session id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTask {
    pub session_id: Uuid,
    pub user_id: String,
    pub zone: String,
    pub vehicle_plate: String,
    pub stop_time_utc: DateTime<Utc>,
    pub alert_before_minutes: u32,
}

impl ReminderTask {
    pub fn for_session(session: &Session) -> Self {
        Self {
            session_id: session.id,
            user_id: session.user_id.clone(),
            zone: session.zone.clone(),
            vehicle_plate: session.vehicle_plate.clone(),
            stop_time_utc: session.stop_time_utc,
            alert_before_minutes: session.alert_before_minutes,
        }
    }
}

/// Notification queue operations.
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, task: ReminderTask) -> ParkingResult<()>;
}

/// Type alias for a shared queue
pub type BoxedNotificationQueue = Arc<dyn NotificationQueue>;

/// Queue backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelNotificationQueue {
    sender: mpsc::UnboundedSender<ReminderTask>,
}

impl ChannelNotificationQueue {
    /// Create a queue and the receiver a dispatcher drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReminderTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationQueue for ChannelNotificationQueue {
    fn enqueue(&self, task: ReminderTask) -> ParkingResult<()> {
        self.sender
            .send(task)
            .map_err(|e| ParkingError::Internal(format!("reminder queue closed: {}", e)))
    }
}
