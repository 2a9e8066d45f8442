//! # Lifecycle Scanner
//!
//! Periodic jobs that age sessions forward and queue reminders, plus
//! the user-facing reminder setting. All transitions go through the
//! store's conditional updates, so overlapping scans are harmless:
//! only the scan that flips a status acts on it.

use crate::error::{ParkingError, ParkingResult};
use crate::notify::{BoxedNotificationQueue, ReminderTask};
use crate::session::{alert_at, Session, MIN_REMINDER_BUFFER_MINUTES};
use crate::store::BoxedSessionStore;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Result of one `check_ongoing_events` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertScan {
    /// Sessions this pass moved to ALERTED
    pub alerted: usize,
    /// Reminders handed to the queue
    pub enqueued: usize,
}

#[derive(Clone)]
pub struct LifecycleScanner {
    sessions: BoxedSessionStore,
    notifications: BoxedNotificationQueue,
    min_buffer: Duration,
}

impl LifecycleScanner {
    pub fn new(sessions: BoxedSessionStore, notifications: BoxedNotificationQueue) -> Self {
        Self {
            sessions,
            notifications,
            min_buffer: Duration::minutes(MIN_REMINDER_BUFFER_MINUTES),
        }
    }

    /// Builder: minimum time left for a reminder to be accepted
    pub fn with_min_buffer(mut self, buffer: Duration) -> Self {
        self.min_buffer = buffer;
        self
    }

    /// Finish every session whose stop time has passed.
    #[instrument(skip(self))]
    pub async fn check_expired_events(&self, now: DateTime<Utc>) -> ParkingResult<Vec<Session>> {
        let expired = self.sessions.expire_due(now).await?;
        if !expired.is_empty() {
            info!(count = expired.len(), "Finished expired sessions");
        }
        Ok(expired)
    }

    /// Alert every ON_GOING session whose reminder time has come.
    ///
    /// One reminder per flipped session; a failed enqueue is logged and
    /// not retried on the next pass.
    #[instrument(skip(self))]
    pub async fn check_ongoing_events(&self, now: DateTime<Utc>) -> ParkingResult<AlertScan> {
        let alerted = self.sessions.alert_due(now).await?;
        let mut scan = AlertScan {
            alerted: alerted.len(),
            enqueued: 0,
        };

        for session in &alerted {
            match self.notifications.enqueue(ReminderTask::for_session(session)) {
                Ok(()) => {
                    debug!(session_id = %session.id, "Queued expiration reminder");
                    scan.enqueued += 1;
                }
                Err(e) => {
                    error!(session_id = %session.id, error = %e, "Could not queue reminder");
                }
            }
        }

        if scan.alerted > 0 {
            info!(alerted = scan.alerted, enqueued = scan.enqueued, "Alerted sessions");
        }
        Ok(scan)
    }

    /// Set or cancel (`alert_before_minutes = 0`) a session reminder.
    #[instrument(skip(self))]
    pub async fn set_reminder(
        &self,
        user_id: &str,
        session_id: Uuid,
        alert_before_minutes: u32,
        now: DateTime<Utc>,
    ) -> ParkingResult<Session> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .filter(|s| s.is_owned_by(user_id))
            .ok_or_else(|| ParkingError::not_found("session", session_id))?;

        if alert_before_minutes != 0 && session.remaining(now) < self.min_buffer {
            return Err(ParkingError::Validation(format!(
                "session {} ends in less than {} minutes; reminder not accepted",
                session_id,
                self.min_buffer.num_minutes()
            )));
        }

        let at = alert_at(session.stop_time_utc, alert_before_minutes);
        self.sessions
            .update_reminder(session_id, user_id, alert_before_minutes, at)
            .await
    }
}
