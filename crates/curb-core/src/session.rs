//! # Session Types
//!
//! A parking session (event) is a paid occupancy record with a
//! forward-only lifecycle:
//!
//! ```text
//! ON_GOING ──(alert window reached)──▶ ALERTED ──(expired)──▶ FINISHED
//!     └───────────────────(expired)────────────────────────────▲
//! ```

use crate::money::FeeBreakdown;
use crate::quote::{ParkingWindow, Quote};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum time left on a session for a reminder to be accepted
pub const MIN_REMINDER_BUFFER_MINUTES: i64 = 5;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    OnGoing,
    Alerted,
    Finished,
}

impl SessionStatus {
    /// Whether moving from `self` to `next` is a legal forward transition
    pub fn can_advance_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::OnGoing, SessionStatus::Alerted)
                | (SessionStatus::OnGoing, SessionStatus::Finished)
                | (SessionStatus::Alerted, SessionStatus::Finished)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::OnGoing => "ON_GOING",
            SessionStatus::Alerted => "ALERTED",
            SessionStatus::Finished => "FINISHED",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle being parked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// License plate
    pub plate: String,
    /// Issuing state/province
    pub state: String,
}

impl Vehicle {
    pub fn new(plate: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            plate: plate.into().trim().to_uppercase(),
            state: state.into().trim().to_uppercase(),
        }
    }
}

/// A paid parking session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub quote_id: Uuid,
    pub zone: String,
    pub zone_lat: Option<f64>,
    pub zone_lng: Option<f64>,
    pub vehicle_plate: String,
    pub vehicle_state: String,
    pub payment_method: String,
    /// Vendor confirmation, immutable once set
    pub vendor_confirmation_id: String,
    pub status: SessionStatus,
    pub start_time_utc: DateTime<Utc>,
    pub stop_time_utc: DateTime<Utc>,
    /// 0 means no reminder
    pub alert_before_minutes: u32,
    /// `None` iff `alert_before_minutes == 0`
    pub alert_at_utc: Option<DateTime<Utc>>,
    pub fees: FeeBreakdown,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to persist a freshly activated session
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub user_id: &'a str,
    pub quote: &'a Quote,
    pub vehicle: &'a Vehicle,
    pub payment_method: &'a str,
    pub vendor_confirmation_id: String,
    /// Vendor-authoritative billing window
    pub window: ParkingWindow,
    pub fees: FeeBreakdown,
}

impl Session {
    /// Create an ON_GOING session with no reminder
    pub fn start(new: NewSession<'_>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id.to_string(),
            quote_id: new.quote.id,
            zone: new.quote.zone.clone(),
            zone_lat: new.quote.zone_location.map(|p| p.lat),
            zone_lng: new.quote.zone_location.map(|p| p.lng),
            vehicle_plate: new.vehicle.plate.clone(),
            vehicle_state: new.vehicle.state.clone(),
            payment_method: new.payment_method.to_string(),
            vendor_confirmation_id: new.vendor_confirmation_id,
            status: SessionStatus::OnGoing,
            start_time_utc: new.window.start,
            stop_time_utc: new.window.end,
            alert_before_minutes: 0,
            alert_at_utc: None,
            fees: new.fees,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Time remaining before expiry, relative to `now`
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.stop_time_utc - now
    }
}

/// Alert timestamp for a reminder `minutes` before `stop`; `None` disables it
pub fn alert_at(stop: DateTime<Utc>, minutes: u32) -> Option<DateTime<Utc>> {
    if minutes == 0 {
        None
    } else {
        Some(stop - Duration::minutes(i64::from(minutes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only_transitions() {
        use SessionStatus::*;
        assert!(OnGoing.can_advance_to(Alerted));
        assert!(OnGoing.can_advance_to(Finished));
        assert!(Alerted.can_advance_to(Finished));
        assert!(!Alerted.can_advance_to(OnGoing));
        assert!(!Finished.can_advance_to(OnGoing));
        assert!(!Finished.can_advance_to(Alerted));
        assert!(!OnGoing.can_advance_to(OnGoing));
        assert!(Finished.is_terminal());
    }

    #[test]
    fn test_alert_at() {
        let stop = Utc::now();
        assert_eq!(alert_at(stop, 0), None);
        assert_eq!(alert_at(stop, 10), Some(stop - Duration::minutes(10)));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::OnGoing).unwrap();
        assert_eq!(json, "\"ON_GOING\"");
    }

    #[test]
    fn test_vehicle_normalized() {
        let v = Vehicle::new(" abc123 ", "tx");
        assert_eq!(v.plate, "ABC123");
        assert_eq!(v.state, "TX");
    }
}
