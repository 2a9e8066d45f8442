//! # Zone Types
//!
//! Vendor-defined parking zones and their time-block granularity.

use crate::error::{ParkingError, ParkingResult};
use serde::{Deserialize, Serialize};

/// Unit a parking duration is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Returns the vendor wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }

    /// Length of `quantity` units
    pub fn duration(&self, quantity: u32) -> chrono::Duration {
        let quantity = i64::from(quantity);
        match self {
            TimeUnit::Minutes => chrono::Duration::minutes(quantity),
            TimeUnit::Hours => chrono::Duration::hours(quantity),
            TimeUnit::Days => chrono::Duration::days(quantity),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latitude/longitude of a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A purchasable block of time within a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    /// Vendor block identifier
    pub id: i64,
    /// Unit the block's quantities are expressed in
    pub unit: TimeUnit,
    /// Quantities must be a multiple of this
    pub increment: u32,
    /// Largest purchasable quantity
    pub max_quantity: u32,
}

/// Rate line shown to the user (e.g., "$2.00 / hour")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLine {
    pub description: String,
    /// Amount in cents
    pub amount: i64,
    pub unit: TimeUnit,
}

/// Zone rate schedule, normalized so no field is ever missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Vendor zone number
    pub zone: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Always names one of `time_blocks` when any exist
    pub default_time_block_id: i64,
    pub time_blocks: Vec<TimeBlock>,
    pub rates: Vec<RateLine>,
}

impl ZoneInfo {
    /// Replace an unrecognized default block with the vendor's advertised one.
    ///
    /// Falls back to the first advertised block when the advertised default
    /// is not offered in this zone either.
    pub fn normalize_default_block(&mut self, advertised_default: i64) {
        if self.block(self.default_time_block_id).is_some() {
            return;
        }
        self.default_time_block_id = if self.block(advertised_default).is_some() {
            advertised_default
        } else {
            self.time_blocks
                .first()
                .map(|b| b.id)
                .unwrap_or(advertised_default)
        };
    }

    /// Look up a time block by id
    pub fn block(&self, id: i64) -> Option<&TimeBlock> {
        self.time_blocks.iter().find(|b| b.id == id)
    }

    /// Check a requested duration against the zone's granularity
    pub fn validate_duration(
        &self,
        time_unit: TimeUnit,
        time_quantity: u32,
        time_block_id: i64,
    ) -> ParkingResult<&TimeBlock> {
        let block = self.block(time_block_id).ok_or_else(|| {
            ParkingError::Validation(format!(
                "time block {} is not offered in zone {}",
                time_block_id, self.zone
            ))
        })?;

        if block.unit != time_unit {
            return Err(ParkingError::Validation(format!(
                "time block {} is sold in {}, not {}",
                block.id, block.unit, time_unit
            )));
        }

        if time_quantity == 0 {
            return Err(ParkingError::Validation(
                "time quantity must be positive".to_string(),
            ));
        }

        if block.increment > 1 && time_quantity % block.increment != 0 {
            return Err(ParkingError::Validation(format!(
                "time quantity {} must be a multiple of {} {}",
                time_quantity, block.increment, block.unit
            )));
        }

        if block.max_quantity > 0 && time_quantity > block.max_quantity {
            return Err(ParkingError::Validation(format!(
                "time quantity {} exceeds the zone maximum of {} {}",
                time_quantity, block.max_quantity, block.unit
            )));
        }

        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ZoneInfo {
        ZoneInfo {
            zone: "4021".to_string(),
            name: "Main St".to_string(),
            location: None,
            default_time_block_id: 99,
            time_blocks: vec![
                TimeBlock {
                    id: 1,
                    unit: TimeUnit::Minutes,
                    increment: 15,
                    max_quantity: 120,
                },
                TimeBlock {
                    id: 2,
                    unit: TimeUnit::Hours,
                    increment: 1,
                    max_quantity: 10,
                },
            ],
            rates: vec![],
        }
    }

    #[test]
    fn test_normalize_default_block() {
        let mut z = zone();
        z.normalize_default_block(2);
        assert_eq!(z.default_time_block_id, 2);

        let mut z = zone();
        z.normalize_default_block(77);
        assert_eq!(z.default_time_block_id, 1);

        let mut z = zone();
        z.default_time_block_id = 1;
        z.normalize_default_block(2);
        assert_eq!(z.default_time_block_id, 1);
    }

    #[test]
    fn test_validate_duration() {
        let z = zone();
        assert!(z.validate_duration(TimeUnit::Minutes, 45, 1).is_ok());
        assert!(z.validate_duration(TimeUnit::Minutes, 40, 1).is_err());
        assert!(z.validate_duration(TimeUnit::Minutes, 135, 1).is_err());
        assert!(z.validate_duration(TimeUnit::Hours, 2, 1).is_err());
        assert!(z.validate_duration(TimeUnit::Hours, 0, 2).is_err());
        assert!(z.validate_duration(TimeUnit::Hours, 3, 5).is_err());
        assert!(z.validate_duration(TimeUnit::Hours, 3, 2).is_ok());
    }

    #[test]
    fn test_time_unit_duration() {
        assert_eq!(TimeUnit::Hours.duration(2), chrono::Duration::minutes(120));
        assert_eq!(TimeUnit::Days.duration(1), chrono::Duration::hours(24));
    }
}
