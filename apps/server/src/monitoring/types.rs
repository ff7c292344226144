use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock format used for observation timestamps, second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reachability of a device as seen by a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Up,
    Down,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Up => write!(f, "UP"),
            DeviceStatus::Down => write!(f, "DOWN"),
        }
    }
}

impl FromStr for DeviceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(DeviceStatus::Up),
            "DOWN" => Ok(DeviceStatus::Down),
            other => Err(anyhow!("unknown device status: {other}")),
        }
    }
}

/// One timestamped probe result for one device.
///
/// Created by a device monitor at the moment a probe completes and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub device_name: String,
    pub address: String,
    pub status: DeviceStatus,
}

impl Observation {
    /// Create an observation stamped with the current local time.
    pub fn now(
        device_name: impl Into<String>,
        address: impl Into<String>,
        status: DeviceStatus,
    ) -> Self {
        let now = Local::now().naive_local();

        Self {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            device_name: device_name.into(),
            address: address.into(),
            status,
        }
    }

    /// Timestamp as milliseconds since the Unix epoch, for watermark
    /// comparisons. Falls back to a UTC reading for local times that do
    /// not exist (DST gaps).
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp
            .and_local_timezone(Local)
            .earliest()
            .map_or_else(|| self.timestamp.and_utc().timestamp_millis(), |dt| dt.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display() {
        assert_eq!("UP".parse::<DeviceStatus>().unwrap(), DeviceStatus::Up);
        assert_eq!("down".parse::<DeviceStatus>().unwrap(), DeviceStatus::Down);
        assert_eq!(DeviceStatus::Up.to_string(), "UP");
        assert!("flapping".parse::<DeviceStatus>().is_err());
    }

    #[test]
    fn observation_timestamp_has_second_resolution() {
        let observation = Observation::now("Router", "10.0.0.1", DeviceStatus::Up);
        assert_eq!(observation.timestamp.nanosecond(), 0);
    }
}
