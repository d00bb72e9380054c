//! Per-run configuration
//!
//! Loaded from declarative JSON; every field has a default so partial
//! configs are fine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attach a health tracker to every live pawn once per simulated day.
    pub auto_track_all_pawns: bool,
    /// Emit low-frequency scheduler diagnostics.
    pub cheap_logging: bool,
    /// Dev-only divisor on event intervals; 1 = real time. Diagnostics only
    /// engage above 1000.
    pub dev_event_time_acceleration: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_track_all_pawns: false,
            cheap_logging: false,
            dev_event_time_acceleration: 1,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Settings, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Acceleration, guarded against a zero in config data.
    pub fn acceleration(&self) -> u64 {
        u64::from(self.dev_event_time_acceleration.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(!s.auto_track_all_pawns);
        assert_eq!(s.acceleration(), 1);
    }

    #[test]
    fn test_partial_json() {
        let s = Settings::from_json(r#"{ "auto_track_all_pawns": true }"#).unwrap();
        assert!(s.auto_track_all_pawns);
        assert_eq!(s.dev_event_time_acceleration, 1);
    }

    #[test]
    fn test_zero_acceleration_guard() {
        let s = Settings::from_json(r#"{ "dev_event_time_acceleration": 0 }"#).unwrap();
        assert_eq!(s.acceleration(), 1);
    }
}
