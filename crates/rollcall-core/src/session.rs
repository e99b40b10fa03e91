use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// The half of the day an attendance event belongs to.
///
/// A person is recorded at most once per session per calendar day, so
/// this is part of the ledger's uniqueness key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    Morning,
    Evening,
}

impl Session {
    /// Classify a timestamp: Morning before noon, Evening from 12:00:00
    /// onward. Total over all 24 hours.
    pub fn classify<Tz: TimeZone>(now: &DateTime<Tz>) -> Session {
        if now.hour() < 12 {
            Session::Morning
        } else {
            Session::Evening
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Morning => write!(f, "Morning"),
            Session::Evening => write!(f, "Evening"),
        }
    }
}
