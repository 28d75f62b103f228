use serde::{Deserialize, Serialize};

use super::leader_laps;
use crate::session::Session;

/// Race control track status, as encoded in the timing feed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    Green,
    Yellow,
    SafetyCar,
    Red,
    VscDeployed,
    VscEnding,
}

impl TrackStatus {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(Self::Green),
            '2' => Some(Self::Yellow),
            '4' => Some(Self::SafetyCar),
            '5' => Some(Self::Red),
            '6' => Some(Self::VscDeployed),
            '7' => Some(Self::VscEnding),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::Green => '1',
            Self::Yellow => '2',
            Self::SafetyCar => '4',
            Self::Red => '5',
            Self::VscDeployed => '6',
            Self::VscEnding => '7',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "Green Flag",
            Self::Yellow => "Yellow Flag",
            Self::SafetyCar => "Safety Car",
            Self::Red => "Red Flag",
            Self::VscDeployed => "Virtual Safety Car Deployed",
            Self::VscEnding => "Virtual Safety Car Ending",
        }
    }

    /// Splits a lap's status string (e.g. "124") into statuses, unknown digits are ignored
    pub fn parse_codes(codes: &str) -> Vec<Self> {
        codes.chars().filter_map(Self::from_code).collect()
    }

    /// True only when the whole status string is the safety car code, "24" is a yellow lap
    pub fn is_safety_car(codes: &str) -> bool {
        codes.trim() == "4"
    }

    pub fn is_virtual_safety_car(codes: &str) -> bool {
        matches!(codes.trim(), "6" | "7")
    }

    /// Laps under a full or virtual safety car are not representative for pace
    pub fn is_neutralized(codes: &str) -> bool {
        Self::is_safety_car(codes) || Self::is_virtual_safety_car(codes)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackStatusByLap {
    pub lap_number: u32,
    /// Status codes seen by the race leader on this lap
    pub track_status: Option<String>,
}

impl TrackStatusByLap {
    pub fn statuses(&self) -> Vec<TrackStatus> {
        self.track_status
            .as_deref()
            .map(TrackStatus::parse_codes)
            .unwrap_or_default()
    }

    pub fn is_safety_car(&self) -> bool {
        self.track_status
            .as_deref()
            .is_some_and(TrackStatus::is_safety_car)
    }

    pub fn is_virtual_safety_car(&self) -> bool {
        self.track_status
            .as_deref()
            .is_some_and(TrackStatus::is_virtual_safety_car)
    }
}

/// Track status for each lap of the session, seen from the race leader
pub fn get_track_status_by_lap(session: &Session) -> Vec<TrackStatusByLap> {
    leader_laps(session)
        .into_iter()
        .map(|leader| TrackStatusByLap {
            lap_number: leader.lap.lap_number,
            track_status: leader.lap.track_status.clone(),
        })
        .collect()
}
