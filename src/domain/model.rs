use crate::utils::error::{RegoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Placeholder used for vehicle fields a site did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// States and territories with an online registration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuState {
    Act,
    Nsw,
    Qld,
    Sa,
    Vic,
    Tas,
}

impl AuState {
    pub const ALL: [AuState; 6] = [
        AuState::Act,
        AuState::Nsw,
        AuState::Qld,
        AuState::Sa,
        AuState::Vic,
        AuState::Tas,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AuState::Act => "ACT",
            AuState::Nsw => "NSW",
            AuState::Qld => "QLD",
            AuState::Sa => "SA",
            AuState::Vic => "VIC",
            AuState::Tas => "TAS",
        }
    }
}

impl fmt::Display for AuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AuState {
    type Err = RegoError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        AuState::ALL
            .iter()
            .copied()
            .find(|state| state.code() == code)
            .ok_or_else(|| RegoError::ValidationError {
                message: format!("State \"{}\" is not supported.", code),
            })
    }
}

/// A registration plate, trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    pub fn parse(raw: &str) -> Result<Self> {
        let plate = raw.trim().to_uppercase();
        if plate.is_empty() {
            return Err(RegoError::ValidationError {
                message: "Plate number cannot be empty.".to_string(),
            });
        }
        if !plate.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RegoError::ValidationError {
                message: "Plate number should only contain letters and numbers.".to_string(),
            });
        }
        Ok(Self(plate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegoStatus {
    Registered,
    Suspended,
    Unregistered,
    Invalid,
    Unknown,
    Error,
    Timeout,
    /// Any other status a site reports verbatim (e.g. "cancelled").
    Other(String),
}

impl RegoStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RegoStatus::Registered => "registered",
            RegoStatus::Suspended => "suspended",
            RegoStatus::Unregistered => "unregistered",
            RegoStatus::Invalid => "invalid",
            RegoStatus::Unknown => "unknown",
            RegoStatus::Error => "error",
            RegoStatus::Timeout => "timeout",
            RegoStatus::Other(s) => s.as_str(),
        }
    }

    pub fn from_site_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "registered" => RegoStatus::Registered,
            "suspended" => RegoStatus::Suspended,
            "unregistered" => RegoStatus::Unregistered,
            "invalid" => RegoStatus::Invalid,
            "unknown" => RegoStatus::Unknown,
            "error" => RegoStatus::Error,
            "timeout" => RegoStatus::Timeout,
            "n/a" | "" => RegoStatus::Unknown,
            other => RegoStatus::Other(other.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RegoStatus::Error | RegoStatus::Timeout)
    }
}

impl fmt::Display for RegoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegoStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegoStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(RegoStatus::from_site_text(&text))
    }
}

/// What a lookup found out about a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub status: RegoStatus,
    pub make: String,
    pub model: String,
    pub colour: String,
    pub year: String,
    pub error: Option<String>,
}

impl Default for VehicleInfo {
    fn default() -> Self {
        Self {
            status: RegoStatus::Unknown,
            make: NOT_AVAILABLE.to_string(),
            model: NOT_AVAILABLE.to_string(),
            colour: NOT_AVAILABLE.to_string(),
            year: NOT_AVAILABLE.to_string(),
            error: None,
        }
    }
}

impl VehicleInfo {
    pub fn with_status(status: RegoStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn failed(status: RegoStatus, note: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.error = Some(note.into());
        self
    }

    /// Copies the non-empty fields of `details` over this record.
    pub fn merge_details(&mut self, details: VehicleDetails) {
        fn take(slot: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                *slot = v.trim().to_string();
            }
        }
        take(&mut self.make, details.make);
        take(&mut self.model, details.model);
        take(&mut self.colour, details.colour);
        take(&mut self.year, details.year);
    }

    pub fn has_details(&self) -> bool {
        [&self.make, &self.model, &self.colour, &self.year]
            .iter()
            .any(|v| v.as_str() != NOT_AVAILABLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleDetails {
    pub make: Option<String>,
    pub model: Option<String>,
    pub colour: Option<String>,
    pub year: Option<String>,
}

impl VehicleDetails {
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none() && self.colour.is_none() && self.year.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub state: AuState,
    pub plate: String,
    #[serde(flatten)]
    pub info: VehicleInfo,
    pub checked_at: DateTime<Utc>,
}

impl CheckOutcome {
    pub fn new(state: AuState, plate: impl Into<String>, info: VehicleInfo) -> Self {
        Self {
            state,
            plate: plate.into(),
            info,
            checked_at: Utc::now(),
        }
    }
}
