//! Maintenance request model.
//!
//! # Invariants
//! - `status` is never blank; new requests start as [`RequestStatus::Open`].
//! - `updated_at` stays `None` until the first status change.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type RequestId = i64;

/// Request state label.
///
/// Only `open` is fixed by the store; the presentation layer may use any
/// other non-blank label, kept verbatim in [`RequestStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestStatus {
    Open,
    InProgress,
    Closed,
    Other(String),
}

impl RequestStatus {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim() {
            "" => Err(ValidationError::EmptyField("status")),
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Ok(Self::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RequestStatus> for String {
    fn from(value: RequestStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Resident submission input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRequest {
    pub requester_name: Option<String>,
    pub request_type: String,
    pub description: String,
    pub room: Option<String>,
}

impl NewRequest {
    pub fn new(request_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            request_type: request_type.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn requester(mut self, name: impl Into<String>) -> Self {
        self.requester_name = Some(name.into());
        self
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }
}

/// Stored maintenance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub requester_name: Option<String>,
    pub request_type: String,
    pub description: Option<String>,
    pub room: Option<String>,
    pub status: RequestStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
