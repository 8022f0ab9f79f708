//! Directory user records.

use serde::{Deserialize, Serialize};

use crate::{PayloadError, UserId};

/// A user as listed by the directory.
///
/// The backend returns richer records (birth date, contact details, ...);
/// only the fields the session needs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Directory-assigned id.
    #[serde(deserialize_with = "super::user_id")]
    pub id: UserId,
    /// Given name.
    #[serde(default)]
    pub name: String,
    /// Family name.
    #[serde(default)]
    pub surname: String,
}

impl UserRecord {
    /// Create a record.
    pub fn new(id: UserId, name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self { id, name: name.into(), surname: surname.into() }
    }

    /// Name shown in the roster.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }

    /// Decode a single record.
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode a JSON array of records.
    pub fn list_from_json(raw: &str) -> Result<Vec<Self>, PayloadError> {
        Ok(serde_json::from_str(raw)?)
    }
}
