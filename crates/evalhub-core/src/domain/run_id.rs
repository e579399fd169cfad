//! Run identifier shared by every artifact written during one publish session.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::domain::error::{EvalHubError, Result};

/// Timestamp format used in artifact filenames: ISO-8601 with `:` replaced
/// by `-` and a fixed-width fractional part, so string order is time order.
const RUN_ID_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6f";

/// Identifier of one evaluation run, embedded in every artifact filename.
///
/// Created once at the start of a publish session and passed explicitly to
/// every naming and publishing call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Run id for the current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Run id for an explicit point in time.
    pub fn from_datetime<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        RunId(at.format(RUN_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RunId {
    type Error = EvalHubError;

    fn try_from(value: String) -> Result<Self> {
        let reason = if value.is_empty() {
            Some("must not be empty")
        } else if value.contains('_') {
            Some("must not contain '_' (it delimits task names in sample filenames)")
        } else if value.contains(':') {
            Some("must not contain ':'")
        } else if value.contains('/') || value.chars().any(char::is_whitespace) {
            Some("must not contain '/' or whitespace")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(EvalHubError::InvalidRunId {
                value,
                reason: reason.to_string(),
            }),
            None => Ok(RunId(value)),
        }
    }
}

impl TryFrom<&str> for RunId {
    type Error = EvalHubError;

    fn try_from(value: &str) -> Result<Self> {
        RunId::try_from(value.to_string())
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
