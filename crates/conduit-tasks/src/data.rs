//! Task records and outcomes.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Lifecycle state of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Submitted, not finished yet.
    New,
    /// Finished with a result.
    EndedOk,
    /// Finished with an error, or panicked.
    EndedError,
}

impl TaskState {
    /// Numeric code of the state.
    pub const fn code(self) -> u16 {
        match self {
            Self::New => 0,
            Self::EndedOk => 200,
            Self::EndedError => 400,
        }
    }

    /// Parses a numeric state code.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::New),
            200 => Some(Self::EndedOk),
            400 => Some(Self::EndedError),
            _ => None,
        }
    }

    /// Whether the task has finished.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::New)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::EndedOk => write!(f, "ENDED_OK"),
            Self::EndedError => write!(f, "ENDED_ERROR"),
        }
    }
}

/// What a task body reports when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncTaskOutcome {
    /// Success, with an optional result payload.
    Ok(Option<String>),
    /// Failure, with an optional error payload.
    Error(Option<String>),
}

impl AsyncTaskOutcome {
    /// Success carrying `payload`.
    pub fn ok(payload: impl Into<String>) -> Self {
        Self::Ok(Some(payload.into()))
    }

    /// Failure carrying `payload`.
    pub fn error(payload: impl Into<String>) -> Self {
        Self::Error(Some(payload.into()))
    }

    pub(crate) fn into_parts(self) -> (TaskState, Option<String>) {
        match self {
            Self::Ok(payload) => (TaskState::EndedOk, payload),
            Self::Error(payload) => (TaskState::EndedError, payload),
        }
    }
}

/// Snapshot of a task as stored by the manager.
///
/// Records are immutable: finishing a task replaces the stored record
/// with a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsyncTaskData {
    /// Sequential task id.
    pub id: u64,
    /// Current state.
    pub state: TaskState,
    /// When the task was submitted.
    pub created_at: DateTime<Utc>,
    /// How long the record is kept after submission.
    #[serde(rename = "ttl_ms", serialize_with = "serialize_millis")]
    pub ttl: Duration,
    /// Result or error payload, once finished.
    pub payload: Option<String>,
    /// Opaque token required to read or acknowledge the task.
    pub token: String,
}

impl AsyncTaskData {
    pub(crate) fn new(id: u64, created_at: DateTime<Utc>, ttl: Duration, token: String) -> Self {
        Self {
            id,
            state: TaskState::New,
            created_at,
            ttl,
            payload: None,
            token,
        }
    }

    /// A copy of this record in `state` carrying `payload`.
    #[must_use]
    pub fn finished(&self, state: TaskState, payload: Option<String>) -> Self {
        Self {
            state,
            payload,
            token: self.token.clone(),
            ..*self
        }
    }

    /// The instant after which the record may be swept, or `None` if the
    /// TTL is too large to represent.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
    }

    /// Whether the TTL has elapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|deadline| deadline < now)
    }
}

fn serialize_millis<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> AsyncTaskData {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        AsyncTaskData::new(7, created, Duration::from_secs(300), "tok".to_string())
    }

    #[test]
    fn test_state_codes() {
        for state in [TaskState::New, TaskState::EndedOk, TaskState::EndedError] {
            assert_eq!(TaskState::from_code(state.code()), Some(state));
        }
        assert_eq!(TaskState::EndedOk.code(), 200);
        assert_eq!(TaskState::from_code(1), None);
        assert!(!TaskState::New.is_terminal());
        assert!(TaskState::EndedError.is_terminal());
        assert_eq!(TaskState::EndedError.to_string(), "ENDED_ERROR");
    }

    #[test]
    fn test_finished_replaces_state_and_payload() {
        let data = record();
        let done = data.finished(TaskState::EndedOk, Some("42".to_string()));

        assert_eq!(done.id, data.id);
        assert_eq!(done.token, data.token);
        assert_eq!(done.created_at, data.created_at);
        assert_eq!(done.state, TaskState::EndedOk);
        assert_eq!(done.payload.as_deref(), Some("42"));
        assert_eq!(data.state, TaskState::New);
    }

    #[test]
    fn test_expiry_is_strict() {
        let data = record();
        let deadline = data.expires_at().unwrap();

        assert!(!data.is_expired(deadline));
        assert!(data.is_expired(deadline + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let mut data = record();
        data.ttl = Duration::MAX;
        assert_eq!(data.expires_at(), None);
        assert!(!data.is_expired(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn test_outcome_into_parts() {
        assert_eq!(
            AsyncTaskOutcome::ok("done").into_parts(),
            (TaskState::EndedOk, Some("done".to_string()))
        );
        assert_eq!(
            AsyncTaskOutcome::Error(None).into_parts(),
            (TaskState::EndedError, None)
        );
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["state"], "NEW");
        assert_eq!(json["ttl_ms"], 300_000);
        assert_eq!(json["payload"], serde_json::Value::Null);
        assert_eq!(json["token"], "tok");
    }
}
