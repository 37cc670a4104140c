//! Job domain types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

/// Snapshot of a remote Evaboot job
///
/// The remote service owns the job; this is only what one fetch observed.
/// The payload is kept exactly as received and is what callers get back.
/// The typed fields are a read-only view parsed out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: String,
    status: JobStatus,
    error_message: Option<String>,
    created_at: Option<DateTime<Utc>>,
    payload: Value,
}

/// Why a payload could not be read as a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobDecodeError {
    NotAnObject,
    MissingId,
}

impl std::fmt::Display for JobDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobDecodeError::NotAnObject => f.write_str("job payload is not a JSON object"),
            JobDecodeError::MissingId => f.write_str("job payload has no usable id"),
        }
    }
}

impl std::error::Error for JobDecodeError {}

impl Job {
    /// Creates a bare job snapshot with the given ID and status
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        let id = id.into();
        let payload = json!({ "id": id.clone(), "status": status.as_str() });
        Self {
            id,
            status,
            error_message: None,
            created_at: None,
            payload,
        }
    }

    /// Reads the typed view out of a raw payload, keeping the payload as is
    ///
    /// Only the ID is required. A missing or null status reads as pending,
    /// and a non-string one is kept verbatim as an unknown status.
    pub fn from_payload(payload: Value) -> Result<Self, JobDecodeError> {
        let Value::Object(fields) = &payload else {
            return Err(JobDecodeError::NotAnObject);
        };

        // The API is not consistent about ID types; numbers are normalized to strings
        let id = match fields.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(JobDecodeError::MissingId),
        };
        let status = match fields.get("status") {
            None | Some(Value::Null) => JobStatus::Pending,
            Some(Value::String(status)) => JobStatus::from(status.as_str()),
            Some(other) => JobStatus::Other(other.to_string()),
        };
        let error_message = fields
            .get("error_message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let created_at = fields
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        Ok(Self {
            id,
            status,
            error_message,
            created_at,
            payload,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// A field of the payload as received
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Error message reported by the remote service, or a generic one
    pub fn failure_message(&self) -> &str {
        match self.error_message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => "Unknown error",
        }
    }
}

impl From<Job> for Value {
    fn from(job: Job) -> Self {
        job.payload
    }
}

impl Serialize for Job {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Job {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = Value::deserialize(deserializer)?;
        Job::from_payload(payload).map_err(D::Error::custom)
    }
}

/// Timestamps without an offset are taken as UTC; unparseable ones are dropped.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Remote job status
///
/// Values the service may add later are preserved in `Other` and treated as
/// still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Failed,
    Cancelled,
    Other(String),
}

/// Coarse classification of a status for convergence loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The job finished successfully
    Complete,
    /// The job reached a terminal failure (failed or cancelled)
    Failed,
    /// Anything else, including statuses this crate does not know
    InFlight,
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Other(status) => status,
        }
    }

    pub fn classify(&self) -> StatusClass {
        match self {
            JobStatus::Complete => StatusClass::Complete,
            JobStatus::Failed | JobStatus::Cancelled => StatusClass::Failed,
            _ => StatusClass::InFlight,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.classify() != StatusClass::InFlight
    }
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "complete" => JobStatus::Complete,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Other(status),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(status: &str) -> Self {
        JobStatus::from(status.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SecondsFormat;

    #[test]
    fn test_status_classification() {
        assert_eq!(JobStatus::Complete.classify(), StatusClass::Complete);
        assert_eq!(JobStatus::Failed.classify(), StatusClass::Failed);
        assert_eq!(JobStatus::Cancelled.classify(), StatusClass::Failed);
        assert_eq!(JobStatus::Pending.classify(), StatusClass::InFlight);
        assert_eq!(JobStatus::Processing.classify(), StatusClass::InFlight);
        assert_eq!(
            JobStatus::from("queued_for_review").classify(),
            StatusClass::InFlight
        );
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = JobStatus::from("enriching");
        assert_eq!(status, JobStatus::Other("enriching".to_string()));
        assert_eq!(String::from(status), "enriching");
    }

    #[test]
    fn test_job_deserializes_with_extra_fields() {
        let job: Job = serde_json::from_value(json!({
            "id": "j1",
            "status": "complete",
            "created_at": "2025-03-01T10:00:00Z",
            "value": 42
        }))
        .unwrap();

        assert_eq!(job.id(), "j1");
        assert_eq!(job.status(), &JobStatus::Complete);
        assert!(job.created_at().is_some());
        assert_eq!(job.get("value"), Some(&json!(42)));
    }

    #[test]
    fn test_naive_timestamp_is_taken_as_utc() {
        let job: Job = serde_json::from_value(json!({
            "id": "j1",
            "created_at": "2025-03-01T10:00:00.250"
        }))
        .unwrap();

        assert_eq!(
            job.created_at()
                .unwrap()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            "2025-03-01T10:00:00.250Z"
        );
    }

    #[test]
    fn test_job_numeric_id_is_normalized() {
        let job: Job = serde_json::from_value(json!({"id": 1234, "status": "pending"})).unwrap();
        assert_eq!(job.id(), "1234");
    }

    #[test]
    fn test_job_missing_status_defaults_to_pending() {
        let job: Job = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(job.status(), &JobStatus::Pending);
    }

    #[test]
    fn test_job_null_fields_are_tolerated() {
        let job: Job = serde_json::from_value(json!({
            "id": "x",
            "status": null,
            "error_message": null,
            "created_at": null
        }))
        .unwrap();

        assert_eq!(job.status(), &JobStatus::Pending);
        assert_eq!(job.error_message(), None);
        assert_eq!(job.created_at(), None);
    }

    #[test]
    fn test_job_non_string_status_is_kept_as_unknown() {
        let job = Job::from_payload(json!({"id": "x", "status": 3})).unwrap();
        assert_eq!(job.status(), &JobStatus::Other("3".to_string()));
        assert_eq!(job.status().classify(), StatusClass::InFlight);
    }

    #[test]
    fn test_job_requires_an_id() {
        assert_eq!(
            Job::from_payload(json!({"status": "complete"})),
            Err(JobDecodeError::MissingId)
        );
        assert_eq!(
            Job::from_payload(json!({"id": null})),
            Err(JobDecodeError::MissingId)
        );
        assert_eq!(
            Job::from_payload(json!(["j1"])),
            Err(JobDecodeError::NotAnObject)
        );
        assert!(serde_json::from_value::<Job>(json!({"id": ""})).is_err());
    }

    #[test]
    fn test_failure_message_fallback() {
        let job = Job::new("j2", JobStatus::Failed);
        assert_eq!(job.failure_message(), "Unknown error");

        let job = Job::from_payload(json!({"id": "j2", "status": "failed", "error_message": ""}))
            .unwrap();
        assert_eq!(job.failure_message(), "Unknown error");

        let job = Job::from_payload(
            json!({"id": "j2", "status": "failed", "error_message": "bad input"}),
        )
        .unwrap();
        assert_eq!(job.failure_message(), "bad input");
    }

    #[test]
    fn test_job_into_record_returns_payload_unchanged() {
        let payload = json!({
            "id": 17,
            "status": "complete",
            "error_message": null,
            "created_at": "2025-03-01 10:00:00",
            "value": 42
        });
        let job: Job = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(job.id(), "17");
        assert!(job.created_at().is_some());
        assert_eq!(serde_json::to_value(&job).unwrap(), payload);
        assert_eq!(Value::from(job), payload);
    }

    #[test]
    fn test_job_keeps_unparseable_timestamp_in_payload() {
        let job = Job::from_payload(json!({"id": "j1", "created_at": "yesterday"})).unwrap();
        assert_eq!(job.created_at(), None);
        assert_eq!(Value::from(job)["created_at"], "yesterday");
    }

    #[test]
    fn test_new_job_payload_carries_id_and_status() {
        let record = Value::from(Job::new("j3", JobStatus::from("enriching")));
        assert_eq!(record, json!({"id": "j3", "status": "enriching"}));
    }
}
