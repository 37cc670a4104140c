//! Webhook event types
//!
//! Inbound webhook bodies carry no explicit event name, so the event is
//! inferred from which fields are present.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Kind of a job completion notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EmailFinderComplete,
    EmailValidationComplete,
    ExtractionComplete,
    Unknown,
}

impl EventType {
    /// Classifies a webhook payload
    ///
    /// `job_type` wins when present; otherwise an extraction is recognized by
    /// a truthy `extraction_type` or `url` field.
    pub fn classify(payload: &Value) -> Self {
        match payload.get("job_type").and_then(Value::as_str) {
            Some("email_finder") => return EventType::EmailFinderComplete,
            Some("email_validation") => return EventType::EmailValidationComplete,
            _ => {}
        }

        if is_truthy(payload.get("extraction_type")) || is_truthy(payload.get("url")) {
            return EventType::ExtractionComplete;
        }

        EventType::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::EmailFinderComplete => "email_finder_complete",
            EventType::EmailValidationComplete => "email_validation_complete",
            EventType::ExtractionComplete => "extraction_complete",
            EventType::Unknown => "unknown",
        }
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_finder_complete" => Ok(EventType::EmailFinderComplete),
            "email_validation_complete" => Ok(EventType::EmailValidationComplete),
            "extraction_complete" => Ok(EventType::ExtractionComplete),
            other => Err(format!("unknown webhook event '{}'", other)),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
