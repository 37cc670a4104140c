//! Job DTOs for communication with the Evaboot API

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;
use crate::domain::resource::Resource;

/// Body of a job creation request
///
/// Serializes to the bare resource-specific body the API expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CreateJobRequest {
    EmailFinder(FindEmail),
    EmailValidation(ValidateEmail),
    LinkedinExtraction(ExtractLinkedin),
}

impl CreateJobRequest {
    /// Resource whose collection receives the request
    pub fn resource(&self) -> Resource {
        match self {
            CreateJobRequest::EmailFinder(_) => Resource::EmailFinder,
            CreateJobRequest::EmailValidation(_) => Resource::EmailValidation,
            CreateJobRequest::LinkedinExtraction(_) => Resource::LinkedinExtractions,
        }
    }
}

/// Find the professional email of a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindEmail {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_domain: Option<String>,
}

impl FindEmail {
    /// An empty company domain is treated as absent
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        company_name: impl Into<String>,
        company_domain: Option<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            company_name: company_name.into(),
            company_domain: company_domain.filter(|domain| !domain.trim().is_empty()),
        }
    }
}

/// Validate a single email address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateEmail {
    pub email: String,
}

/// Extract leads from a LinkedIn Sales Navigator search or profile URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractLinkedin {
    pub url: String,
}

/// Response of a list endpoint
///
/// The API answers either with a bare array or with a paginated object.
/// An object without `results` is read as an empty page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobList<T> {
    Bare(Vec<T>),
    Paged {
        #[serde(default = "Vec::new")]
        results: Vec<T>,
    },
}

impl<T> JobList<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            JobList::Bare(items) => items,
            JobList::Paged { results } => results,
        }
    }
}

/// Reduced record returned by a finished wait when the full payload is not wanted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitSummary {
    pub job_id: String,
    pub status: JobStatus,
    /// Milliseconds spent waiting
    pub wait_time: u64,
}
