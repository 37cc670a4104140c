//! Resource/operation dispatch
//!
//! Maps each (resource, operation) pair to the HTTP method, path and body
//! the API expects, so callers never branch on resource themselves.

use evaboot_core::domain::resource::Resource;
use evaboot_core::dto::job::CreateJobRequest;
use reqwest::Method;

use crate::error::{ClientError, Result};

/// A single request against a job collection
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a new job
    Create(CreateJobRequest),
    /// Fetch one job by ID
    Get { resource: Resource, job_id: String },
    /// List the jobs of a resource
    List { resource: Resource },
}

/// Method, path and optional JSON body of an [`Operation`]
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl Operation {
    pub fn resource(&self) -> Resource {
        match self {
            Operation::Create(request) => request.resource(),
            Operation::Get { resource, .. } | Operation::List { resource } => *resource,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Get { .. } => "get",
            Operation::List { .. } => "list",
        }
    }

    /// Resolves the request this operation sends
    pub fn route(&self) -> Result<Route> {
        match self {
            Operation::Create(request) => {
                let body = serde_json::to_value(request).map_err(|e| {
                    ClientError::InvalidRequest(format!("Failed to encode request body: {}", e))
                })?;
                Ok(Route {
                    method: Method::POST,
                    path: request.resource().collection_path().to_string(),
                    body: Some(body),
                })
            }
            Operation::Get { resource, job_id } => Ok(Route {
                method: Method::GET,
                path: resource.job_path(validate_job_id(job_id)?),
                body: None,
            }),
            Operation::List { resource } => Ok(Route {
                method: Method::GET,
                path: resource.collection_path().to_string(),
                body: None,
            }),
        }
    }
}

/// Job IDs are interpolated into paths and must stay a single segment
pub(crate) fn validate_job_id(job_id: &str) -> Result<&str> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return Err(ClientError::InvalidRequest("Job ID is required".to_string()));
    }
    if job_id.contains(['/', '?', '#']) {
        return Err(ClientError::InvalidRequest(format!(
            "Job ID '{}' contains reserved characters",
            job_id
        )));
    }
    Ok(job_id)
}
