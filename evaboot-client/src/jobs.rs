//! Job-related API endpoints

use chrono::{DateTime, SecondsFormat, Utc};
use evaboot_core::domain::job::Job;
use evaboot_core::domain::resource::Resource;
use evaboot_core::dto::job::{CreateJobRequest, JobList};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::EvabootClient;
use crate::error::{ClientError, Result};
use crate::operation::{Operation, validate_job_id};

impl EvabootClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Create a new job
    ///
    /// # Arguments
    /// * `req` - The resource-specific creation request
    ///
    /// # Returns
    /// The created job, usually still pending
    ///
    /// # Example
    /// ```no_run
    /// # use evaboot_client::{Credentials, EvabootClient};
    /// # use evaboot_core::dto::job::{CreateJobRequest, ValidateEmail};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = EvabootClient::new(Credentials::new("my-token"));
    /// let job = client.create_job(CreateJobRequest::EmailValidation(ValidateEmail {
    ///     email: "ada@engines.example".to_string(),
    /// })).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_job(&self, req: CreateJobRequest) -> Result<Job> {
        let path = req.resource().collection_path();
        let response = self.request(Method::POST, path).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    ///
    /// # Arguments
    /// * `resource` - The resource the job belongs to
    /// * `job_id` - The job ID
    pub async fn get_job(&self, resource: Resource, job_id: &str) -> Result<Job> {
        let path = resource.job_path(validate_job_id(job_id)?);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// List all jobs of a resource
    pub async fn list_jobs(&self, resource: Resource) -> Result<Vec<Job>> {
        let response = self
            .request(Method::GET, resource.collection_path())
            .send()
            .await?;

        let list: JobList<Value> = self.handle_response(response).await?;
        Ok(decode_jobs(list.into_vec()))
    }

    /// List jobs created at or after `since`, newest first
    ///
    /// # Arguments
    /// * `resource` - The resource whose jobs are listed
    /// * `since` - Lower bound sent as `created_at__gte`
    pub async fn list_jobs_since(
        &self,
        resource: Resource,
        since: DateTime<Utc>,
    ) -> Result<Vec<Job>> {
        let response = self.list_since_request(resource, since).send().await?;

        let list: JobList<Value> = self.handle_response(response).await?;
        let jobs = decode_jobs(list.into_vec());
        debug!(
            "Listed {} {} job(s) created since {}",
            jobs.len(),
            resource,
            since
        );
        Ok(jobs)
    }

    pub(crate) fn list_since_request(
        &self,
        resource: Resource,
        since: DateTime<Utc>,
    ) -> RequestBuilder {
        self.request(Method::GET, resource.collection_path())
            .query(&[
                (
                    "created_at__gte",
                    since.to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
                ("ordering", "-created_at".to_string()),
            ])
    }

    // =============================================================================
    // Generic Dispatch
    // =============================================================================

    /// Execute an [`Operation`] and return its response as JSON records
    ///
    /// Array responses are flattened into one record per element, and list
    /// responses are unwrapped from their pagination envelope.
    pub async fn execute(&self, operation: &Operation) -> Result<Vec<Value>> {
        let route = operation.route()?;
        debug!("{} {} ({})", route.method, route.path, operation.name());

        let mut request = self.request(route.method, &route.path);
        if let Some(body) = &route.body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let body: Value = self.handle_response(response).await?;
        into_records(operation, body)
    }
}

/// Reads list elements one by one; an element that is not a job is skipped
fn decode_jobs(items: Vec<Value>) -> Vec<Job> {
    items
        .into_iter()
        .filter_map(|item| match Job::from_payload(item) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!("Skipping list element: {}", e);
                None
            }
        })
        .collect()
}

/// Shapes a decoded response body into the records an operation returns
pub(crate) fn into_records(operation: &Operation, body: Value) -> Result<Vec<Value>> {
    if let Operation::List { .. } = operation {
        let list: JobList<Value> = serde_json::from_value(body)
            .map_err(|e| ClientError::ParseError(format!("Malformed job list: {}", e)))?;
        return Ok(list.into_vec());
    }

    match body {
        Value::Array(items) => Ok(items),
        record => Ok(vec![record]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use chrono::TimeZone;
    use evaboot_core::domain::job::JobStatus;
    use serde_json::json;

    #[test]
    fn test_list_since_query() {
        let client =
            EvabootClient::with_base_url("https://api.evaboot.test", Credentials::new("secret"));
        let since = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

        let request = client
            .list_since_request(Resource::EmailValidation, since)
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/v1/email-validation/");
        let query: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            vec![
                (
                    "created_at__gte".to_string(),
                    "2025-03-01T09:30:00.000Z".to_string()
                ),
                ("ordering".to_string(), "-created_at".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_jobs_skips_bad_elements() {
        let jobs = decode_jobs(vec![
            json!({"id": "a", "status": "complete"}),
            json!({"id": "b", "status": null}),
            json!({"status": "complete"}),
            json!("c"),
            json!({"id": 7, "status": "failed", "error_message": "bad input"}),
        ]);

        let seen: Vec<(&str, &JobStatus)> =
            jobs.iter().map(|job| (job.id(), job.status())).collect();
        assert_eq!(
            seen,
            vec![
                ("a", &JobStatus::Complete),
                ("b", &JobStatus::Pending),
                ("7", &JobStatus::Failed),
            ]
        );
    }

    fn get(id: &str) -> Operation {
        Operation::Get {
            resource: Resource::EmailFinder,
            job_id: id.to_string(),
        }
    }

    fn list() -> Operation {
        Operation::List {
            resource: Resource::EmailFinder,
        }
    }

    #[test]
    fn test_into_records_flattens_arrays() {
        let records = into_records(&get("j1"), json!([{"id": "a"}, {"id": "b"}])).unwrap();
        assert_eq!(records, vec![json!({"id": "a"}), json!({"id": "b"})]);
    }

    #[test]
    fn test_into_records_wraps_single_record() {
        let records = into_records(&get("j1"), json!({"id": "j1", "status": "pending"})).unwrap();
        assert_eq!(records, vec![json!({"id": "j1", "status": "pending"})]);
    }

    #[test]
    fn test_into_records_unwraps_list_envelope() {
        let records = into_records(
            &list(),
            json!({"count": 2, "next": null, "results": [{"id": "a"}, {"id": "b"}]}),
        )
        .unwrap();
        assert_eq!(records, vec![json!({"id": "a"}), json!({"id": "b"})]);

        let records = into_records(&list(), json!([{"id": "a"}])).unwrap();
        assert_eq!(records, vec![json!({"id": "a"})]);
    }

    #[test]
    fn test_into_records_list_without_results_is_empty() {
        let records = into_records(&list(), json!({"count": 0})).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_into_records_rejects_malformed_list() {
        let result = into_records(&list(), json!("nope"));
        assert!(matches!(result, Err(ClientError::ParseError(_))));
    }
}
