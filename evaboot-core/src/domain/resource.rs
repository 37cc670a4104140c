//! Evaboot resource kinds
//!
//! Every resource is a job collection on the API; the resource only decides
//! which endpoint a job lives under.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Job-backed resource exposed by the Evaboot API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    #[default]
    EmailFinder,
    EmailValidation,
    LinkedinExtractions,
}

impl Resource {
    pub const ALL: [Resource; 3] = [
        Resource::EmailFinder,
        Resource::EmailValidation,
        Resource::LinkedinExtractions,
    ];

    /// Canonical name used in configuration and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::EmailFinder => "email-finder",
            Resource::EmailValidation => "email-validation",
            Resource::LinkedinExtractions => "linkedin-extractions",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Resource::EmailFinder => "Email Finder",
            Resource::EmailValidation => "Email Validation",
            Resource::LinkedinExtractions => "LinkedIn Extraction",
        }
    }

    /// Path of the job collection, e.g. `/v1/email-finder/`
    pub fn collection_path(&self) -> &'static str {
        match self {
            Resource::EmailFinder => "/v1/email-finder/",
            Resource::EmailValidation => "/v1/email-validation/",
            Resource::LinkedinExtractions => "/v1/extractions/",
        }
    }

    /// Path of a single job, e.g. `/v1/email-finder/{id}/`
    pub fn job_path(&self, job_id: &str) -> String {
        format!("{}{}/", self.collection_path(), job_id)
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email-finder" | "email_finder" | "emailFinder" => Ok(Resource::EmailFinder),
            "email-validation" | "email_validation" | "emailValidation" => {
                Ok(Resource::EmailValidation)
            }
            "linkedin-extractions" | "linkedin_extractions" | "linkedinExtractions"
            | "extractions" => Ok(Resource::LinkedinExtractions),
            other => Err(format!(
                "unknown resource '{}' (expected email-finder, email-validation or linkedin-extractions)",
                other
            )),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_templates() {
        assert_eq!(Resource::EmailFinder.job_path("abc"), "/v1/email-finder/abc/");
        assert_eq!(
            Resource::EmailValidation.job_path("42"),
            "/v1/email-validation/42/"
        );
        assert_eq!(
            Resource::LinkedinExtractions.collection_path(),
            "/v1/extractions/"
        );
    }

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!("emailFinder".parse::<Resource>(), Ok(Resource::EmailFinder));
        assert_eq!(
            "linkedin-extractions".parse::<Resource>(),
            Ok(Resource::LinkedinExtractions)
        );
        assert!("contacts".parse::<Resource>().is_err());
    }

    #[test]
    fn test_round_trips_through_display() {
        for resource in Resource::ALL {
            assert_eq!(resource.to_string().parse::<Resource>(), Ok(resource));
        }
    }
}
