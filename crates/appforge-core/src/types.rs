//! Core type definitions for appforge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{AppforgeError, Result};

/// Commit identifier reported when the latest commit cannot be read back
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Round number of an initial build
pub const BUILD_ROUND: u8 = 1;

/// Round number of the single permitted revision
pub const REVISION_ROUND: u8 = 2;

/// Task status as reported by the status endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Processing,
    Completed,
    EvaluationFailed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::EvaluationFailed => write!(f, "evaluation_failed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Task identifier, always `{task}-{round}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(task: &str, round: u8) -> Self {
        Self(format!("{}-{}", task, round))
    }

    /// The id of the round-1 build a revision of `task` depends on
    pub fn build_of(task: &str) -> Self {
        Self::new(task, BUILD_ROUND)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which pipeline an inbound request drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Build,
    Revision,
}

impl RequestKind {
    pub fn expected_round(&self) -> u8 {
        match self {
            Self::Build => BUILD_ROUND,
            Self::Revision => REVISION_ROUND,
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Revision => write!(f, "revision"),
        }
    }
}

/// A named attachment; `url` is usually a `data:` URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Inbound build or revision request
///
/// The secret is accepted on input but never serialized back out, so
/// stored requests can be echoed by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub email: String,
    #[serde(skip_serializing, default)]
    pub secret: String,
    pub task: String,
    pub round: u8,
    pub nonce: String,
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    pub evaluation_url: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Round-1 request
pub type BuildRequest = TaskRequest;

/// Round-2 request
pub type RevisionRequest = TaskRequest;

impl TaskRequest {
    /// Id of the task record this request creates
    pub fn task_id(&self) -> TaskId {
        TaskId::new(&self.task, self.round)
    }

    /// Check the request shape for the given pipeline
    pub fn validate(&self, kind: RequestKind) -> Result<()> {
        if self.round != kind.expected_round() {
            return Err(AppforgeError::Validation(format!(
                "{} requests must use round {}, got {}",
                kind,
                kind.expected_round(),
                self.round
            )));
        }

        for (field, value) in [
            ("task", &self.task),
            ("email", &self.email),
            ("evaluation_url", &self.evaluation_url),
        ] {
            if value.trim().is_empty() {
                return Err(AppforgeError::Validation(format!("{} must not be empty", field)));
            }
        }

        Ok(())
    }
}

/// Current state of one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    pub request: TaskRequest,
    /// Repository created for this task, recorded once publication succeeds
    pub repo_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// New record in `processing` for an accepted request
    pub fn accepted(request: TaskRequest) -> Self {
        let now = Utc::now();
        Self {
            id: request.task_id(),
            status: TaskStatus::Processing,
            request,
            repo_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generated source files, filename to content
pub type GeneratedFiles = BTreeMap<String, String>;

/// Where a published repository lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedSite {
    pub repo_url: String,
    pub pages_url: String,
}

/// Completion payload posted to the evaluation endpoint
///
/// Fields are only settable through [`EvaluationPayload::new`], which takes
/// every value up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPayload {
    email: String,
    task: String,
    round: u8,
    nonce: String,
    repo_url: String,
    commit_sha: String,
    pages_url: String,
}

impl EvaluationPayload {
    pub fn new(request: &TaskRequest, site: &PublishedSite, commit_sha: impl Into<String>) -> Self {
        Self {
            email: request.email.clone(),
            task: request.task.clone(),
            round: request.round,
            nonce: request.nonce.clone(),
            repo_url: site.repo_url.clone(),
            commit_sha: commit_sha.into(),
            pages_url: site.pages_url.clone(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    pub fn pages_url(&self) -> &str {
        &self.pages_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(round: u8) -> TaskRequest {
        TaskRequest {
            email: "a@x.com".into(),
            secret: "s1".into(),
            task: "alpha".into(),
            round,
            nonce: "n-1".into(),
            brief: "todo app".into(),
            checks: vec!["must load".into()],
            evaluation_url: "http://eval/".into(),
            attachments: vec![],
        }
    }

    #[test]
    fn test_task_id_format() {
        assert_eq!(request(1).task_id().as_str(), "alpha-1");
        assert_eq!(TaskId::build_of("alpha"), TaskId::from("alpha-1"));
        assert_eq!(TaskId::new("alpha", 2).to_string(), "alpha-2");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(TaskStatus::EvaluationFailed.to_string(), "evaluation_failed");
        assert_eq!(
            serde_json::to_value(TaskStatus::EvaluationFailed).unwrap(),
            serde_json::json!("evaluation_failed")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Processing).unwrap(),
            serde_json::json!("processing")
        );
    }

    #[test]
    fn test_validate_round() {
        assert!(request(1).validate(RequestKind::Build).is_ok());
        assert!(request(2).validate(RequestKind::Revision).is_ok());

        let err = request(2).validate(RequestKind::Build).unwrap_err();
        assert!(matches!(err, AppforgeError::Validation(_)));
        assert!(request(1).validate(RequestKind::Revision).is_err());
    }

    #[test]
    fn test_validate_empty_fields() {
        let mut req = request(1);
        req.task = "  ".into();
        assert!(req.validate(RequestKind::Build).is_err());
    }

    #[test]
    fn test_secret_not_serialized() {
        let value = serde_json::to_value(request(1)).unwrap();
        assert!(value.get("secret").is_none());
        assert_eq!(value["task"], "alpha");
    }

    #[test]
    fn test_request_defaults_on_deserialize() {
        let req: TaskRequest = serde_json::from_value(serde_json::json!({
            "email": "a@x.com",
            "secret": "s1",
            "task": "alpha",
            "round": 1,
            "nonce": "n",
            "brief": "todo app",
            "evaluation_url": "http://eval/"
        }))
        .unwrap();
        assert_eq!(req.secret, "s1");
        assert!(req.checks.is_empty());
        assert!(req.attachments.is_empty());
    }

    #[test]
    fn test_evaluation_payload_fields() {
        let site = PublishedSite {
            repo_url: "https://github.com/me/alpha-1234".into(),
            pages_url: "https://me.github.io/alpha-1234".into(),
        };
        let payload = EvaluationPayload::new(&request(1), &site, "abc123");
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["email"], "a@x.com");
        assert_eq!(value["task"], "alpha");
        assert_eq!(value["round"], 1);
        assert_eq!(value["nonce"], "n-1");
        assert_eq!(value["repo_url"], "https://github.com/me/alpha-1234");
        assert_eq!(value["commit_sha"], "abc123");
        assert_eq!(value["pages_url"], "https://me.github.io/alpha-1234");
    }
}
