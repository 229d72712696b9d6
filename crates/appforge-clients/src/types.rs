//! Wire formats for the model and repository provider APIs

use serde::{Deserialize, Serialize};

/// Messages API message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: String,
    pub content: String,
}

/// Messages API request format
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub max_tokens: usize,
    pub messages: Vec<ModelMessage>,
}

/// Messages API response format
#[derive(Debug, Clone, Deserialize)]
pub struct ModelResponse {
    pub content: Vec<ModelContent>,
    pub usage: Option<Usage>,
}

/// Content block in a messages API response
#[derive(Debug, Clone, Deserialize)]
pub struct ModelContent {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

/// Token usage information
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

/// `POST /user/repos` body
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepo<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub private: bool,
    pub auto_init: bool,
}

/// Repository as returned by create and get
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub html_url: String,
}

/// `PUT /repos/{owner}/{repo}/contents/{path}` body
#[derive(Debug, Clone, Serialize)]
pub struct PutContents<'a> {
    pub message: String,
    /// Base64-encoded file content
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsEntry {
    pub sha: String,
}

/// `POST /repos/{owner}/{repo}/pages` body
#[derive(Debug, Clone, Serialize)]
pub struct EnablePages<'a> {
    pub source: PagesSource<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PagesSource<'a> {
    pub branch: &'a str,
    pub path: &'a str,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubBranch {
    pub commit: GitHubCommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitRef {
    pub sha: String,
}
