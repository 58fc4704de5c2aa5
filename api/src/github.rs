//! GitHub contents API wire types.
//! Endpoint: https://api.github.com/repos/{owner}/{repo}/contents/{path}
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Default, Debug)]
pub struct ContentsResponse {
    #[serde(default)]
    pub path: String,
    pub sha: String,
    /// Base64 with a line break every 60 characters.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Serialize, Debug)]
pub struct PutContentsRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    /// Blob being replaced. Omitted when creating the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Deserialize, Default, Debug)]
pub struct PutContentsResponse {
    pub content: Option<ContentsResponse>,
    pub commit: Option<CommitRef>,
}

#[derive(Deserialize, Default, Debug)]
pub struct CommitRef {
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Body of a 4xx reply, e.g. `{"message": "Invalid request..."}`.
#[derive(Deserialize, Default, Debug)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}
