use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::encoding::{DecodeError, decode_content, encode_content};
use crate::domain::{FileBlob, HostingApi, RepositoryRef, RevisionToken};

/// Root of the public Github REST API
pub const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "licyear-cli";
const ACCEPT: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const PER_PAGE: u32 = 100;

/// Errors that can occur when interacting with the Github API
#[derive(Debug, Error)]
pub enum GithubError {
    #[error(
        "GITHUB_TOKEN environment variable is required for this operation.\n\
         Set it with: export GITHUB_TOKEN=<your-token>\n\
         Create a token at: https://github.com/settings/tokens"
    )]
    TokenRequired,

    #[error("failed to create HTTP client")]
    ClientInit(#[source] reqwest::Error),

    #[error("failed to {operation} at {url}")]
    Request {
        operation: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Github API returned status {status} for {url}{}", detail(.message.as_deref()))]
    ApiStatus {
        status: StatusCode,
        url: String,
        message: Option<String>,
    },

    #[error("failed to parse response from {url}")]
    ParseResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unsupported content encoding {encoding:?} from {url}")]
    UnsupportedEncoding { encoding: String, url: String },

    #[error("failed to decode content from {url}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },
}

/// Suffix appending the API's own message to an `ApiStatus` error
fn detail(message: Option<&str>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

/// Repository entry returned by the repository listing API
#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    name: String,
    clone_url: String,
    owner: OwnerEntry,
}

#[derive(Debug, Deserialize)]
struct OwnerEntry {
    login: String,
}

/// File entry returned by the contents API
#[derive(Debug, Deserialize)]
struct ContentEntry {
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Body of a contents API write
#[derive(Debug, Serialize)]
struct ContentUpdate<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
}

/// Error body returned alongside non-success statuses
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Blocking client for the Github REST endpoints the refresh pipeline needs
pub struct GithubClient {
    client: reqwest::blocking::Client,
    token: Option<String>,
    api_base: String,
}

impl GithubClient {
    /// Create a new Github client against the public API
    ///
    /// # Errors
    ///
    /// Returns `GithubError::ClientInit` if the HTTP client cannot be initialized.
    pub fn new(token: Option<String>) -> Result<Self, GithubError> {
        Self::with_api_base(token, GITHUB_API_BASE)
    }

    /// Create a new Github client against a custom API root (e.g. Github Enterprise)
    ///
    /// # Errors
    ///
    /// Returns `GithubError::ClientInit` if the HTTP client cannot be initialized.
    ///
    /// # Panics
    ///
    /// This method panics if called from within an async runtime. See docs on
    /// [`reqwest::blocking`] for details.
    pub fn with_api_base(token: Option<String>, api_base: &str) -> Result<Self, GithubError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(GithubError::ClientInit)?;

        Ok(Self {
            client,
            token,
            api_base: api_base.trim_end_matches('/').to_owned(),
        })
    }

    fn repos_url(&self, account: &str) -> String {
        format!(
            "{}/users/{account}/repos?per_page={PER_PAGE}",
            self.api_base
        )
    }

    fn contents_url(&self, repo: &RepositoryRef, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{path}",
            self.api_base, repo.full_name
        )
    }

    /// Attach the API headers, plus the bearer token when one is configured
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", ACCEPT);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    fn send(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        url: &str,
    ) -> Result<Response, GithubError> {
        debug!("{operation}: {url}");
        self.prepare(request)
            .send()
            .map_err(|source| GithubError::Request {
                operation,
                url: url.to_owned(),
                source,
            })
    }
}

/// Build an `ApiStatus` error, keeping the API's own message when the body carries one.
fn api_status(response: Response, url: &str) -> GithubError {
    let status = response.status();
    let message = response.json::<ApiMessage>().ok().map(|body| body.message);
    GithubError::ApiStatus {
        status,
        url: url.to_owned(),
        message,
    }
}

/// Parse the `Link` header to find the `rel="next"` URL for pagination.
fn parse_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let link_header = headers.get("link")?.to_str().ok()?;
    for part in link_header.split(',') {
        let part = part.trim();
        if part.ends_with("rel=\"next\"") {
            // Extract URL between < and >
            let start = part.find('<')?.checked_add(1)?;
            let end = part.find('>')?;
            return part.get(start..end).map(str::to_owned);
        }
    }
    None
}

impl HostingApi for GithubClient {
    type Error = GithubError;

    fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, GithubError> {
        let mut entries: Vec<RepositoryEntry> = Vec::new();
        let mut url = self.repos_url(account);

        loop {
            let response = self.send(self.client.get(&url), "list repositories", &url)?;

            if !response.status().is_success() {
                return Err(api_status(response, &url));
            }

            let next_url = parse_next_link(response.headers());

            let page: Vec<RepositoryEntry> =
                response
                    .json()
                    .map_err(|source| GithubError::ParseResponse {
                        url: url.clone(),
                        source,
                    })?;

            entries.extend(page);

            match next_url {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(entries
            .into_iter()
            .map(|e| RepositoryRef::new(&e.owner.login, &e.name, &e.clone_url))
            .collect())
    }

    fn fetch_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
    ) -> Result<Option<FileBlob>, GithubError> {
        let url = self.contents_url(repo, path);
        let response = self.send(self.client.get(&url), "fetch file", &url)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_status(response, &url));
        }

        let entry: ContentEntry = response
            .json()
            .map_err(|source| GithubError::ParseResponse {
                url: url.clone(),
                source,
            })?;

        // Files over 1 MB come back with encoding "none" and no inline content
        if let Some(encoding) = entry.encoding.filter(|e| e != "base64") {
            return Err(GithubError::UnsupportedEncoding { encoding, url });
        }

        let content = decode_content(&entry.content)
            .map_err(|source| GithubError::Decode { url, source })?;

        Ok(Some(FileBlob::new(content, RevisionToken::from(entry.sha))))
    }

    fn update_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        content: &str,
        revision: &RevisionToken,
        message: &str,
    ) -> Result<(), GithubError> {
        if self.token.is_none() {
            return Err(GithubError::TokenRequired);
        }

        let url = self.contents_url(repo, path);
        let body = ContentUpdate {
            message,
            content: encode_content(content),
            sha: revision.as_str(),
        };

        let response = self.send(self.client.put(&url).json(&body), "update file", &url)?;

        if !response.status().is_success() {
            return Err(api_status(response, &url));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn repo() -> RepositoryRef {
        RepositoryRef::new(
            "octocat",
            "hello-world",
            "https://github.com/octocat/hello-world.git",
        )
    }

    #[test]
    fn contents_url_joins_full_name_and_path() {
        let client = GithubClient::new(None).unwrap();
        assert_eq!(
            client.contents_url(&repo(), "LICENSE"),
            "https://api.github.com/repos/octocat/hello-world/contents/LICENSE"
        );
        assert_eq!(
            client.contents_url(&repo(), "docs/LICENSE.md"),
            "https://api.github.com/repos/octocat/hello-world/contents/docs/LICENSE.md"
        );
    }

    #[test]
    fn custom_api_base_drops_trailing_slash() {
        let client =
            GithubClient::with_api_base(None, "https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(
            client.repos_url("octocat"),
            "https://ghe.example.com/api/v3/users/octocat/repos?per_page=100"
        );
    }

    #[test]
    fn next_link_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "link",
            HeaderValue::from_static(
                "<https://api.github.com/user/1/repos?page=2>; rel=\"next\", \
                 <https://api.github.com/user/1/repos?page=5>; rel=\"last\"",
            ),
        );
        assert_eq!(
            parse_next_link(&headers).as_deref(),
            Some("https://api.github.com/user/1/repos?page=2")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "link",
            HeaderValue::from_static("<https://api.github.com/user/1/repos?page=1>; rel=\"prev\""),
        );
        assert!(parse_next_link(&headers).is_none());
        assert!(parse_next_link(&HeaderMap::new()).is_none());
    }

    #[test]
    fn update_without_token_fails_before_any_request() {
        let client = GithubClient::with_api_base(None, "http://127.0.0.1:9").unwrap();
        let result = client.update_file(
            &repo(),
            "LICENSE",
            "Copyright (c) 2024",
            &RevisionToken::from("abc123"),
            "Update LICENSE to 2024",
        );
        assert!(matches!(result, Err(GithubError::TokenRequired)));
    }

    #[test]
    fn api_status_message_includes_api_detail() {
        let err = GithubError::ApiStatus {
            status: StatusCode::CONFLICT,
            url: "https://api.github.com/repos/a/b/contents/LICENSE".to_owned(),
            message: Some("LICENSE does not match abc123".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "Github API returned status 409 Conflict for \
             https://api.github.com/repos/a/b/contents/LICENSE: LICENSE does not match abc123"
        );
    }

    #[test]
    fn update_body_serializes_expected_fields() {
        let body = ContentUpdate {
            message: "Update LICENSE to 2024",
            content: encode_content("Hi"),
            sha: "abc123",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "Update LICENSE to 2024");
        assert_eq!(json["content"], "SGk=");
        assert_eq!(json["sha"], "abc123");
    }

    // Note: The following tests require network access and hit the real Github API
    // They are marked with #[ignore] to skip during normal test runs

    #[test]
    #[ignore = "requires network access"]
    fn list_public_repositories() {
        let token = std::env::var("GITHUB_TOKEN").ok();
        let client = GithubClient::new(token).unwrap();
        let repos = client.list_repositories("octocat").unwrap();
        assert!(repos.iter().all(|r| r.owner == "octocat"));
        assert!(repos.iter().any(|r| r.name == "Hello-World"));
    }

    #[test]
    #[ignore = "requires network access"]
    fn missing_file_is_absent() {
        let token = std::env::var("GITHUB_TOKEN").ok();
        let client = GithubClient::new(token).unwrap();
        let repo = RepositoryRef::new(
            "octocat",
            "Hello-World",
            "https://github.com/octocat/Hello-World.git",
        );
        let blob = client.fetch_file(&repo, "NO_SUCH_FILE").unwrap();
        assert!(blob.is_none());
    }
}
