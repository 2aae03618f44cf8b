//! HTTP access to license documents.
//!
//! Every failure (DNS, timeout, non-success status, undecodable body) is
//! reported as `None`; nothing here is fatal for a run.

use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::Credentials;

const USER_AGENT: &str = concat!("package-licenses/", env!("CARGO_PKG_VERSION"));

/// License information reported by the GitHub license API.
#[derive(Debug, Clone, PartialEq)]
pub struct GithubLicense {
    pub name: String,
    pub download_url: Option<String>,
}

/// Source of license documents.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// Body of `url` as text.
    async fn text(&self, url: &Url) -> Option<String>;

    /// The license GitHub detected for `owner/repo`.
    async fn github_license(&self, owner: &str, repo: &str) -> Option<GithubLicense>;
}

#[derive(Debug, Deserialize)]
struct GithubLicenseResponse {
    download_url: Option<String>,
    html_url: Option<String>,
    license: Option<GithubLicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct GithubLicenseInfo {
    key: String,
    name: String,
    spdx_id: Option<String>,
}

impl GithubLicenseResponse {
    fn into_license(self) -> Option<GithubLicense> {
        let info = self.license?;
        if info.key == "other" || info.spdx_id.as_deref() == Some("NOASSERTION") {
            return None;
        }
        Some(GithubLicense {
            name: info.name,
            download_url: self.html_url.or(self.download_url),
        })
    }
}

/// [`Fetch`] over HTTP, with optional client credentials for the GitHub API.
pub struct HttpFetcher {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpFetcher {
    pub fn new(credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

impl Fetch for HttpFetcher {
    async fn text(&self, url: &Url) -> Option<String> {
        let response = self.client.get(url.clone()).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }

    async fn github_license(&self, owner: &str, repo: &str) -> Option<GithubLicense> {
        let url = format!("https://api.github.com/repos/{}/{}/license", owner, repo);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.client_id, Some(&credentials.client_secret));
        }

        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: GithubLicenseResponse = response.json().await.ok()?;
        body.into_license()
    }
}

/// `owner` and `repo` when `url` points into a GitHub repository.
pub fn github_repo(url: &Url) -> Option<(String, String)> {
    match url.host_str()? {
        "github.com" | "www.github.com" => {}
        _ => return None,
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Some((owner.to_string(), repo.to_string()))
}

/// Raw-content address for a GitHub `blob` URL, so the fetch returns the
/// document rather than the HTML page around it.
pub fn raw_github_url(url: &Url) -> Option<Url> {
    let (owner, repo) = github_repo(url)?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.get(2) != Some(&"blob") || segments.len() < 5 {
        return None;
    }
    let rest = segments[3..].join("/");
    Url::parse(&format!(
        "https://raw.githubusercontent.com/{}/{}/{}",
        owner, repo, rest
    ))
    .ok()
}
