use std::sync::Arc;

use reqwest::Url;

use crate::license::classifier::classify;
use crate::license::fetch::{github_repo, raw_github_url, Fetch};
use crate::logger::Logger;
use crate::models::{License, PackageMetadata};

/// Finds the license of a cached package.
///
/// Strategies, first success wins:
/// 1. the declared license URL, fetched and classified
/// 2. the declared project URL, fetched and classified
/// 3. the `license` / `licenseUrl` metadata as declared, without fetching
pub struct LicenseResolver<F> {
    fetcher: F,
    logger: Arc<dyn Logger>,
}

impl<F: Fetch> LicenseResolver<F> {
    pub fn new(fetcher: F, logger: Arc<dyn Logger>) -> Self {
        Self { fetcher, logger }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn resolve(&self, package: &PackageMetadata) -> License {
        let candidates = [package.license_url.as_deref(), package.project_url.as_deref()];
        for url in candidates.into_iter().flatten().filter_map(absolute_url) {
            if let Some(license) = self.lookup(&url).await {
                return license;
            }
        }

        self.logger.debug(&format!(
            "{} {}: no license document found, using declared metadata",
            package.id, package.version
        ));
        License {
            name: package.license.clone().filter(|s| !s.trim().is_empty()),
            download_uri: package.license_url.clone().filter(|s| !s.trim().is_empty()),
            text: None,
        }
    }

    /// A license is found only when the fetch succeeds and yields a known name.
    async fn lookup(&self, url: &Url) -> Option<License> {
        if let Some((owner, repo)) = github_repo(url) {
            if let Some(found) = self.fetcher.github_license(&owner, &repo).await {
                return Some(License {
                    name: Some(found.name),
                    download_uri: Some(found.download_url.unwrap_or_else(|| url.to_string())),
                    text: None,
                });
            }
        }

        let target = raw_github_url(url).unwrap_or_else(|| url.clone());
        let text = match self.fetcher.text(&target).await {
            Some(text) => text,
            None => {
                self.logger.debug(&format!("Could not fetch {}", target));
                return None;
            }
        };
        let name = classify(Some(&text))?;
        Some(License {
            name: Some(name),
            download_uri: Some(url.to_string()),
            text: Some(text),
        })
    }
}

/// Parse `s` as an absolute http(s) URL.
fn absolute_url(s: &str) -> Option<Url> {
    let url = Url::parse(s.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;
    use crate::logger::NullLogger;

    fn package() -> PackageMetadata {
        PackageMetadata {
            id: "Newtonsoft.Json".to_string(),
            version: "13.0.1".to_string(),
            authors: "James Newton-King".to_string(),
            ..PackageMetadata::default()
        }
    }

    fn resolver(fetcher: StubFetcher) -> LicenseResolver<StubFetcher> {
        LicenseResolver::new(fetcher, Arc::new(NullLogger))
    }

    #[tokio::test]
    async fn test_license_url_first() {
        let mut pkg = package();
        pkg.license_url = Some("https://licenses.nuget.org/MIT".to_string());
        pkg.project_url = Some("https://www.newtonsoft.com/json".to_string());
        let fetcher = StubFetcher::default()
            .with_page("https://licenses.nuget.org/MIT", "The MIT License ...")
            .with_page("https://www.newtonsoft.com/json", "apache licence");

        let license = resolver(fetcher).resolve(&pkg).await;
        assert_eq!(license.name.as_deref(), Some("MIT License"));
        assert_eq!(license.download_uri.as_deref(), Some("https://licenses.nuget.org/MIT"));
        assert!(license.text.is_some());
    }

    #[tokio::test]
    async fn test_falls_through_to_project_url() {
        let mut pkg = package();
        pkg.license_url = Some("https://example.com/license".to_string());
        pkg.project_url = Some("https://example.com/project".to_string());
        let fetcher = StubFetcher::default()
            .with_page("https://example.com/license", "nothing recognisable")
            .with_page("https://example.com/project", "New BSD License");

        let license = resolver(fetcher).resolve(&pkg).await;
        assert_eq!(license.name.as_deref(), Some("New BSD License"));
        assert_eq!(license.download_uri.as_deref(), Some("https://example.com/project"));
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_metadata() {
        let mut pkg = package();
        pkg.license = Some("MIT".to_string());
        pkg.license_url = Some("https://unreachable.example/license".to_string());

        let license = resolver(StubFetcher::default()).resolve(&pkg).await;
        assert_eq!(license.name.as_deref(), Some("MIT"));
        assert_eq!(
            license.download_uri.as_deref(),
            Some("https://unreachable.example/license")
        );
        assert_eq!(license.text, None);
    }

    #[tokio::test]
    async fn test_relative_urls_are_not_fetched() {
        let mut pkg = package();
        pkg.license = Some("MIT".to_string());
        pkg.license_url = Some("LICENSE.txt".to_string());
        pkg.project_url = Some("not a url".to_string());
        let fetcher = StubFetcher::default();

        let resolver = resolver(fetcher);
        let license = resolver.resolve(&pkg).await;
        // declared values are kept as written
        assert_eq!(
            license,
            License {
                name: Some("MIT".to_string()),
                download_uri: Some("LICENSE.txt".to_string()),
                text: None,
            }
        );
        assert!(resolver.fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_github_api_answer_wins() {
        let mut pkg = package();
        pkg.project_url = Some("https://github.com/JamesNK/Newtonsoft.Json".to_string());
        let fetcher = StubFetcher::default().with_github("JamesNK/Newtonsoft.Json", "MIT License");

        let license = resolver(fetcher).resolve(&pkg).await;
        assert_eq!(license.name.as_deref(), Some("MIT License"));
        assert_eq!(
            license.download_uri.as_deref(),
            Some("https://github.com/JamesNK/Newtonsoft.Json")
        );
    }

    #[tokio::test]
    async fn test_github_blob_is_fetched_raw() {
        let mut pkg = package();
        pkg.license_url =
            Some("https://github.com/JamesNK/Newtonsoft.Json/blob/master/LICENSE.md".to_string());
        let fetcher = StubFetcher::default().with_page(
            "https://raw.githubusercontent.com/JamesNK/Newtonsoft.Json/master/LICENSE.md",
            "The MIT License (MIT)",
        );

        let license = resolver(fetcher).resolve(&pkg).await;
        assert_eq!(license.name.as_deref(), Some("MIT License"));
        assert_eq!(
            license.download_uri.as_deref(),
            Some("https://github.com/JamesNK/Newtonsoft.Json/blob/master/LICENSE.md")
        );
    }
}
