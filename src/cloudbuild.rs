// https://cloud.google.com/build/docs/api/reference/rest/v1/projects.builds/list

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::build_status::BuildRecord;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::metrics;

const METADATA_TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";

/// Somewhere build records for a tag can be listed from.
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// Builds carrying `tag`, most recent first
    async fn list_records(&self, tag: &str) -> AppResult<Vec<BuildRecord>>;
}

#[derive(Debug, Deserialize)]
struct ListBuildsResponse {
    #[serde(default)]
    builds: Vec<BuildRecord>,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Where bearer tokens for the Cloud Build API come from
#[derive(Clone)]
pub enum TokenSource {
    Static(String),
    /// GCE / Cloud Run metadata server, asked on every request
    Metadata(Url),
}

impl TokenSource {
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        match &config.access_token {
            Some(token) => Ok(TokenSource::Static(token.clone())),
            None => Ok(TokenSource::Metadata(
                config.metadata_url.join(METADATA_TOKEN_PATH)?,
            )),
        }
    }

    async fn token(&self, http: &reqwest::Client) -> AppResult<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata(url) => {
                let res = http
                    .get(url.clone())
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                if !res.status().is_success() {
                    return Err(AppError::Token(format!(
                        "metadata server returned {}",
                        res.status()
                    )));
                }
                let token: MetadataToken = res.json().await?;
                Ok(token.access_token)
            }
        }
    }
}

pub struct CloudBuildClient {
    http: reqwest::Client,
    api_url: Url,
    project: String,
    token: TokenSource,
}

impl CloudBuildClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("badger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            project: config.project.clone(),
            token: TokenSource::from_config(config)?,
        })
    }

    fn builds_url(&self, tag: &str) -> AppResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("API URL {} cannot be a base", self.api_url)))?
            .pop_if_empty()
            .extend(["v1", "projects", self.project.as_str(), "builds"]);
        url.query_pairs_mut()
            .append_pair("filter", &tag_filter(tag))
            .append_pair("fields", "builds.status,builds.logUrl");
        Ok(url)
    }
}

#[async_trait]
impl BuildSource for CloudBuildClient {
    async fn list_records(&self, tag: &str) -> AppResult<Vec<BuildRecord>> {
        let url = self.builds_url(tag)?;
        let request = async {
            let token = self.token.token(&self.http).await?;
            Ok::<_, AppError>(self.http.get(url).bearer_auth(token).send().await?)
        };
        let res = timed(request, metrics::record_upstream_latency).await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let list: ListBuildsResponse = res.json().await?;
        log::debug!("tag {} has {} builds", tag, list.builds.len());
        Ok(list.builds)
    }
}

/// Awaits `fut` and reports how long it took, whatever the outcome
async fn timed<T>(fut: impl Future<Output = T>, record: impl FnOnce(Duration)) -> T {
    let started = Instant::now();
    let out = fut.await;
    record(started.elapsed());
    out
}

/// Cloud Build filter expression selecting builds with exactly this tag
pub fn tag_filter(tag: &str) -> String {
    format!("tags=\"{}\"", tag.replace('\\', "\\\\").replace('"', "\\\""))
}
