//! Access to the simulation host.
//!
//! [`SceneSource`] is the seam between the viewer and the network: the HTTP
//! implementation talks to the host's web endpoints, tests substitute an
//! in-memory one.

use anyhow::{Context as _, anyhow};
use serde::de::DeserializeOwned;

use crate::data_structures::description::{PoseRecord, SceneDescription};

/// Everything the viewer reads from the host. All calls are read-only.
#[allow(async_fn_in_trait)]
pub trait SceneSource {
    /// Current scene version. Any JSON value; only equality matters.
    async fn scene_id(&self) -> anyhow::Result<serde_json::Value>;

    async fn scene_data(&self) -> anyhow::Result<SceneDescription>;

    /// Content-addressed mesh or texture blob.
    async fn blob(&self, hash: &str) -> anyhow::Result<Vec<u8>>;

    /// Latest poses. An empty record means nothing to update.
    async fn scene_state(&self) -> anyhow::Result<PoseRecord>;
}

/// [`SceneSource`] backed by the host's HTTP endpoints.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpSource {
    pub fn new(base_url: Option<&str>) -> anyhow::Result<Self> {
        let base = match base_url {
            Some(url) => parse_base(url)?,
            None => page_origin()?,
        };
        log::info!("Reading scenes from {}", base);
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<reqwest::Url> {
        self.base
            .join(path)
            .with_context(|| format!("Cannot build a url for {path}"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.url(path)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("Malformed response from {url}"))
    }
}

impl SceneSource for HttpSource {
    async fn scene_id(&self) -> anyhow::Result<serde_json::Value> {
        self.get_json("scene_id").await
    }

    async fn scene_data(&self) -> anyhow::Result<SceneDescription> {
        self.get_json("scene_data").await
    }

    async fn blob(&self, hash: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.url(&format!("data/{hash}"))?;
        let bytes = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    async fn scene_state(&self) -> anyhow::Result<PoseRecord> {
        // The host answers `{}` (or nothing useful) until the simulation publishes.
        let record: Option<PoseRecord> = self.get_json("scene_state").await?;
        Ok(record.unwrap_or_default())
    }
}

fn parse_base(url: &str) -> anyhow::Result<reqwest::Url> {
    // `join` drops the last path segment unless the base ends with a slash.
    let url = if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    };
    reqwest::Url::parse(&url).with_context(|| format!("Invalid base url {url}"))
}

#[cfg(target_arch = "wasm32")]
fn page_origin() -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("No window available"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow!("Cannot read page origin: {:?}", e))?;
    parse_base(&origin)
}

#[cfg(not(target_arch = "wasm32"))]
fn page_origin() -> anyhow::Result<reqwest::Url> {
    Err(anyhow!("A base url is required outside the browser"))
}
