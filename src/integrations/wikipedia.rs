// src/integrations/wikipedia.rs — Encyclopedia summaries via the Wikipedia REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::integrations::types::KnowledgeSource;

#[derive(Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    extract: String,
}

pub struct WikipediaLookup {
    client: Client,
    base_url: String,
}

impl WikipediaLookup {
    pub fn new(language: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ragnosis/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: format!("https://{language}.wikipedia.org/api/rest_v1/page/summary"),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Summary URL for `topic`, with the title percent-encoded as one segment.
    fn summary_url(&self, topic: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        let title = topic.trim().replace(' ', "_");
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base URL cannot take a path: {}", self.base_url))?
            .push(&title);
        Ok(url)
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaLookup {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    async fn lookup(&self, topic: &str) -> anyhow::Result<Option<String>> {
        let url = self.summary_url(topic)?;
        let resp = self.client.get(url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status()?;
        let summary: PageSummary = resp.json().await?;

        if summary.kind == "disambiguation" || summary.extract.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(summary.extract.trim().to_string()))
    }
}
