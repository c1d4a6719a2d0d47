// Plex library rescan trigger
// API: GET /library/sections/{id}/refresh with the X-Plex-Token header

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";

/// Asks a media server to rescan its library
#[async_trait]
pub trait LibraryNotifier: Send + Sync {
    async fn trigger_rescan(&self) -> Result<()>;
}

/// Plex API client for a single library section
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    section_id: String,
}

impl PlexClient {
    pub fn new(base_url: &str, token: &str, section_id: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            section_id: section_id.to_string(),
        }
    }

    pub fn refresh_url(&self) -> String {
        format!(
            "{}/library/sections/{}/refresh",
            self.base_url,
            urlencoding::encode(&self.section_id)
        )
    }
}

#[async_trait]
impl LibraryNotifier for PlexClient {
    async fn trigger_rescan(&self) -> Result<()> {
        let url = self.refresh_url();
        tracing::debug!("Triggering Plex scan: {}", url);

        let response = self
            .client
            .get(&url)
            .header(PLEX_TOKEN_HEADER, &self.token)
            .send()
            .await
            .context("Failed to reach Plex server")?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("Plex returned status code {}", status.as_u16());
        }

        Ok(())
    }
}
