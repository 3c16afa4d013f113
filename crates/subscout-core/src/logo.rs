//! Provider logo lookup
//!
//! Logos are cosmetic: callers treat every error from [`LogoLookup`] as
//! "no logo" and keep the subscription.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::LogoConfig;
use crate::error::{Error, Result};

/// Resolves a provider display name to a logo URL
#[async_trait]
pub trait LogoLookup: Send + Sync {
    async fn lookup(&self, provider_name: &str) -> Result<String>;
}

/// Logo lookup turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLogo;

#[async_trait]
impl LogoLookup for NoLogo {
    async fn lookup(&self, provider_name: &str) -> Result<String> {
        Err(Error::NotFound(format!("Logo lookup disabled ({})", provider_name)))
    }
}

/// svgl search result; only the route matters
#[derive(Debug, Deserialize)]
struct SvglLogo {
    route: SvglRoute,
}

/// A single SVG, or one per color scheme
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SvglRoute {
    Single(String),
    Themed { light: String },
}

impl SvglRoute {
    fn into_url(self) -> String {
        match self {
            Self::Single(url) => url,
            Self::Themed { light } => light,
        }
    }
}

/// Search terms tried in order: "apple-tv+", "appletv+", "apple-tv+-logo"
pub fn name_variants(provider_name: &str) -> Vec<String> {
    let hyphenated = provider_name.trim().to_lowercase().replace(' ', "-");
    vec![
        hyphenated.clone(),
        hyphenated.replace('-', ""),
        format!("{}-logo", hyphenated),
    ]
}

/// Client for the svgl logo search API
#[derive(Debug, Clone)]
pub struct SvglLogoClient {
    http_client: Client,
    base_url: String,
}

impl SvglLogoClient {
    pub fn new(config: &LogoConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, term: &str) -> Result<String> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("search", term)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::NotFound(format!(
                "Logo search '{}' returned {}",
                term,
                response.status()
            )));
        }

        let logos: Vec<SvglLogo> = response.json().await?;
        logos
            .into_iter()
            .next()
            .map(|logo| logo.route.into_url())
            .ok_or_else(|| Error::NotFound(format!("No logo for '{}'", term)))
    }
}

#[async_trait]
impl LogoLookup for SvglLogoClient {
    async fn lookup(&self, provider_name: &str) -> Result<String> {
        for term in name_variants(provider_name) {
            match self.search(&term).await {
                Ok(url) => return Ok(url),
                Err(e) => debug!("Logo search '{}' failed: {}", term, e),
            }
        }
        Err(Error::NotFound(format!("No logo for {}", provider_name)))
    }
}

/// Build the configured lookup; disabled config yields [`NoLogo`]
pub fn from_config(config: &LogoConfig) -> Result<Box<dyn LogoLookup>> {
    if config.enabled {
        Ok(Box::new(SvglLogoClient::new(config)?))
    } else {
        Ok(Box::new(NoLogo))
    }
}
