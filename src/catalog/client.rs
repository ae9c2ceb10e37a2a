//! Blocking client for the warframe.market v2 API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::item::WfmItem;

pub const DEFAULT_BASE_URL: &str = "https://api.warframe.market";

const USER_AGENT: &str = concat!("relic-scanner/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(30);

/// Every v2 response wraps its payload in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub collections: VersionCollections,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VersionCollections {
    /// Changes whenever the item list changes.
    #[serde(default)]
    pub items: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub platinum: i32,
}

/// Only the sell side is priced; buy orders in the response are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopOrders {
    #[serde(default)]
    pub sell: Vec<Order>,
}

pub struct MarketClient {
    http: reqwest::blocking::Client,
    base_url: String,
    language: String,
}

impl MarketClient {
    /// `language` is sent with every request and selects the item name
    /// translations the server returns.
    pub fn new(base_url: &str, language: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        })
    }

    /// Current version strings of the server's collections.
    pub fn fetch_versions(&self) -> Result<Versions> {
        self.get("/v2/versions")
    }

    /// Every tradable item.
    pub fn fetch_items(&self) -> Result<Vec<WfmItem>> {
        self.get("/v2/items")
    }

    /// Best buy and sell orders of online players for one item.
    pub fn fetch_top_orders(&self, slug: &str) -> Result<TopOrders> {
        self.get(&format!("/v2/orders/item/{}/top", slug))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Language", &self.language)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("GET {}: HTTP {}", url, response.status()));
        }

        let body = response
            .text()
            .with_context(|| format!("Failed to read response from {}", url))?;
        parse_envelope(&body).with_context(|| format!("Unexpected response from {}", url))
    }
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if let Some(error) = envelope.error.filter(|e| !e.is_null()) {
        return Err(anyhow!("API error: {}", error));
    }
    envelope.data.ok_or_else(|| anyhow!("Response has no data"))
}
