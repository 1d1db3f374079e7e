// src/sources/rest.rs
// REST data endpoint driven by structured descriptors

use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::{QueryError, Result};
use crate::pipeline::{RestDescriptor, ResultRows};

/// Header carrying the access credential
const API_KEY_HEADER: &str = "apikey";

pub struct RestSource {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    default_limit: u32,
}

impl RestSource {
    pub fn new(client: Client, base_url: Option<String>, api_key: Option<String>, default_limit: u32) -> Self {
        Self {
            client,
            base_url,
            api_key,
            default_limit,
        }
    }

    /// `{base}/{table}?select=..[&order=..]&limit=..`
    pub fn build_url(&self, descriptor: &RestDescriptor) -> Result<Url> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| QueryError::Execution("REST endpoint is not configured".into()))?;
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), descriptor.table))
            .map_err(|e| QueryError::Execution(format!("invalid REST endpoint: {}", e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &descriptor.select);
            if let Some(ref order) = descriptor.order {
                pairs.append_pair("order", order);
            }
            let limit = descriptor.limit.unwrap_or(self.default_limit);
            pairs.append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }

    #[instrument(skip(self, descriptor), fields(table = %descriptor.table))]
    pub async fn fetch(&self, descriptor: &RestDescriptor) -> Result<ResultRows> {
        let url = self.build_url(descriptor)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| QueryError::Execution("REST API key is required for REST queries".into()))?;

        info!(url = %url, "Executing REST query");
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| QueryError::Execution(format!("REST request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "REST endpoint rejected query");
            return Err(QueryError::Execution(format!("REST API error: {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QueryError::Execution(format!("REST response is not JSON: {}", e)))?;
        match body {
            Value::Array(rows) => {
                info!(rows = rows.len(), "REST query returned");
                Ok(ResultRows::new(rows))
            }
            other => Err(QueryError::Execution(format!(
                "REST response is not an array: {}",
                crate::utils::truncate(&other.to_string(), 200)
            ))),
        }
    }
}
