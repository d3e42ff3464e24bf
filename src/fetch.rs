// src/fetch.rs

use reqwest::{blocking::Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Config;
use crate::error::FetchError;

/// Top-level SIDRA table metadata. Everything but the period list is ignored.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct SidraTable {
    #[serde(rename = "Periodos", default)]
    pub periods: Option<SidraPeriods>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct SidraPeriods {
    #[serde(rename = "Periodos", default)]
    pub periods: Option<Vec<SidraPeriod>>,
}

/// One period entry as published; any field may be missing or null.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct SidraPeriod {
    #[serde(rename = "Nome", default)]
    pub name: Option<String>,
    #[serde(rename = "Codigo", default)]
    pub code: Option<String>,
    #[serde(rename = "DataLiberacao", default)]
    pub released_at: Option<String>,
}

impl SidraTable {
    /// `Periodos.Periodos`, empty when either level is absent.
    pub fn periods(&self) -> &[SidraPeriod] {
        self.periods
            .as_ref()
            .and_then(|p| p.periods.as_deref())
            .unwrap_or(&[])
    }
}

/// Anything that can hand the pipeline a decoded SIDRA table.
pub trait PeriodSource {
    fn fetch_index_periods(&self) -> Result<SidraTable, FetchError>;
}

/// Blocking client for a single SIDRA table endpoint.
#[derive(Debug, Clone)]
pub struct SidraClient {
    client: Client,
    endpoint: Url,
}

impl SidraClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Self::with_endpoint(&config.endpoint(), config.timeout)
    }

    pub fn with_endpoint(
        endpoint: &str,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, FetchError> {
        let endpoint = Url::parse(endpoint).map_err(|source| FetchError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;

        // the blocking client defaults to 30s, so `None` has to be passed explicitly
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PeriodSource for SidraClient {
    /// One GET, no retry. Anything but 200 is an error.
    #[instrument(level = "debug", skip(self), fields(url = %self.endpoint))]
    fn fetch_index_periods(&self) -> Result<SidraTable, FetchError> {
        let resp = self.client.get(self.endpoint.clone()).send()?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::RemoteRequest { status });
        }

        let body = resp.text()?;
        debug!(bytes = body.len(), "received body");
        let table: SidraTable = serde_json::from_str(&body)?;
        debug!(periods = table.periods().len(), "decoded table");
        Ok(table)
    }
}
