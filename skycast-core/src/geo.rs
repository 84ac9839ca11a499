//! Device-position lookup via keyless IP geolocation.
//!
//! A terminal has no geolocation API to ask, so this is the usual
//! substitute: `ip-api.com` resolves the caller's public IP to coordinates.
//! Best-effort only; any failure maps to [`Error::Geolocation`] and the
//! session falls back to manual search.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_ENDPOINT: &str = "http://ip-api.com/json";
const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct IpLocator {
    http: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpLocator {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, endpoint: endpoint.into() })
    }

    pub async fn locate(&self) -> Result<Coordinates> {
        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| Error::Geolocation(e.to_string()))?;

        if !res.status().is_success() {
            return Err(Error::Geolocation(format!(
                "lookup returned status {}",
                res.status()
            )));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| Error::Geolocation(e.to_string()))?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| "lookup refused".to_string());
            tracing::debug!(reason, "ip geolocation failed");
            return Err(Error::Geolocation(reason));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
            _ => Err(Error::Geolocation("lookup response had no coordinates".to_string())),
        }
    }
}
