use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, Result, truncate_body};
use crate::model::{ForecastSample, WeatherRecord};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// OpenWeather wind speeds arrive in m/s when `units=metric`; the domain
/// model (and everything rendered) uses km/h.
const MPS_TO_KMH: f64 = 3.6;

/// Thin client for the three OpenWeather endpoints the app consumes.
/// No retries and no backoff; a failed request is reported and that is it.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Same client against a different base URL. Exists for tests that point
    /// at a local mock server.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, api_key, base_url: base_url.into() })
    }

    /// `GET /weather?q={city}` — current conditions by city name.
    pub async fn current_by_city(&self, city: &str) -> Result<WeatherRecord> {
        let url = format!("{}/weather", self.base_url);
        let payload: OwCurrent =
            self.get_json(&url, &[("q", city.to_string())]).await?;
        normalize_current(payload, &url)
    }

    /// `GET /weather?lat={lat}&lon={lon}` — current conditions by coordinates.
    pub async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherRecord> {
        let url = format!("{}/weather", self.base_url);
        let payload: OwCurrent = self
            .get_json(&url, &[("lat", lat.to_string()), ("lon", lon.to_string())])
            .await?;
        normalize_current(payload, &url)
    }

    /// `GET /forecast?q={city}` — 5-day forecast in 3-hour slots, provider order.
    pub async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastSample>> {
        let url = format!("{}/forecast", self.base_url);
        let payload: OwForecast =
            self.get_json(&url, &[("q", city.to_string())]).await?;

        payload
            .list
            .into_iter()
            .map(|entry| normalize_sample(entry, &url))
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut query: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        query.push(("appid", self.api_key.as_str()));
        query.push(("units", "metric"));

        let res = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|source| Error::Transport { url: url.to_string(), source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| Error::Transport { url: url.to_string(), source })?;

        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Parse { url: url.to_string(), message: e.to_string() })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecast {
    list: Vec<OwForecastEntry>,
}

fn normalize_current(payload: OwCurrent, url: &str) -> Result<WeatherRecord> {
    let condition = payload.weather.into_iter().next().ok_or_else(|| Error::Parse {
        url: url.to_string(),
        message: "empty `weather` array".to_string(),
    })?;

    Ok(WeatherRecord {
        location: payload.name,
        temperature_c: payload.main.temp,
        humidity_pct: payload.main.humidity,
        wind_speed_kmh: payload.wind.speed * MPS_TO_KMH,
        icon: condition.icon,
        description: condition.description,
    })
}

fn normalize_sample(entry: OwForecastEntry, url: &str) -> Result<ForecastSample> {
    let condition = entry.weather.into_iter().next().ok_or_else(|| Error::Parse {
        url: url.to_string(),
        message: format!("empty `weather` array in forecast entry {}", entry.dt_txt),
    })?;

    Ok(ForecastSample {
        dt_txt: entry.dt_txt,
        temperature_c: entry.main.temp,
        humidity_pct: entry.main.humidity,
        wind_speed_kmh: entry.wind.speed * MPS_TO_KMH,
        icon: condition.icon,
        description: condition.description,
    })
}
