//! Retrieval of current conditions and forecasts from OpenWeather.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::{fmt::Debug, time::Duration};

use crate::{
    config::{Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS},
    credentials::Credentials,
    error::GatewayError,
    model::{Coordinates, CurrentConditions, ForecastReport, ForecastSample, UnitSystem},
};

/// Source of weather data. Each call makes a single attempt.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn current_by_name(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<CurrentConditions, GatewayError>;

    async fn forecast_by_name(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<ForecastReport, GatewayError>;

    async fn current_by_coords(
        &self,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<CurrentConditions, GatewayError>;

    async fn forecast_by_coords(
        &self,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<ForecastReport, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

enum Place<'a> {
    Name(&'a str),
    Coords(Coordinates),
}

impl OpenWeatherGateway {
    pub fn new(credentials: Credentials) -> Result<Self, GatewayError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn from_config(credentials: Credentials, config: &Config) -> Result<Self, GatewayError> {
        Self::with_base_url(credentials, config.base_url(), config.timeout())
    }

    pub fn with_base_url(
        credentials: Credentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        place: Place<'_>,
        units: UnitSystem,
    ) -> Result<T, GatewayError> {
        // The key may change between calls.
        let api_key = self.credentials.require_api_key()?;
        let url = format!("{}/{endpoint}", self.base_url);

        let mut query: Vec<(&str, String)> = match place {
            Place::Name(city) => vec![("q", city.to_string())],
            Place::Coords(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        };
        query.push(("units", units.as_query().to_string()));

        tracing::debug!(%url, ?query, "requesting OpenWeather");
        query.push(("appid", api_key));

        let res = self.http.get(&url).query(&query).send().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!(%url, error = %e, "OpenWeather request failed");
            GatewayError::Network(e.to_string())
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!(%url, error = %e, "failed to read OpenWeather response body");
            GatewayError::Network(e.to_string())
        })?;

        if !status.is_success() {
            let message = provider_message(&body).unwrap_or_else(|| format!("Error {}", status.as_u16()));
            tracing::warn!(%url, status = status.as_u16(), %message, "OpenWeather returned an error");
            return Err(GatewayError::Http { status: status.as_u16(), message });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%url, error = %e, body = %truncate_body(&body), "unparseable OpenWeather response");
            GatewayError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn current_by_name(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<CurrentConditions, GatewayError> {
        let parsed: OwCurrentResponse = self.fetch("weather", Place::Name(city), units).await?;
        Ok(parsed.into())
    }

    async fn forecast_by_name(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<ForecastReport, GatewayError> {
        let parsed: OwForecastResponse = self.fetch("forecast", Place::Name(city), units).await?;
        Ok(parsed.into())
    }

    async fn current_by_coords(
        &self,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<CurrentConditions, GatewayError> {
        let parsed: OwCurrentResponse = self.fetch("weather", Place::Coords(coords), units).await?;
        Ok(parsed.into())
    }

    async fn forecast_by_coords(
        &self,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<ForecastReport, GatewayError> {
        let parsed: OwForecastResponse = self.fetch("forecast", Place::Coords(coords), units).await?;
        Ok(parsed.into())
    }
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize, Default)]
struct OwWeather {
    id: i32,
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

/// First condition entry; an empty list degrades to code 0 with blank text.
fn primary(weather: Vec<OwWeather>) -> OwWeather {
    weather.into_iter().next().unwrap_or_default()
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(r: OwCurrentResponse) -> Self {
        let condition = primary(r.weather);
        Self {
            location_name: r.name,
            country_code: r.sys.country,
            timestamp: r.dt,
            sunrise: r.sys.sunrise,
            sunset: r.sys.sunset,
            timezone_offset_seconds: r.timezone,
            temperature: r.main.temp,
            felt_temperature: r.main.feels_like,
            humidity: r.main.humidity,
            pressure: r.main.pressure,
            wind_speed: r.wind.speed,
            condition_code: condition.id,
            condition_main: condition.main,
            condition_description: condition.description,
        }
    }
}

impl From<OwForecastEntry> for ForecastSample {
    fn from(e: OwForecastEntry) -> Self {
        let condition = primary(e.weather);
        Self {
            timestamp: e.dt,
            temperature: e.main.temp,
            felt_temperature: e.main.feels_like,
            humidity: e.main.humidity,
            wind_speed: e.wind.speed,
            condition_code: condition.id,
            condition_main: condition.main,
            condition_description: condition.description,
        }
    }
}

impl From<OwForecastResponse> for ForecastReport {
    fn from(r: OwForecastResponse) -> Self {
        Self {
            city_name: r.city.name,
            country_code: r.city.country,
            samples: r.list.into_iter().map(ForecastSample::from).collect(),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
