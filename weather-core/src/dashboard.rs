//! Headless dashboard: search, unit toggle, retry and the derived view.
//!
//! Current conditions and forecast are always fetched together and the state
//! is only replaced when both arrive, so a view never mixes old and new data.

use async_trait::async_trait;
use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
};

use crate::{
    condition::{Icon, TextTone, Theme, classify_background, classify_icon, is_daytime, text_tone},
    credentials::{CredentialError, Credentials},
    daypart::select_daily_representatives,
    error::{GatewayError, LocationError, ValidationError},
    format::{format_date, format_temp, format_time, format_wind, title_case},
    gateway::WeatherGateway,
    model::{Coordinates, CurrentConditions, ForecastReport, LocationQuery, UnitSystem},
};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch weather data. Please try again.";
pub const LOCATION_FAILED_MESSAGE: &str =
    "Could not get your location. Please check your location settings.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Short user-facing message, shown outside the main view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notice: Notice);
}

/// Keeps every notice; handy for tests and batch output.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).push(notice);
    }
}

/// Device position lookup.
#[async_trait]
pub trait Locator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Resolves to preconfigured coordinates, or fails as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocator(pub Option<Coordinates>);

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        self.0.ok_or(LocationError::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub units: UnitSystem,
    pub location: LocationQuery,
    pub current: Option<CurrentConditions>,
    pub forecast: Option<ForecastReport>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct Dashboard {
    gateway: Arc<dyn WeatherGateway>,
    credentials: Credentials,
    notifier: Arc<dyn Notifier>,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(
        gateway: Arc<dyn WeatherGateway>,
        credentials: Credentials,
        notifier: Arc<dyn Notifier>,
        units: UnitSystem,
        default_city: &str,
    ) -> Self {
        Self {
            gateway,
            credentials,
            notifier,
            state: DashboardState {
                units,
                location: LocationQuery::City(default_city.to_string()),
                current: None,
                forecast: None,
                error: None,
            },
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn units(&self) -> UnitSystem {
        self.state.units
    }

    /// Initial load of the default location, or a prompt when no key is stored.
    pub async fn start(&mut self) {
        if self.credentials.has_api_key() {
            let location = self.state.location.clone();
            self.load(location).await;
        } else {
            self.notifier
                .notify(Notice::info("Please set your OpenWeatherMap API key in settings"));
        }
    }

    pub async fn search(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            self.notifier.notify(Notice::error(ValidationError::EmptyQuery.to_string()));
            return;
        }

        self.load(LocationQuery::City(city.to_string())).await;
    }

    pub async fn search_coords(&mut self, coords: Coordinates) {
        self.load(LocationQuery::Coords(coords)).await;
    }

    /// Look up the device position first; on failure nothing else changes.
    pub async fn search_here(&mut self, locator: &dyn Locator) {
        self.notifier.notify(Notice::info("Getting your location..."));

        match locator.locate().await {
            Ok(coords) => self.search_coords(coords).await,
            Err(e) => {
                tracing::warn!(error = %e, "geolocation failed");
                self.notifier.notify(Notice::error(LOCATION_FAILED_MESSAGE));
            }
        }
    }

    /// Switch unit system and re-fetch so values stay provider-reported.
    pub async fn toggle_units(&mut self) {
        self.state.units = self.state.units.toggled();
        tracing::debug!(units = %self.state.units, "units toggled");

        if self.state.current.is_some() {
            let location = self.state.location.clone();
            self.load(location).await;
        }
    }

    pub async fn retry(&mut self) {
        let location = self.state.location.clone();
        self.load(location).await;
    }

    /// Store a new API key. Returns whether it was accepted.
    pub fn set_api_key(&self, api_key: &str) -> bool {
        match self.credentials.save_api_key(api_key) {
            Ok(()) => {
                self.notifier.notify(Notice::success("API key saved successfully"));
                true
            }
            Err(CredentialError::Invalid(e)) => {
                self.notifier.notify(Notice::error(e.to_string()));
                false
            }
            Err(CredentialError::Storage(e)) => {
                tracing::error!(error = %e, "failed to store API key");
                self.notifier.notify(Notice::error("Could not save the API key"));
                false
            }
        }
    }

    async fn load(&mut self, location: LocationQuery) {
        if !self.credentials.has_api_key() {
            self.notifier.notify(Notice::error(GatewayError::MissingCredential.user_message()));
            return;
        }

        self.state.error = None;
        let units = self.state.units;
        let gateway = self.gateway.as_ref();

        tracing::info!(%location, %units, "fetching weather");
        let result = match &location {
            LocationQuery::City(city) => {
                tokio::try_join!(
                    gateway.current_by_name(city, units),
                    gateway.forecast_by_name(city, units),
                )
            }
            LocationQuery::Coords(coords) => {
                tokio::try_join!(
                    gateway.current_by_coords(*coords, units),
                    gateway.forecast_by_coords(*coords, units),
                )
            }
        };

        match result {
            Ok((current, forecast)) => {
                self.state.location = match location {
                    LocationQuery::Coords(_) if !current.location_name.is_empty() => {
                        LocationQuery::City(current.location_name.clone())
                    }
                    other => other,
                };
                self.state.current = Some(current);
                self.state.forecast = Some(forecast);
            }
            Err(e) => {
                tracing::error!(%location, error = %e, "error fetching weather data");
                self.notifier.notify(Notice::error(e.user_message()));
                self.state.error = Some(FETCH_FAILED_MESSAGE.to_string());
            }
        }
    }

    pub fn view(&self) -> DashboardView {
        let state = &self.state;
        let units = state.units;

        let (theme, tone) = match &state.current {
            Some(c) => {
                let day = is_daytime(c.timestamp, c.sunrise, c.sunset);
                (classify_background(c.condition_code, day), text_tone(c.condition_code, day))
            }
            None => (Theme::DEFAULT_DAY, TextTone::Dark),
        };

        let status = match (&state.error, &state.current, &state.forecast) {
            (Some(message), _, _) => ViewStatus::Failed { message: message.clone() },
            (None, Some(_), Some(_)) => ViewStatus::Ready,
            _ => ViewStatus::Empty { needs_api_key: !self.credentials.has_api_key() },
        };

        let (current, forecast) = match (&status, &state.current, &state.forecast) {
            (ViewStatus::Ready, Some(c), Some(f)) => {
                (Some(CurrentPanel::new(c, units)), forecast_cards(f, units))
            }
            _ => (None, Vec::new()),
        };

        DashboardView { theme, text_tone: tone, units, status, current, forecast }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Failed { message: String },
    Empty { needs_api_key: bool },
    Ready,
}

/// Everything a renderer needs, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub theme: Theme,
    pub text_tone: TextTone,
    pub units: UnitSystem,
    pub status: ViewStatus,
    pub current: Option<CurrentPanel>,
    pub forecast: Vec<ForecastCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPanel {
    pub location: String,
    pub country: String,
    pub icon: Icon,
    pub condition: String,
    pub description: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub pressure: String,
    pub wind: String,
    pub sunrise: String,
    pub sunset: String,
    pub updated: String,
}

impl CurrentPanel {
    fn new(c: &CurrentConditions, units: UnitSystem) -> Self {
        let tz = c.timezone_offset_seconds;
        Self {
            location: c.location_name.clone(),
            country: c.country_code.clone(),
            icon: classify_icon(c.condition_code),
            condition: c.condition_main.clone(),
            description: title_case(&c.condition_description),
            temperature: format_temp(c.temperature, units),
            feels_like: format_temp(c.felt_temperature, units),
            humidity: format!("{}%", c.humidity),
            pressure: format!("{} hPa", c.pressure),
            wind: format_wind(c.wind_speed, units),
            sunrise: format_time(c.sunrise, tz),
            sunset: format_time(c.sunset, tz),
            updated: format_time(c.timestamp, tz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCard {
    pub date: String,
    pub icon: Icon,
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
}

/// Cards are dated in UTC, matching how the days were grouped.
fn forecast_cards(report: &ForecastReport, units: UnitSystem) -> Vec<ForecastCard> {
    select_daily_representatives(&report.samples)
        .iter()
        .map(|day| {
            let s = day.sample();
            ForecastCard {
                date: format_date(s.timestamp, 0),
                icon: classify_icon(s.condition_code),
                temperature: format_temp(s.temperature, units),
                description: title_case(&s.condition_description),
                humidity: format!("{}%", s.humidity),
                wind: format_wind(s.wind_speed, units),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::ForecastSample, storage::MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // 2024-03-01 00:00:00 UTC
    const DAY_ONE: i64 = 1_709_251_200;
    const HOUR: i64 = 3_600;

    fn conditions(name: &str, units: UnitSystem) -> CurrentConditions {
        CurrentConditions {
            location_name: name.to_string(),
            country_code: "GB".into(),
            timestamp: DAY_ONE + 12 * HOUR,
            sunrise: DAY_ONE + 6 * HOUR,
            sunset: DAY_ONE + 18 * HOUR,
            timezone_offset_seconds: 0,
            temperature: if units == UnitSystem::Metric { 10.0 } else { 50.0 },
            felt_temperature: 8.0,
            humidity: 70,
            pressure: 1012,
            wind_speed: 3.0,
            condition_code: 800,
            condition_main: "Clear".into(),
            condition_description: "clear sky".into(),
        }
    }

    fn report(name: &str) -> ForecastReport {
        ForecastReport {
            city_name: name.to_string(),
            country_code: "GB".into(),
            samples: (0..16)
                .map(|i| ForecastSample {
                    timestamp: DAY_ONE + i * 3 * HOUR,
                    temperature: i as f64,
                    felt_temperature: i as f64,
                    humidity: 50,
                    wind_speed: 2.0,
                    condition_code: 500,
                    condition_main: "Rain".into(),
                    condition_description: "light rain".into(),
                })
                .collect(),
        }
    }

    #[derive(Debug, Default)]
    struct FakeGateway {
        fail_forecast: bool,
        calls: AtomicUsize,
        last_units: Mutex<Option<UnitSystem>>,
    }

    impl FakeGateway {
        fn record(&self, units: UnitSystem) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_units.lock().unwrap() = Some(units);
        }
    }

    #[async_trait]
    impl WeatherGateway for FakeGateway {
        async fn current_by_name(
            &self,
            city: &str,
            units: UnitSystem,
        ) -> Result<CurrentConditions, GatewayError> {
            self.record(units);
            Ok(conditions(city, units))
        }

        async fn forecast_by_name(
            &self,
            city: &str,
            units: UnitSystem,
        ) -> Result<ForecastReport, GatewayError> {
            self.record(units);
            if self.fail_forecast {
                return Err(GatewayError::Http { status: 404, message: "city not found".into() });
            }
            Ok(report(city))
        }

        async fn current_by_coords(
            &self,
            _coords: Coordinates,
            units: UnitSystem,
        ) -> Result<CurrentConditions, GatewayError> {
            self.record(units);
            Ok(conditions("Greenwich", units))
        }

        async fn forecast_by_coords(
            &self,
            _coords: Coordinates,
            units: UnitSystem,
        ) -> Result<ForecastReport, GatewayError> {
            self.record(units);
            Ok(report("Greenwich"))
        }
    }

    fn dashboard(gateway: Arc<FakeGateway>, with_key: bool) -> (Dashboard, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let credentials = Credentials::new(store);
        if with_key {
            credentials.save_api_key("KEY").unwrap();
        }
        let notifier = Arc::new(RecordingNotifier::new());
        let dash = Dashboard::new(gateway, credentials, notifier.clone(), UnitSystem::Metric, "London");
        (dash, notifier)
    }

    #[tokio::test]
    async fn start_without_key_prompts_and_does_not_fetch() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, notifier) = dashboard(gateway.clone(), false);

        dash.start().await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Info);
        assert_eq!(dash.view().status, ViewStatus::Empty { needs_api_key: true });
    }

    #[tokio::test]
    async fn start_with_key_loads_default_city() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, _) = dashboard(gateway.clone(), true);

        dash.start().await;

        let view = dash.view();
        assert_eq!(view.status, ViewStatus::Ready);
        assert_eq!(view.current.as_ref().unwrap().location, "London");
        assert_eq!(view.current.as_ref().unwrap().description, "Clear Sky");
        assert_eq!(view.theme, Theme::ClearDay);
        assert_eq!(view.forecast.len(), 2);
        assert_eq!(view.forecast[0].date, "Fri, Mar 1");
        assert_eq!(view.forecast[0].temperature, "4°C");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_search_is_rejected_without_fetching() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, notifier) = dashboard(gateway.clone(), true);

        dash.search("   ").await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.notices(), vec![Notice::error("Please enter a city name")]);
    }

    #[tokio::test]
    async fn failed_half_leaves_previous_data_untouched() {
        let (mut dash, _) = dashboard(Arc::new(FakeGateway::default()), true);
        dash.search("London").await;
        let before = dash.state().clone();

        dash.gateway = Arc::new(FakeGateway { fail_forecast: true, ..Default::default() });
        dash.search("Atlantis").await;

        let state = dash.state();
        assert_eq!(state.current, before.current);
        assert_eq!(state.forecast, before.forecast);
        assert_eq!(state.location, LocationQuery::City("London".into()));
        assert_eq!(state.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(
            dash.view().status,
            ViewStatus::Failed { message: FETCH_FAILED_MESSAGE.to_string() }
        );
    }

    #[tokio::test]
    async fn provider_error_is_surfaced_as_notice() {
        let gateway = Arc::new(FakeGateway { fail_forecast: true, ..Default::default() });
        let (mut dash, notifier) = dashboard(gateway, true);

        dash.search("Atlantis").await;

        assert_eq!(notifier.notices(), vec![Notice::error("Weather data error: city not found")]);
    }

    #[tokio::test]
    async fn toggle_units_refetches_when_showing_data() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, _) = dashboard(gateway.clone(), true);
        dash.search("London").await;

        dash.toggle_units().await;

        assert_eq!(dash.units(), UnitSystem::Imperial);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 4);
        assert_eq!(*gateway.last_units.lock().unwrap(), Some(UnitSystem::Imperial));
        assert_eq!(dash.view().current.unwrap().temperature, "50°F");
    }

    #[tokio::test]
    async fn toggle_units_without_data_only_flips() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, _) = dashboard(gateway.clone(), true);

        dash.toggle_units().await;

        assert_eq!(dash.units(), UnitSystem::Imperial);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn coordinates_resolve_to_reported_city() {
        let (mut dash, _) = dashboard(Arc::new(FakeGateway::default()), true);

        dash.search_here(&FixedLocator(Some(Coordinates { lat: 51.48, lon: 0.0 }))).await;

        assert_eq!(dash.state().location, LocationQuery::City("Greenwich".into()));
        assert_eq!(dash.view().status, ViewStatus::Ready);
    }

    #[tokio::test]
    async fn geolocation_failure_keeps_state() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, notifier) = dashboard(gateway.clone(), true);
        dash.search("London").await;
        let before = dash.state().clone();

        dash.search_here(&FixedLocator(None)).await;

        assert_eq!(dash.state(), &before);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
        let last = notifier.notices().pop().unwrap();
        assert_eq!(last, Notice::error(LOCATION_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn missing_key_blocks_fetch_with_notice() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, notifier) = dashboard(gateway.clone(), false);

        dash.search("London").await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);
        assert!(dash.state().error.is_none());
    }

    #[tokio::test]
    async fn retry_repeats_last_location() {
        let gateway = Arc::new(FakeGateway::default());
        let (mut dash, _) = dashboard(gateway.clone(), true);
        dash.search("Paris").await;

        dash.retry().await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 4);
        assert_eq!(dash.view().current.unwrap().location, "Paris");
    }

    #[test]
    fn set_api_key_validates() {
        let (dash, notifier) = dashboard(Arc::new(FakeGateway::default()), false);

        assert!(!dash.set_api_key("  "));
        assert!(dash.set_api_key("abc"));
        assert_eq!(
            notifier.notices(),
            vec![
                Notice::error("Please enter a valid API key"),
                Notice::success("API key saved successfully"),
            ]
        );
    }
}
