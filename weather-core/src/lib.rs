//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Daily forecast selection and condition classification
//! - Display formatting for temperatures, times and dates
//! - The OpenWeather gateway and the storage it reads credentials from
//! - A headless dashboard controller that ties them together
//!
//! It is used by `weather-cli`, but can also be reused by other front-ends.

pub mod condition;
pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod daypart;
pub mod error;
pub mod format;
pub mod gateway;
pub mod model;
pub mod storage;
pub mod subscription;

pub use condition::{Icon, TextTone, Theme, classify_background, classify_icon, is_daytime};
pub use config::Config;
pub use credentials::Credentials;
pub use dashboard::{Dashboard, DashboardView, FixedLocator, Locator, Notice, NoticeLevel, Notifier};
pub use daypart::select_daily_representatives;
pub use error::{GatewayError, LocationError, StorageError, ValidationError};
pub use gateway::{OpenWeatherGateway, WeatherGateway};
pub use model::{
    Coordinates, CurrentConditions, DailyForecast, ForecastReport, ForecastSample, LocationQuery,
    UnitSystem,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use subscription::{SubscribeOutcome, Subscriptions};
