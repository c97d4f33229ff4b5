use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::sync::Arc;

use weather_core::{
    Config, Coordinates, Credentials, Dashboard, FileStore, FixedLocator, KeyValueStore,
    OpenWeatherGateway, SubscribeOutcome, Subscriptions, UnitSystem,
    dashboard::ViewStatus, subscription::SubscriptionError,
};

use crate::render::{self, TerminalNotifier};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and 5-day forecast in your terminal")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Unit system for this run: metric or imperial. Defaults to the configured one.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<UnitSystem>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store your OpenWeatherMap API key.
    Configure {
        /// API key; prompted for when absent.
        #[arg(long)]
        key: Option<String>,
    },

    /// Show weather for a city.
    Show {
        /// City name; defaults to the configured city.
        city: Option<String>,

        /// Fetch again in the other unit system after showing the first result.
        #[arg(long)]
        both_units: bool,
    },

    /// Show weather for your position.
    Here {
        /// Latitude; falls back to the configured home location.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude; falls back to the configured home location.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Subscribe an email address to daily weather updates.
    Subscribe {
        /// Email address; prompted for when absent.
        email: Option<String>,
    },

    /// Set the default unit system.
    Units {
        /// metric or imperial.
        #[arg(value_parser = parse_units)]
        system: UnitSystem,
    },
}

fn parse_units(s: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(s).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::open_default().context("Failed to open local store")?);
        let units = self.units.unwrap_or(config.units);

        match self.command {
            Command::Configure { key } => {
                let key = match key {
                    Some(k) => k,
                    None => Password::new("OpenWeatherMap API key:")
                        .with_display_mode(PasswordDisplayMode::Masked)
                        .without_confirmation()
                        .with_help_message("Get a free key at https://home.openweathermap.org/users/sign_up")
                        .prompt()
                        .context("Failed to read API key")?,
                };

                let dashboard = build_dashboard(&config, store, units)?;
                if !dashboard.set_api_key(&key) {
                    anyhow::bail!("API key was not saved");
                }
            }
            Command::Show { city, both_units } => {
                let mut dashboard = build_dashboard(&config, store, units)?;
                match city {
                    Some(city) => dashboard.search(&city).await,
                    None => dashboard.start().await,
                }
                render::print_view(&dashboard.view());

                if both_units && dashboard.state().current.is_some() {
                    dashboard.toggle_units().await;
                    render::print_view(&dashboard.view());
                }
                ensure_not_failed(&dashboard)?;
            }
            Command::Here { lat, lon } => {
                let coords = here_coordinates(lat, lon, &config);

                let mut dashboard = build_dashboard(&config, store, units)?;
                dashboard.search_here(&FixedLocator(coords)).await;
                render::print_view(&dashboard.view());
                ensure_not_failed(&dashboard)?;
            }
            Command::Subscribe { email } => {
                let email = match email {
                    Some(e) => e,
                    None => Text::new("Email address:")
                        .with_placeholder("your@email.com")
                        .prompt()
                        .context("Failed to read email address")?,
                };

                match Subscriptions::new(store).subscribe(&email) {
                    Ok(SubscribeOutcome::Subscribed) => {
                        println!("Thank you for subscribing to daily weather updates!")
                    }
                    Ok(SubscribeOutcome::AlreadySubscribed) => {
                        println!("You're already subscribed for daily weather updates!")
                    }
                    Err(SubscriptionError::Invalid(e)) => anyhow::bail!("{e}"),
                    Err(SubscriptionError::Storage(e)) => {
                        return Err(e).context("Failed to subscribe. Please try again later.");
                    }
                }
            }
            Command::Units { system } => {
                config.units = system;
                config.save()?;
                println!("Default units set to {system}");
            }
        }

        Ok(())
    }
}

fn build_dashboard(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    units: UnitSystem,
) -> Result<Dashboard> {
    let credentials = Credentials::new(store);
    let gateway = OpenWeatherGateway::from_config(credentials.clone(), config)
        .context("Failed to initialise weather gateway")?;

    Ok(Dashboard::new(
        Arc::new(gateway),
        credentials,
        Arc::new(TerminalNotifier),
        units,
        &config.default_city,
    ))
}

/// Explicit coordinates win; otherwise the configured home, if any.
fn here_coordinates(lat: Option<f64>, lon: Option<f64>, config: &Config) -> Option<Coordinates> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
        _ => config.home,
    }
}

fn ensure_not_failed(dashboard: &Dashboard) -> Result<()> {
    match dashboard.view().status {
        ViewStatus::Failed { message } => {
            anyhow::bail!("{message}")
        }
        _ => Ok(()),
    }
}
