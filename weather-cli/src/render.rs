use crossterm::style::{Color, Stylize};
use std::{fmt, io::IsTerminal};

use weather_core::{
    DashboardView, Notice, NoticeLevel, Notifier, TextTone,
    dashboard::{CurrentPanel, ForecastCard, ViewStatus},
};

/// Prints notices to stderr so they don't mix with the dashboard on stdout.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        eprintln!("{prefix}: {}", notice.message);
    }
}

pub fn print_view(view: &DashboardView) {
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    print!("{}", Rendered { view, color });
}

/// Text form of a [`DashboardView`]; `color` paints the header with the theme.
pub struct Rendered<'a> {
    pub view: &'a DashboardView,
    pub color: bool,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        let header = format!(
            "Weather (°{})  [{}]",
            view.units.temperature_symbol(),
            view.theme
        );

        if self.color {
            let (top, _) = view.theme.gradient();
            writeln!(f, "{}", header.with(tone_color(view.text_tone)).on(palette_color(top)))?;
        } else {
            writeln!(f, "{header}")?;
        }

        match (&view.status, &view.current) {
            (ViewStatus::Failed { message }, _) => writeln!(f, "\n{message}"),
            (ViewStatus::Empty { needs_api_key: true }, _) => writeln!(
                f,
                "\nPlease add your OpenWeatherMap API key with `weather configure`."
            ),
            (ViewStatus::Empty { needs_api_key: false }, _) | (ViewStatus::Ready, None) => {
                writeln!(f, "\nEnter a city name to see the weather forecast.")
            }
            (ViewStatus::Ready, Some(current)) => {
                write_current(f, current)?;
                write_forecast(f, &view.forecast)
            }
        }
    }
}

fn tone_color(tone: TextTone) -> Color {
    match tone {
        TextTone::Light => Color::White,
        TextTone::Dark => Color::Black,
    }
}

/// Nearest terminal colour for a `<hue>-<shade>` gradient stop.
fn palette_color(stop: &str) -> Color {
    let (hue, shade) = stop.split_once('-').unwrap_or((stop, "500"));
    let dark = shade.parse::<u16>().is_ok_and(|s| s >= 600);

    match (hue, dark) {
        ("blue", false) => Color::Blue,
        ("blue", true) => Color::DarkBlue,
        ("indigo", _) => Color::DarkMagenta,
        ("gray", false) => Color::Grey,
        ("gray", true) => Color::DarkGrey,
        _ => Color::Reset,
    }
}

fn write_current(f: &mut fmt::Formatter<'_>, c: &CurrentPanel) -> fmt::Result {
    writeln!(f, "\n{} ({})", c.location, c.country)?;
    writeln!(f, "{}  {} - {}", c.icon.glyph(), c.condition, c.description)?;
    writeln!(f, "{}  feels like {}", c.temperature, c.feels_like)?;
    writeln!(f, "Humidity {}  Pressure {}  Wind {}", c.humidity, c.pressure, c.wind)?;
    writeln!(f, "Sunrise {}  Sunset {}  Updated {}", c.sunrise, c.sunset, c.updated)
}

fn write_forecast(f: &mut fmt::Formatter<'_>, cards: &[ForecastCard]) -> fmt::Result {
    if cards.is_empty() {
        return Ok(());
    }

    writeln!(f, "\n{}-Day Forecast", cards.len())?;
    for card in cards {
        writeln!(
            f,
            "{:<12} {} {:>6}  {:<24} Hum: {:<5} Wind: {}",
            card.date,
            card.icon.glyph(),
            card.temperature,
            card.description,
            card.humidity,
            card.wind
        )?;
    }
    Ok(())
}
