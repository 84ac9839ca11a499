//! Terminal rendering for the weather card and forecast lists.

use chrono::{NaiveDate, NaiveDateTime};
use skycast_core::{ForecastView, Preferences, Session, Theme, WeatherRecord};

const RESET: &str = "\x1b[0m";

fn accent(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "\x1b[1;34m",
        Theme::Dark => "\x1b[1;33m",
    }
}

/// `2024-01-01` -> `Mon 01 Jan`. Labels that don't parse pass through.
pub fn day_label(day: &str) -> String {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|d| d.format("%a %d %b").to_string())
        .unwrap_or_else(|_| day.to_string())
}

/// `2024-01-01 15:00:00` -> `3 PM`.
pub fn hour_label(dt_txt: &str) -> String {
    NaiveDateTime::parse_from_str(dt_txt, "%Y-%m-%d %H:%M:%S")
        .map(|t| t.format("%l %p").to_string().trim_start().to_string())
        .unwrap_or_else(|_| dt_txt.to_string())
}

pub fn weather_card(record: &WeatherRecord, prefs: Preferences) -> String {
    let accent = accent(prefs.theme);
    format!(
        "{accent}{location}{RESET}\n\
         {description} ({icon})\n\
         Temperature: {temp}\n\
         Humidity: {humidity}%\n\
         Wind Speed: {wind:.1} km/h",
        location = record.location,
        description = record.description,
        icon = record.icon_url(),
        temp = prefs.unit.format(record.temperature_c),
        humidity = record.humidity_pct,
        wind = record.wind_speed_kmh,
    )
}

pub fn forecast_section(view: &ForecastView, prefs: Preferences) -> String {
    let accent = accent(prefs.theme);
    let mut lines = Vec::new();

    match view {
        ForecastView::Daily(days) => {
            lines.push(format!("{accent}Daily Forecast{RESET}"));
            for day in days {
                lines.push(format!(
                    "{:<11} {:>8}  {:>3.0}%  {:>5.1} km/h  {}",
                    day_label(&day.day),
                    prefs.unit.format(day.avg_temperature_c),
                    day.avg_humidity_pct,
                    day.wind_speed_kmh,
                    day.description,
                ));
            }
        }
        ForecastView::Hourly(slots) => {
            lines.push(format!("{accent}Hourly Forecast{RESET}"));
            for slot in slots {
                lines.push(format!(
                    "{:<11} {:>8}  {:>3}%  {:>5.1} km/h  {}",
                    hour_label(&slot.dt_txt),
                    prefs.unit.format(slot.temperature_c),
                    slot.humidity_pct,
                    slot.wind_speed_kmh,
                    slot.description,
                ));
            }
        }
    }

    lines.join("\n")
}

/// Everything the session currently shows: notice, weather card, forecast.
pub fn session_view(session: &Session) -> String {
    let prefs = session.preferences();
    let mut parts = Vec::new();

    if let Some(notice) = session.notice() {
        parts.push(format!("! {notice}"));
    }

    match session.weather() {
        Some(record) => parts.push(weather_card(record, prefs)),
        None => {
            if session.notice().is_none() {
                parts.push("No location yet. Search for a city to get started.".to_string());
            }
        }
    }

    if !session.forecast().is_empty() {
        parts.push(forecast_section(&session.forecast_view(), prefs));
    }

    parts.join("\n\n")
}
