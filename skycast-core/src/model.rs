use serde::{Deserialize, Serialize};

/// Current conditions for one location, as normalized from the provider.
///
/// `location` is the provider's echoed name, not the raw user query; it is
/// the canonical key for the cache and the saved-location list. A record is
/// never patched in place, each successful fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_kmh: f64,
    pub icon: String,
    pub description: String,
}

impl WeatherRecord {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// One 3-hour forecast slot, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Provider local-time text, `YYYY-MM-DD HH:MM:SS`.
    pub dt_txt: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_kmh: f64,
    pub icon: String,
    pub description: String,
}

impl ForecastSample {
    /// Calendar-date portion of `dt_txt`, used to bucket samples into days.
    /// Taken as a substring, never converted through a time zone.
    pub fn day_key(&self) -> &str {
        match self.dt_txt.split_once(' ') {
            Some((day, _)) => day,
            None => &self.dt_txt,
        }
    }

    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// Per-day summary derived from the 3-hour samples of that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub day: String,
    pub avg_temperature_c: f64,
    pub avg_humidity_pct: f64,
    /// From the first sample of the day, not averaged.
    pub wind_speed_kmh: f64,
    /// From the first sample of the day.
    pub icon: String,
    /// From the first sample of the day.
    pub description: String,
}

impl DailyAggregate {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Ordered set of location names: insertion order preserved, duplicates
/// rejected. Serialized as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedLocations(Vec<String>);

impl SavedLocations {
    /// Append `name` unless already present. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.0.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    /// Convert a Celsius value into this unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Display form with one decimal, e.g. `17.0°C`.
    pub fn format(self, celsius: f64) -> String {
        format!("{:.1}{}", self.convert(celsius), self.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Daily,
    Hourly,
}

/// Per-session display preferences. A plain value: updates go through the
/// `with_*` constructors, which return a replacement rather than mutating.
/// Never persisted; every session starts at Celsius/Light/Daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub unit: TemperatureUnit,
    pub theme: Theme,
    pub view: ViewMode,
}

impl Preferences {
    #[must_use]
    pub fn with_unit(self, unit: TemperatureUnit) -> Self {
        Self { unit, ..self }
    }

    #[must_use]
    pub fn with_theme(self, theme: Theme) -> Self {
        Self { theme, ..self }
    }

    #[must_use]
    pub fn with_view(self, view: ViewMode) -> Self {
        Self { view, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_key_is_the_date_substring() {
        let sample = ForecastSample {
            dt_txt: "2024-01-01 15:00:00".to_string(),
            temperature_c: 10.0,
            humidity_pct: 50,
            wind_speed_kmh: 12.0,
            icon: "10d".to_string(),
            description: "light rain".to_string(),
        };
        assert_eq!(sample.day_key(), "2024-01-01");
    }

    #[test]
    fn day_key_without_time_part_is_the_whole_string() {
        let sample = ForecastSample {
            dt_txt: "2024-01-01".to_string(),
            temperature_c: 10.0,
            humidity_pct: 50,
            wind_speed_kmh: 12.0,
            icon: "10d".to_string(),
            description: "light rain".to_string(),
        };
        assert_eq!(sample.day_key(), "2024-01-01");
    }

    #[test]
    fn saved_locations_reject_duplicates_and_keep_order() {
        let mut saved = SavedLocations::default();
        assert!(saved.insert("London"));
        assert!(saved.insert("Kyiv"));
        assert!(!saved.insert("London"));

        assert_eq!(saved.len(), 2);
        let names: Vec<&str> = saved.iter().collect();
        assert_eq!(names, vec!["London", "Kyiv"]);
    }

    #[test]
    fn saved_locations_serialize_as_plain_array() {
        let mut saved = SavedLocations::default();
        saved.insert("Oslo");
        saved.insert("Riga");

        let json = serde_json::to_string(&saved).expect("serialize");
        assert_eq!(json, r#"["Oslo","Riga"]"#);

        let back: SavedLocations = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, saved);
    }

    #[test]
    fn unit_toggle_round_trips_the_displayed_value() {
        let original_c = 21.37;

        // What the user sees after toggling to Fahrenheit.
        let shown_f: f64 = TemperatureUnit::Fahrenheit
            .format(original_c)
            .trim_end_matches("°F")
            .parse()
            .expect("formatted number");

        // Toggling back converts that displayed value again.
        let back_c = (shown_f - 32.0) * 5.0 / 9.0;
        assert!((back_c - original_c).abs() < 0.1);
        assert_eq!(
            TemperatureUnit::Celsius.format(back_c),
            TemperatureUnit::Celsius.format(original_c)
        );
    }

    #[test]
    fn format_has_one_decimal_and_suffix() {
        assert_eq!(TemperatureUnit::Celsius.format(17.0), "17.0°C");
        assert_eq!(TemperatureUnit::Fahrenheit.format(0.0), "32.0°F");
    }

    #[test]
    fn preferences_updates_replace_not_mutate() {
        let prefs = Preferences::default();
        let toggled = prefs.with_unit(prefs.unit.toggled());

        assert_eq!(prefs.unit, TemperatureUnit::Celsius);
        assert_eq!(toggled.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(toggled.theme, prefs.theme);
        assert_eq!(toggled.view, prefs.view);
    }

    #[test]
    fn icon_url_points_at_the_provider_cdn() {
        let record = WeatherRecord {
            location: "London".to_string(),
            temperature_c: 10.0,
            humidity_pct: 81,
            wind_speed_kmh: 15.0,
            icon: "04d".to_string(),
            description: "overcast clouds".to_string(),
        };
        assert_eq!(record.icon_url(), "https://openweathermap.org/img/wn/04d@2x.png");
    }
}
