//! The display-state controller: what the UI shows and how user actions
//! move it between phases.
//!
//! All network work is funneled through the [`WeatherApi`] and
//! [`Geolocator`] seams so the state machine can be driven in tests without
//! a provider. Every operation awaits its full fetch sequence before
//! returning, so at most one request chain is ever in flight; superseded
//! requests cannot exist and no cancellation machinery is needed.

use async_trait::async_trait;
use std::fmt;
use tracing::warn;

use crate::client::WeatherClient;
use crate::error::Result;
use crate::forecast::aggregate_daily;
use crate::geo::{Coordinates, IpLocator};
use crate::model::{
    DailyAggregate, ForecastSample, Preferences, SavedLocations, ViewMode, WeatherRecord,
};
use crate::store::Store;

/// Daily view shows at most a week.
const DAILY_VIEW_DAYS: usize = 7;
/// Hourly view shows the first 24 slots.
const HOURLY_VIEW_SLOTS: usize = 24;

#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current_by_city(&self, city: &str) -> Result<WeatherRecord>;
    async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherRecord>;
    async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastSample>>;
}

#[async_trait]
impl WeatherApi for WeatherClient {
    async fn current_by_city(&self, city: &str) -> Result<WeatherRecord> {
        WeatherClient::current_by_city(self, city).await
    }

    async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherRecord> {
        WeatherClient::current_by_coords(self, lat, lon).await
    }

    async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastSample>> {
        WeatherClient::forecast_by_city(self, city).await
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
}

#[async_trait]
impl Geolocator for IpLocator {
    async fn locate(&self) -> Result<Coordinates> {
        IpLocator::locate(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A fetch sequence is in flight.
    Loading,
    /// Weather (and possibly a forecast) on display.
    Loaded,
    /// The last fetch failed; any earlier weather stays on display.
    Error,
}

/// User-visible notices. Everything that used to be a silent log line or a
/// blocking alert goes through here, one channel for all of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LocationUnavailable,
    FetchFailed(String),
    ForecastUnavailable(String),
    StoreFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LocationUnavailable => {
                f.write_str("Location unavailable. Search for a city instead.")
            }
            Notice::FetchFailed(reason) => {
                write!(f, "Could not fetch weather. Check the location name. ({reason})")
            }
            Notice::ForecastUnavailable(reason) => {
                write!(f, "Forecast unavailable: {reason}")
            }
            Notice::StoreFailed(reason) => {
                write!(f, "Could not update local storage: {reason}")
            }
        }
    }
}

/// The rendered forecast, sliced for presentation. The session's underlying
/// sample list is never truncated.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastView {
    Daily(Vec<DailyAggregate>),
    Hourly(Vec<ForecastSample>),
}

enum FetchTarget {
    City(String),
    Position(Coordinates),
}

pub struct Session {
    api: Box<dyn WeatherApi>,
    locator: Box<dyn Geolocator>,
    store: Store,
    phase: Phase,
    weather: Option<WeatherRecord>,
    forecast: Vec<ForecastSample>,
    prefs: Preferences,
    saved: SavedLocations,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(api: Box<dyn WeatherApi>, locator: Box<dyn Geolocator>, store: Store) -> Self {
        Self {
            api,
            locator,
            store,
            phase: Phase::Idle,
            weather: None,
            forecast: Vec::new(),
            prefs: Preferences::default(),
            saved: SavedLocations::default(),
            notice: None,
        }
    }

    /// Startup sequence: restore the cached last lookup if there is one
    /// (shown as-is, never re-validated against the provider), otherwise
    /// try geolocation. A failed geolocation leaves the session `Idle` with
    /// an explicit notice rather than silently doing nothing.
    pub async fn bootstrap(&mut self) {
        self.saved = match self.store.saved_locations() {
            Ok(Some(saved)) => saved,
            Ok(None) => SavedLocations::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable saved locations");
                SavedLocations::default()
            }
        };

        let cached = match self.store.last_weather() {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable weather cache");
                None
            }
        };

        if let Some(record) = cached {
            let location = record.location.clone();
            self.weather = Some(record);
            self.phase = Phase::Loaded;
            self.refresh_forecast(&location).await;
            return;
        }

        match self.locator.locate().await {
            Ok(position) => self.run_fetch(FetchTarget::Position(position)).await,
            Err(e) => {
                warn!(error = %e, "geolocation unavailable");
                self.notice = Some(Notice::LocationUnavailable);
            }
        }
    }

    /// Look up a user-typed location. Blank input is a no-op.
    pub async fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.run_fetch(FetchTarget::City(query.to_string())).await;
    }

    /// Look up a previously saved location. Same path as a search.
    pub async fn select_saved(&mut self, name: &str) {
        self.run_fetch(FetchTarget::City(name.to_string())).await;
    }

    async fn run_fetch(&mut self, target: FetchTarget) {
        self.phase = Phase::Loading;

        let fetched = match &target {
            FetchTarget::City(city) => self.api.current_by_city(city).await,
            FetchTarget::Position(p) => self.api.current_by_coords(p.lat, p.lon).await,
        };

        match fetched {
            Ok(record) => {
                if let Err(e) = self.store.save_last_weather(&record) {
                    warn!(error = %e, "failed to persist last weather");
                }

                // The saved list keys on the provider-normalized name, so a
                // query that resolves to an already-saved place is a no-op.
                if self.saved.insert(record.location.clone()) {
                    if let Err(e) = self.store.save_saved_locations(&self.saved) {
                        warn!(error = %e, "failed to persist saved locations");
                    }
                }

                let location = record.location.clone();
                self.weather = Some(record);
                self.notice = None;
                self.refresh_forecast(&location).await;
                self.phase = Phase::Loaded;
            }
            Err(e) => {
                warn!(error = %e, "current weather fetch failed");
                // Whatever was on display before stays there.
                self.notice = Some(Notice::FetchFailed(e.to_string()));
                self.phase = Phase::Error;
            }
        }
    }

    /// Forecast failures must not take down the current-weather display:
    /// keep whatever forecast was shown before and surface a notice.
    async fn refresh_forecast(&mut self, location: &str) {
        match self.api.forecast_by_city(location).await {
            Ok(samples) => self.forecast = samples,
            Err(e) => {
                warn!(error = %e, location, "forecast fetch failed");
                self.notice = Some(Notice::ForecastUnavailable(e.to_string()));
            }
        }
    }

    pub fn toggle_unit(&mut self) {
        self.prefs = self.prefs.with_unit(self.prefs.unit.toggled());
    }

    pub fn toggle_theme(&mut self) {
        self.prefs = self.prefs.with_theme(self.prefs.theme.toggled());
    }

    pub fn set_view_mode(&mut self, view: ViewMode) {
        self.prefs = self.prefs.with_view(view);
    }

    /// Drop the saved-location list, in memory and on disk. The current
    /// weather display is untouched.
    pub fn clear_saved(&mut self) {
        self.saved.clear();
        if let Err(e) = self.store.clear_saved_locations() {
            warn!(error = %e, "failed to clear saved locations on disk");
            self.notice = Some(Notice::StoreFailed(e.to_string()));
        }
    }

    /// The forecast as it should be rendered for the current view mode.
    pub fn forecast_view(&self) -> ForecastView {
        match self.prefs.view {
            ViewMode::Daily => {
                let mut daily = aggregate_daily(&self.forecast);
                daily.truncate(DAILY_VIEW_DAYS);
                ForecastView::Daily(daily)
            }
            ViewMode::Hourly => ForecastView::Hourly(
                self.forecast.iter().take(HOURLY_VIEW_SLOTS).cloned().collect(),
            ),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn weather(&self) -> Option<&WeatherRecord> {
        self.weather.as_ref()
    }

    pub fn forecast(&self) -> &[ForecastSample] {
        &self.forecast
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn saved_locations(&self) -> &SavedLocations {
        &self.saved
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::TemperatureUnit;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        current_city: AtomicUsize,
        current_coords: AtomicUsize,
        forecast: AtomicUsize,
        locate: AtomicUsize,
    }

    fn record(location: &str) -> WeatherRecord {
        WeatherRecord {
            location: location.to_string(),
            temperature_c: 12.3,
            humidity_pct: 70,
            wind_speed_kmh: 14.4,
            icon: "03d".to_string(),
            description: "scattered clouds".to_string(),
        }
    }

    fn sample(dt_txt: &str) -> ForecastSample {
        ForecastSample {
            dt_txt: dt_txt.to_string(),
            temperature_c: 8.0,
            humidity_pct: 60,
            wind_speed_kmh: 10.0,
            icon: "10d".to_string(),
            description: "light rain".to_string(),
        }
    }

    /// Five days of 3-hour slots, 40 samples, like a real forecast payload.
    fn full_forecast() -> Vec<ForecastSample> {
        (0..40)
            .map(|i| sample(&format!("2024-01-{:02} {:02}:00:00", 1 + i / 8, (i % 8) * 3)))
            .collect()
    }

    struct MockApi {
        calls: Arc<Calls>,
        /// Name the provider echoes back, regardless of the query casing.
        normalized: String,
        fail_current: Arc<AtomicBool>,
        fail_forecast: Arc<AtomicBool>,
    }

    impl MockApi {
        fn new(calls: Arc<Calls>, normalized: &str) -> Self {
            Self {
                calls,
                normalized: normalized.to_string(),
                fail_current: Arc::new(AtomicBool::new(false)),
                fail_forecast: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    fn fetch_failure() -> Error {
        Error::Parse { url: "mock".to_string(), message: "city not found".to_string() }
    }

    #[async_trait]
    impl WeatherApi for MockApi {
        async fn current_by_city(&self, _city: &str) -> Result<WeatherRecord> {
            self.calls.current_city.fetch_add(1, Ordering::SeqCst);
            if self.fail_current.load(Ordering::SeqCst) {
                return Err(fetch_failure());
            }
            Ok(record(&self.normalized))
        }

        async fn current_by_coords(&self, _lat: f64, _lon: f64) -> Result<WeatherRecord> {
            self.calls.current_coords.fetch_add(1, Ordering::SeqCst);
            if self.fail_current.load(Ordering::SeqCst) {
                return Err(fetch_failure());
            }
            Ok(record(&self.normalized))
        }

        async fn forecast_by_city(&self, _city: &str) -> Result<Vec<ForecastSample>> {
            self.calls.forecast.fetch_add(1, Ordering::SeqCst);
            if self.fail_forecast.load(Ordering::SeqCst) {
                return Err(Error::Parse {
                    url: "mock".to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(full_forecast())
        }
    }

    struct MockLocator {
        calls: Arc<Calls>,
        result: Option<Coordinates>,
    }

    #[async_trait]
    impl Geolocator for MockLocator {
        async fn locate(&self) -> Result<Coordinates> {
            self.calls.locate.fetch_add(1, Ordering::SeqCst);
            self.result
                .ok_or_else(|| Error::Geolocation("permission denied".to_string()))
        }
    }

    struct Harness {
        calls: Arc<Calls>,
        fail_current: Arc<AtomicBool>,
        fail_forecast: Arc<AtomicBool>,
        session: Session,
        _tmp: tempfile::TempDir,
    }

    fn harness(normalized: &str, coords: Option<Coordinates>) -> Harness {
        let tmp = tempfile::tempdir().expect("tempdir");
        harness_at(normalized, coords, tmp)
    }

    fn harness_at(
        normalized: &str,
        coords: Option<Coordinates>,
        tmp: tempfile::TempDir,
    ) -> Harness {
        let calls = Arc::new(Calls::default());
        let api = MockApi::new(Arc::clone(&calls), normalized);
        let fail_current = Arc::clone(&api.fail_current);
        let fail_forecast = Arc::clone(&api.fail_forecast);
        let locator = MockLocator { calls: Arc::clone(&calls), result: coords };
        let store = Store::at(tmp.path());
        let session = Session::new(Box::new(api), Box::new(locator), store);

        Harness { calls, fail_current, fail_forecast, session, _tmp: tmp }
    }

    #[tokio::test]
    async fn cached_startup_skips_geolocation_and_fetches_forecast_once() {
        let tmp = tempfile::tempdir().expect("tempdir");
        Store::at(tmp.path()).save_last_weather(&record("Oslo")).expect("seed cache");

        let mut h = harness_at("Oslo", Some(Coordinates { lat: 0.0, lon: 0.0 }), tmp);
        h.session.bootstrap().await;

        assert_eq!(h.calls.locate.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.current_city.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.current_coords.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.forecast.load(Ordering::SeqCst), 1);

        assert_eq!(h.session.phase(), Phase::Loaded);
        assert_eq!(h.session.weather().expect("weather").location, "Oslo");
        assert!(!h.session.forecast().is_empty());
    }

    #[tokio::test]
    async fn empty_startup_geolocates_and_persists_the_result() {
        let mut h = harness("Bergen", Some(Coordinates { lat: 60.4, lon: 5.3 }));
        h.session.bootstrap().await;

        assert_eq!(h.calls.locate.load(Ordering::SeqCst), 1);
        assert_eq!(h.calls.current_coords.load(Ordering::SeqCst), 1);
        assert_eq!(h.session.phase(), Phase::Loaded);

        let cached = h.session.store.last_weather().expect("read").expect("cached");
        assert_eq!(cached.location, "Bergen");
        assert!(h.session.saved_locations().contains("Bergen"));
    }

    #[tokio::test]
    async fn denied_geolocation_leaves_idle_with_an_explicit_notice() {
        let mut h = harness("Bergen", None);
        h.session.bootstrap().await;

        assert_eq!(h.session.phase(), Phase::Idle);
        assert_eq!(h.session.notice(), Some(&Notice::LocationUnavailable));
        assert!(h.session.weather().is_none());
        assert_eq!(h.calls.current_city.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_saves_the_normalized_name_once() {
        let mut h = harness("London", None);

        // Two spellings, one provider-normalized name.
        h.session.search("london").await;
        h.session.search("LONDON").await;

        assert_eq!(h.session.saved_locations().len(), 1);
        assert!(h.session.saved_locations().contains("London"));

        let on_disk = h.session.store.saved_locations().expect("read").expect("saved");
        assert!(on_disk.contains("London"));
        assert_eq!(on_disk.len(), 1);
    }

    #[tokio::test]
    async fn blank_search_is_a_no_op() {
        let mut h = harness("London", None);
        h.session.search("   ").await;

        assert_eq!(h.calls.current_city.load(Ordering::SeqCst), 0);
        assert_eq!(h.session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn failed_search_keeps_the_previous_weather_on_display() {
        let mut h = harness("London", None);
        h.session.search("london").await;
        assert_eq!(h.session.phase(), Phase::Loaded);

        h.fail_current.store(true, Ordering::SeqCst);
        h.session.search("nowhere").await;

        assert_eq!(h.session.phase(), Phase::Error);
        assert!(matches!(h.session.notice(), Some(Notice::FetchFailed(_))));
        // Prior record untouched.
        assert_eq!(h.session.weather().expect("weather").location, "London");
        // Failed query never reaches the saved list.
        assert_eq!(h.session.saved_locations().len(), 1);
    }

    #[tokio::test]
    async fn forecast_failure_is_surfaced_but_does_not_disturb_weather() {
        let mut h = harness("London", None);
        h.fail_forecast.store(true, Ordering::SeqCst);
        h.session.search("london").await;

        assert_eq!(h.session.phase(), Phase::Loaded);
        assert_eq!(h.session.weather().expect("weather").location, "London");
        assert!(matches!(h.session.notice(), Some(Notice::ForecastUnavailable(_))));
        assert!(h.session.forecast().is_empty());
    }

    #[tokio::test]
    async fn select_saved_behaves_like_search() {
        let mut h = harness("London", None);
        h.session.search("london").await;
        h.session.select_saved("London").await;

        assert_eq!(h.calls.current_city.load(Ordering::SeqCst), 2);
        assert_eq!(h.session.saved_locations().len(), 1);
        assert_eq!(h.session.phase(), Phase::Loaded);
    }

    #[tokio::test]
    async fn clear_saved_empties_memory_and_disk_and_survives_restart() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().to_path_buf();

        let mut h = harness_at("London", None, tmp);
        h.session.search("london").await;
        assert!(!h.session.saved_locations().is_empty());

        h.session.clear_saved();
        assert!(h.session.saved_locations().is_empty());
        // Current weather unaffected.
        assert!(h.session.weather().is_some());
        assert_eq!(h.session.store.saved_locations().expect("read"), None);

        // A fresh session over the same store starts with no saved locations.
        let calls = Arc::new(Calls::default());
        let api = MockApi::new(Arc::clone(&calls), "London");
        let locator = MockLocator { calls: Arc::clone(&calls), result: None };
        let mut restarted = Session::new(Box::new(api), Box::new(locator), Store::at(dir));
        restarted.bootstrap().await;
        assert!(restarted.saved_locations().is_empty());
    }

    #[tokio::test]
    async fn forecast_view_slices_without_truncating_the_data() {
        let mut h = harness("London", None);
        h.session.search("london").await;

        // Daily mode: one aggregate per day, capped at a week.
        match h.session.forecast_view() {
            ForecastView::Daily(days) => {
                assert_eq!(days.len(), 5);
                assert_eq!(days[0].day, "2024-01-01");
            }
            ForecastView::Hourly(_) => panic!("default view should be daily"),
        }

        h.session.set_view_mode(ViewMode::Hourly);
        match h.session.forecast_view() {
            ForecastView::Hourly(slots) => assert_eq!(slots.len(), 24),
            ForecastView::Daily(_) => panic!("view should be hourly"),
        }

        // The underlying sample list is untouched by either view.
        assert_eq!(h.session.forecast().len(), 40);
    }

    #[tokio::test]
    async fn toggles_are_in_memory_only() {
        let mut h = harness("London", None);

        h.session.toggle_unit();
        h.session.toggle_theme();
        h.session.set_view_mode(ViewMode::Hourly);

        let prefs = h.session.preferences();
        assert_eq!(prefs.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(prefs.theme, crate::model::Theme::Dark);
        assert_eq!(prefs.view, ViewMode::Hourly);

        // No network, no storage.
        assert_eq!(h.calls.current_city.load(Ordering::SeqCst), 0);
        assert_eq!(h.session.store.last_weather().expect("read"), None);

        h.session.toggle_unit();
        assert_eq!(h.session.preferences().unit, TemperatureUnit::Celsius);
    }
}
