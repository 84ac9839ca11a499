//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather HTTP client and shared domain models
//! - Daily aggregation of the 3-hour forecast
//! - Local persistence for the last lookup and saved locations
//! - The session state machine driving the interactive UI
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod model;
pub mod session;
pub mod store;

pub use client::WeatherClient;
pub use config::Config;
pub use error::{Error, Result};
pub use forecast::aggregate_daily;
pub use geo::{Coordinates, IpLocator};
pub use model::{
    DailyAggregate, ForecastSample, Preferences, SavedLocations, TemperatureUnit, Theme, ViewMode,
    WeatherRecord,
};
pub use session::{ForecastView, Notice, Phase, Session};
pub use store::Store;
