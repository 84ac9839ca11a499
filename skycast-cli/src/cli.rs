use clap::{Parser, Subcommand};
use skycast_core::{Config, ForecastView, Preferences, WeatherClient, aggregate_daily};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather lookups in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather for a location and exit.
    Show {
        /// City or location name.
        location: String,
    },

    /// Show the forecast for a location and exit.
    Forecast {
        /// City or location name.
        location: String,

        /// Show 3-hour slots instead of daily averages.
        #[arg(long)]
        hourly: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure) => configure(),
            Some(Command::Show { location }) => show(&location).await,
            Some(Command::Forecast { location, hourly }) => forecast(&location, hourly).await,
            None => interactive::run().await,
        }
    }
}

fn build_client() -> anyhow::Result<WeatherClient> {
    let config = Config::load()?;
    let api_key = config.resolve_api_key()?;
    Ok(WeatherClient::new(api_key)?)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()?;

    config.api_key = Some(key.trim().to_string());
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(location: &str) -> anyhow::Result<()> {
    let client = build_client()?;
    let record = client.current_by_city(location).await?;
    println!("{}", render::weather_card(&record, Preferences::default()));
    Ok(())
}

async fn forecast(location: &str, hourly: bool) -> anyhow::Result<()> {
    let client = build_client()?;
    let samples = client.forecast_by_city(location).await?;

    let view = if hourly {
        ForecastView::Hourly(samples.iter().take(24).cloned().collect())
    } else {
        ForecastView::Daily(aggregate_daily(&samples))
    };

    println!("{}", render::forecast_section(&view, Preferences::default()));
    Ok(())
}
