use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::Text;
use weather_core::{Config, Intent, Screen, Session, provider_from_config, text};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for any city, with live suggestions")]
pub struct Cli {
    /// Geocoding API base URL (overrides config and environment).
    #[arg(long, global = true)]
    pub geocoding_url: Option<String>,

    /// Forecast API base URL (overrides config and environment).
    #[arg(long, global = true)]
    pub weather_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London".
        city: String,
    },

    /// Search interactively with live city suggestions.
    Search,

    /// Set the API endpoints and save them to the config file.
    Configure,

    /// Print the location of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli {
            geocoding_url,
            weather_url,
            command,
        } = self;

        match command {
            Command::Configure => configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            Command::Show { city } => show(load_config(geocoding_url, weather_url)?, city).await,
            Command::Search => interactive::run(load_config(geocoding_url, weather_url)?).await,
        }
    }
}

fn load_config(geocoding_url: Option<String>, weather_url: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = geocoding_url {
        config.geocoding_base_url = url;
    }
    if let Some(url) = weather_url {
        config.weather_base_url = url;
    }
    tracing::debug!("Using config: {:?}", config);
    Ok(config)
}

/// One-shot lookup: commit the city, wait for both stages, print the outcome.
async fn show(config: Config, city: String) -> Result<()> {
    let provider = provider_from_config(&config)?;
    let mut session = Session::new(provider, config.autocomplete.clone());

    session.apply(Intent::TextChanged(city));
    session.apply(Intent::Submit);

    let view = session.view();
    if let Some(err) = view.validation_error {
        return Err(err.into());
    }
    if view.committed_city.is_none() {
        return Err(anyhow!("Please enter a city name."));
    }

    while session.view().screen == Screen::Loading {
        session.next_event().await;
    }

    match session.view().screen {
        Screen::Result { place, weather } => {
            println!("{}", render::weather_card(&place, &weather));
            Ok(())
        }
        Screen::Error(err) => Err(err.into()),
        Screen::Empty | Screen::Loading => Err(anyhow!(text::ERROR_GENERIC)),
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load_file()?;

    config.geocoding_base_url = Text::new("Geocoding API base URL:")
        .with_default(&config.geocoding_base_url)
        .prompt()
        .context("Failed to read geocoding URL")?;

    config.weather_base_url = Text::new("Forecast API base URL:")
        .with_default(&config.weather_base_url)
        .prompt()
        .context("Failed to read forecast URL")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
