use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use meteo_core::{
    AddressResolver, Config, Geocoder, LookupOutcome, OpenWeatherClient, Units, WeatherLookup,
    WeatherProvider,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Weather for French addresses")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key, language and units.
    Configure,

    /// Show current weather and the 5-day forecast for an address.
    Show {
        /// Free-text French address; prompted for when absent.
        address: Option<String>,

        /// Language of weather descriptions, e.g. "fr" or "en".
        #[arg(long)]
        lang: Option<String>,

        /// Unit system: metric, imperial or standard.
        #[arg(long)]
        units: Option<String>,

        /// Choose among address suggestions before looking up the weather.
        #[arg(long)]
        pick: bool,
    },

    /// List address suggestions for a partial query.
    Suggest {
        query: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Simplified current weather by city name.
    City { name: String },

    /// Print the path of the configuration file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show {
                address,
                lang,
                units,
                pick,
            } => show(address, lang, units, pick).await?,
            Command::Suggest { query, limit } => suggest(&query, limit).await?,
            Command::City { name } => city(&name).await?,
            Command::ConfigPath => println!("{}", Config::config_file_path()?.display()),
        }

        Ok(())
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);
    // refuse to save a blank key
    config.api_key_with_env(None)?;

    let defaults = config.query_options();
    let lang = Text::new("Language:")
        .with_default(&defaults.lang)
        .prompt()?;

    let choices = vec![Units::Metric, Units::Imperial, Units::Standard];
    let cursor = choices
        .iter()
        .position(|u| *u == defaults.units)
        .unwrap_or_default();
    let units = Select::new("Units:", choices)
        .with_starting_cursor(cursor)
        .prompt()?;

    config.lang = Some(lang);
    config.units = Some(units);

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(
    address: Option<String>,
    lang: Option<String>,
    units: Option<String>,
    pick: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(lang) = lang {
        config.lang = Some(lang);
    }
    if let Some(units) = units {
        config.units = Some(Units::try_from(units.as_str())?);
    }

    let lookup =
        WeatherLookup::from_config(&config).map_err(|err| anyhow!(render::lookup_error(&err)))?;

    let address = match address {
        Some(address) => address,
        None => Text::new("Address:").prompt()?,
    };
    let address = if pick {
        pick_address(&lookup, address).await?
    } else {
        address
    };

    let units = lookup.options().units;
    match lookup.run(&address).await {
        Ok(LookupOutcome::Found(report)) => {
            println!("{}", render::location(&report.location));
            println!("{}", render::current(&report.current, units));
            print!("{}", render::forecast(&report.forecast, units));
            Ok(())
        }
        Ok(LookupOutcome::NotFound { address }) => bail!("Address not found: {address}"),
        Err(err) => bail!(render::lookup_error(&err)),
    }
}

async fn pick_address<G: Geocoder, W: WeatherProvider>(
    lookup: &WeatherLookup<G, W>,
    typed: String,
) -> anyhow::Result<String> {
    let suggestions = lookup.suggest(&typed).await;
    if suggestions.is_empty() {
        tracing::info!("no suggestions, using the address as typed");
        return Ok(typed);
    }

    Select::new("Pick an address:", suggestions)
        .prompt()
        .context("No address selected")
}

async fn suggest(query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let resolver = AddressResolver::with_base_url(&config.endpoints.geocoding);
    let limit = limit.filter(|l| *l > 0).unwrap_or_else(|| config.suggestion_limit());

    let suggestions = resolver.suggest(query, limit).await;
    if suggestions.is_empty() {
        println!("No suggestions.");
    }
    for suggestion in suggestions {
        println!("- {suggestion}");
    }
    Ok(())
}

async fn city(name: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = OpenWeatherClient::with_base_url(config.api_key()?, &config.endpoints.weather);

    let weather = client
        .city_weather(name)
        .await
        .with_context(|| format!("Could not retrieve weather for '{name}'"))?;

    print!("{}", render::city(name, &weather));
    Ok(())
}
