//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - Address search against the French national address API
//! - An OpenWeatherMap client (current conditions, 5-day forecast, city lookup)
//! - The lookup pipeline tying the two together
//!
//! It is used by `meteo-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod geocoding;
pub mod lookup;
pub mod model;
pub mod provider;

pub use config::{ApiKey, Config, Endpoints};
pub use error::{ConfigError, Endpoint, GeocodeError, LookupError, WeatherError};
pub use geocoding::{AddressResolver, Geocoder};
pub use lookup::{LookupOutcome, WeatherLookup, WeatherReport};
pub use model::{
    CityWeather, Coordinates, CurrentConditions, FORECAST_WINDOW, ForecastSample, ForecastSeries,
    LocationRecord, QueryOptions, Units,
};
pub use provider::{OpenWeatherClient, WeatherProvider, openweather::icon_url};
