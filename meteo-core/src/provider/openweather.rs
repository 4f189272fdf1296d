use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::{ApiKey, DEFAULT_WEATHER_URL},
    error::{Endpoint, WeatherError},
    model::{
        CityWeather, Coordinates, CurrentConditions, ForecastSample, ForecastSeries, QueryOptions,
    },
};

use super::{WeatherProvider, truncate_body};

/// URL of the 2x PNG for an OpenWeather icon code such as `"10d"`.
pub fn icon_url(code: &str) -> String {
    format!("http://openweathermap.org/img/wn/{code}@2x.png")
}

/// Client for the OpenWeatherMap 2.5 current-weather and forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: ApiKey,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: ApiKey) -> Self {
        Self::with_base_url(api_key, DEFAULT_WEATHER_URL)
    }

    pub fn with_base_url(api_key: ApiKey, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Simplified weather by city name.
    ///
    /// Unlike the coordinate endpoints, success is decided by the `cod` field
    /// of the body, so error statuses still yield the provider's message.
    pub async fn city_weather(&self, city: &str) -> Result<CityWeather, WeatherError> {
        let endpoint = Endpoint::City;
        let defaults = QueryOptions::default();

        let query = [
            ("q", city.to_string()),
            ("appid", self.api_key.as_str().to_string()),
            ("units", defaults.units.as_str().to_string()),
            ("lang", defaults.lang),
        ];

        let (status, body) = self.fetch(endpoint, "weather", &query).await?;

        let parsed: OwCityResponse = serde_json::from_str(&body).map_err(|source| {
            if status.is_success() {
                WeatherError::Parse { endpoint, source }
            } else {
                WeatherError::Status {
                    endpoint,
                    status,
                    body: truncate_body(&body),
                }
            }
        })?;

        if !parsed.cod.is_ok() {
            return Err(WeatherError::Provider {
                code: parsed.cod.to_string(),
                message: parsed
                    .message
                    .unwrap_or_else(|| "no message from provider".to_string()),
            });
        }

        let main = parsed.main.ok_or(WeatherError::Malformed {
            endpoint,
            what: "`main`",
        })?;
        let wind = parsed.wind.ok_or(WeatherError::Malformed {
            endpoint,
            what: "`wind`",
        })?;
        let weather = parsed
            .weather
            .into_iter()
            .next()
            .ok_or(WeatherError::Malformed {
                endpoint,
                what: "`weather[0]`",
            })?;

        Ok(CityWeather {
            description: weather.description,
            temp: main.temp,
            humidity: main.humidity,
            wind_speed: wind.speed,
            icon: weather.icon.unwrap_or_default(),
        })
    }

    fn coordinate_query(
        &self,
        at: Coordinates,
        options: &QueryOptions,
    ) -> [(&'static str, String); 5] {
        [
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("appid", self.api_key.as_str().to_string()),
            ("lang", options.lang.clone()),
            ("units", options.units.as_str().to_string()),
        ]
    }

    async fn fetch(
        &self,
        endpoint: Endpoint,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(reqwest::StatusCode, String), WeatherError> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        tracing::debug!(%url, %endpoint, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        Ok((status, body))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let (status, body) = self.fetch(endpoint, path, query).await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { endpoint, source })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_conditions(
        &self,
        at: Coordinates,
        options: &QueryOptions,
    ) -> Result<CurrentConditions, WeatherError> {
        let query = self.coordinate_query(at, options);
        let parsed: OwCurrentResponse = self.get_json(Endpoint::Current, "weather", &query).await?;
        parsed.into_conditions()
    }

    async fn forecast(
        &self,
        at: Coordinates,
        options: &QueryOptions,
    ) -> Result<ForecastSeries, WeatherError> {
        let query = self.coordinate_query(at, options);
        let parsed: OwForecastResponse =
            self.get_json(Endpoint::Forecast, "forecast", &query).await?;

        let samples = parsed
            .list
            .into_iter()
            .map(OwForecastEntry::into_sample)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(samples = samples.len(), "forecast received");
        Ok(ForecastSeries::new(samples))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwSampleMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    #[serde(default)]
    name: String,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions, WeatherError> {
        let endpoint = Endpoint::Current;
        let weather = self
            .weather
            .into_iter()
            .next()
            .ok_or(WeatherError::Malformed {
                endpoint,
                what: "`weather[0]`",
            })?;

        Ok(CurrentConditions {
            observed_at: unix_to_utc(self.dt, endpoint)?,
            place_name: self.name,
            country_code: self.sys.country,
            description: weather.description,
            icon: weather.icon,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            wind_direction: self.wind.deg,
            sunrise: unix_to_utc(self.sys.sunrise, endpoint)?,
            sunset: unix_to_utc(self.sys.sunset, endpoint)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwSampleMain,
    weather: Vec<OwWeather>,
}

impl OwForecastEntry {
    fn into_sample(self) -> Result<ForecastSample, WeatherError> {
        let endpoint = Endpoint::Forecast;
        let weather = self
            .weather
            .into_iter()
            .next()
            .ok_or(WeatherError::Malformed {
                endpoint,
                what: "`weather[0]` in a forecast entry",
            })?;

        Ok(ForecastSample {
            at: unix_to_utc(self.dt, endpoint)?,
            temperature: self.main.temp,
            humidity: self.main.humidity,
            description: weather.description,
            icon: weather.icon,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// `cod` arrives as `200` on success and as `"404"` on errors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(i64),
    Text(String),
}

impl OwCode {
    fn is_ok(&self) -> bool {
        match self {
            OwCode::Number(n) => *n == 200,
            OwCode::Text(s) => s.trim() == "200",
        }
    }
}

impl std::fmt::Display for OwCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwCode::Number(n) => write!(f, "{n}"),
            OwCode::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCityResponse {
    cod: OwCode,
    message: Option<String>,
    main: Option<OwSampleMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

fn unix_to_utc(ts: i64, endpoint: Endpoint) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0).ok_or(WeatherError::Malformed {
        endpoint,
        what: "a valid timestamp",
    })
}
