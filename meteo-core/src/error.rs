use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the address API. An empty result is not one of them.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Failed to send request to the address API")]
    Transport(#[source] reqwest::Error),

    #[error("Address API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse address API JSON")]
    Parse(#[source] serde_json::Error),

    #[error("Address API response has no `features` array")]
    MissingFeatures,
}

/// Which OpenWeather endpoint a [`WeatherError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
    City,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "current weather",
            Endpoint::Forecast => "5-day forecast",
            Endpoint::City => "city weather",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to send request to OpenWeather ({endpoint})")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("OpenWeather {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to parse OpenWeather {endpoint} JSON")]
    Parse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("OpenWeather {endpoint} response is missing {what}")]
    Malformed {
        endpoint: Endpoint,
        what: &'static str,
    },

    #[error("OpenWeather returned code {code}: {message}")]
    Provider { code: String, message: String },
}

impl WeatherError {
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            WeatherError::Transport { endpoint, .. }
            | WeatherError::Status { endpoint, .. }
            | WeatherError::Parse { endpoint, .. }
            | WeatherError::Malformed { endpoint, .. } => Some(*endpoint),
            WeatherError::Provider { .. } => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "The OpenWeatherMap API key is not set.\n\
         Hint: export OPENWEATHERMAP_API_KEY=<key> or run `meteo configure`."
    )]
    MissingCredential,
}

/// Everything that can stop an address-to-weather lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Please enter an address.")]
    EmptyAddress,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Address lookup failed")]
    Geocode(#[from] GeocodeError),

    #[error("Weather lookup failed")]
    Weather(#[from] WeatherError),
}
