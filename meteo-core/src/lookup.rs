//! Address-to-weather pipeline: resolve, then fetch current conditions and forecast.

use serde::Serialize;

use crate::{
    config::{ApiKey, Config},
    error::LookupError,
    geocoding::{AddressResolver, Geocoder},
    model::{CurrentConditions, ForecastSeries, LocationRecord, QueryOptions},
    provider::{OpenWeatherClient, WeatherProvider},
};

/// Everything needed to display one successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: LocationRecord,
    pub current: CurrentConditions,
    pub forecast: ForecastSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Box<WeatherReport>),
    /// The address API had no match. Not an error.
    NotFound { address: String },
}

#[derive(Debug)]
pub struct WeatherLookup<G, W> {
    geocoder: G,
    weather: W,
    options: QueryOptions,
    suggestion_limit: usize,
}

impl WeatherLookup<AddressResolver, OpenWeatherClient> {
    /// Build the real pipeline. Fails on a missing credential before any request.
    pub fn from_config(config: &Config) -> Result<Self, LookupError> {
        let api_key = config.api_key()?;
        Ok(Self::assemble(config, api_key))
    }

    /// Same as [`WeatherLookup::from_config`] with the environment value passed in.
    pub fn from_config_with_env(
        config: &Config,
        env_value: Option<&str>,
    ) -> Result<Self, LookupError> {
        let api_key = config.api_key_with_env(env_value)?;
        Ok(Self::assemble(config, api_key))
    }

    fn assemble(config: &Config, api_key: ApiKey) -> Self {
        let geocoder = AddressResolver::with_base_url(&config.endpoints.geocoding);
        let weather = OpenWeatherClient::with_base_url(api_key, &config.endpoints.weather);

        Self::new(geocoder, weather)
            .with_options(config.query_options())
            .with_suggestion_limit(config.suggestion_limit())
    }
}

impl<G: Geocoder, W: WeatherProvider> WeatherLookup<G, W> {
    pub fn new(geocoder: G, weather: W) -> Self {
        Self {
            geocoder,
            weather,
            options: QueryOptions::default(),
            suggestion_limit: crate::geocoding::DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Run the whole chain for one address.
    ///
    /// Stops at the first failure; a report is only produced when the
    /// address, the current conditions and the forecast all came back.
    pub async fn run(&self, address: &str) -> Result<LookupOutcome, LookupError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LookupError::EmptyAddress);
        }

        let Some(location) = self.geocoder.resolve(address).await? else {
            tracing::info!(address, "address not found");
            return Ok(LookupOutcome::NotFound {
                address: address.to_string(),
            });
        };

        let at = location.coordinates;
        let current = self.weather.current_conditions(at, &self.options).await?;
        let forecast = self.weather.forecast(at, &self.options).await?;

        tracing::info!(
            label = %location.label,
            samples = forecast.len(),
            "weather lookup complete"
        );

        Ok(LookupOutcome::Found(Box::new(WeatherReport {
            location,
            current,
            forecast,
        })))
    }

    pub async fn suggest(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.geocoder.suggest(query, self.suggestion_limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Endpoint, GeocodeError, WeatherError},
        model::{Coordinates, ForecastSample},
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        record: Option<LocationRecord>,
        resolve_calls: AtomicUsize,
        suggest_limits: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn resolve(&self, _address: &str) -> Result<Option<LocationRecord>, GeocodeError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.record.clone())
        }

        async fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
            self.suggest_limits.lock().unwrap().push(limit);
            vec![format!("{query} Paris")]
        }
    }

    #[derive(Debug, Default)]
    struct FakeWeather {
        fail_current: bool,
        seen: Mutex<Vec<(Coordinates, QueryOptions)>>,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current_conditions(
            &self,
            at: Coordinates,
            options: &QueryOptions,
        ) -> Result<CurrentConditions, WeatherError> {
            self.seen.lock().unwrap().push((at, options.clone()));
            if self.fail_current {
                return Err(WeatherError::Malformed {
                    endpoint: Endpoint::Current,
                    what: "everything",
                });
            }
            Ok(sample_conditions())
        }

        async fn forecast(
            &self,
            at: Coordinates,
            options: &QueryOptions,
        ) -> Result<ForecastSeries, WeatherError> {
            self.seen.lock().unwrap().push((at, options.clone()));
            let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
            Ok(ForecastSeries::new(vec![ForecastSample {
                at,
                temperature: 19.0,
                humidity: 60,
                description: "nuageux".into(),
                icon: Some("04d".into()),
            }]))
        }
    }

    fn sample_conditions() -> CurrentConditions {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        CurrentConditions {
            observed_at: t,
            place_name: "Paris".into(),
            country_code: "FR".into(),
            description: "ciel dégagé".into(),
            icon: Some("01d".into()),
            temperature: 21.0,
            feels_like: 20.5,
            temp_min: 19.0,
            temp_max: 23.0,
            humidity: 50,
            pressure: 1015,
            wind_speed: 3.0,
            wind_direction: Some(180),
            sunrise: t,
            sunset: t,
        }
    }

    fn paris() -> LocationRecord {
        LocationRecord {
            label: "55 Rue du Faubourg Saint-Honoré 75008 Paris".into(),
            city: "Paris".into(),
            postcode: "75008".into(),
            coordinates: Coordinates::new(48.8713, 2.3168),
        }
    }

    #[tokio::test]
    async fn empty_address_is_rejected_before_resolving() {
        let lookup = WeatherLookup::new(FakeGeocoder::default(), FakeWeather::default());

        let err = lookup.run("   ").await.unwrap_err();

        assert!(matches!(err, LookupError::EmptyAddress));
        assert_eq!(lookup.geocoder.resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn not_found_stops_before_weather() {
        let lookup = WeatherLookup::new(FakeGeocoder::default(), FakeWeather::default());

        let outcome = lookup.run(" nowhere ").await.unwrap();

        assert_eq!(
            outcome,
            LookupOutcome::NotFound {
                address: "nowhere".into()
            }
        );
        assert!(lookup.weather.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn found_address_feeds_coordinates_and_options_to_weather() {
        let geocoder = FakeGeocoder {
            record: Some(paris()),
            ..FakeGeocoder::default()
        };
        let options = QueryOptions {
            lang: "en".into(),
            units: crate::model::Units::Imperial,
        };
        let lookup =
            WeatherLookup::new(geocoder, FakeWeather::default()).with_options(options.clone());

        let outcome = lookup.run("55 Rue du Faubourg Saint-Honoré, Paris").await.unwrap();
        let LookupOutcome::Found(report) = outcome else {
            panic!("expected a report");
        };

        assert_eq!(report.location, paris());
        assert_eq!(report.current.description, "ciel dégagé");
        assert_eq!(report.forecast.len(), 1);

        let seen = lookup.weather.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for (at, opts) in seen.iter() {
            assert_eq!(*at, paris().coordinates);
            assert_eq!(*opts, options);
        }
    }

    #[tokio::test]
    async fn current_failure_yields_no_partial_report() {
        let geocoder = FakeGeocoder {
            record: Some(paris()),
            ..FakeGeocoder::default()
        };
        let weather = FakeWeather {
            fail_current: true,
            ..FakeWeather::default()
        };
        let lookup = WeatherLookup::new(geocoder, weather);

        let err = lookup.run("Paris").await.unwrap_err();

        assert!(matches!(err, LookupError::Weather(_)));
        // forecast is never attempted once current conditions failed
        assert_eq!(lookup.weather.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn suggest_uses_configured_limit_and_skips_blank_queries() {
        let lookup = WeatherLookup::new(FakeGeocoder::default(), FakeWeather::default())
            .with_suggestion_limit(3);

        assert!(lookup.suggest("  ").await.is_empty());
        assert_eq!(lookup.suggest("55 rue").await, vec!["55 rue Paris".to_string()]);
        assert_eq!(*lookup.geocoder.suggest_limits.lock().unwrap(), vec![3]);
    }

    #[test]
    fn from_config_requires_a_credential() {
        let err = WeatherLookup::from_config_with_env(&Config::default(), None).unwrap_err();
        assert!(matches!(err, LookupError::Config(_)));
    }
}
