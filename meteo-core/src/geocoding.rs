//! Address search against the French national address API (BAN).
//!
//! <https://adresse.data.gouv.fr/api-doc/adresse>

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::fmt::Debug;

use crate::{
    config::DEFAULT_GEOCODING_URL,
    error::GeocodeError,
    model::{Coordinates, LocationRecord},
    provider::truncate_body,
};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Free-text address lookup used by the lookup pipeline.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Best match for `address`, or `None` when the provider has no match.
    async fn resolve(&self, address: &str) -> Result<Option<LocationRecord>, GeocodeError>;

    /// Autocomplete labels. Best effort: failures yield an empty list.
    async fn suggest(&self, query: &str, limit: usize) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct AddressResolver {
    base_url: String,
    http: Client,
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_GEOCODING_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    async fn search(&self, query: &[(&str, String)]) -> Result<BanResponse, GeocodeError> {
        let url = format!("{}/search/", self.base_url.trim_end_matches('/'));
        tracing::debug!(%url, ?query, "searching address API");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(GeocodeError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(GeocodeError::Transport)?;

        if !status.is_success() {
            return Err(GeocodeError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(GeocodeError::Parse)
    }
}

#[async_trait]
impl Geocoder for AddressResolver {
    async fn resolve(&self, address: &str) -> Result<Option<LocationRecord>, GeocodeError> {
        let query = [("q", address.to_string()), ("limit", "1".to_string())];

        let features = self
            .search(&query)
            .await?
            .features
            .ok_or(GeocodeError::MissingFeatures)?;

        // `"features": null` means no match, same as an empty array
        let record = features
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(BanFeature::into_record);
        match &record {
            Some(found) => tracing::debug!(label = %found.label, "address resolved"),
            None => tracing::debug!(address, "no address match"),
        }

        Ok(record)
    }

    async fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("autocomplete", "1".to_string()),
        ];

        match self.search(&params).await {
            Ok(response) => response
                .features
                .flatten()
                .unwrap_or_default()
                .into_iter()
                .map(|feature| feature.properties.label)
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, query, "address suggestions unavailable");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct BanResponse {
    /// Outer `None`: key absent. Inner `None`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    features: Option<Option<Vec<BanFeature>>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct BanFeature {
    properties: BanProperties,
    geometry: BanGeometry,
}

impl BanFeature {
    fn into_record(self) -> LocationRecord {
        // GeoJSON order: [longitude, latitude]
        let (longitude, latitude) = self.geometry.coordinates;

        LocationRecord {
            label: self.properties.label,
            city: self.properties.city.unwrap_or_default(),
            postcode: self.properties.postcode.unwrap_or_default(),
            coordinates: Coordinates::new(latitude, longitude),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BanProperties {
    label: String,
    city: Option<String>,
    postcode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BanGeometry {
    coordinates: (f64, f64),
}
