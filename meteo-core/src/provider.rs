use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{Coordinates, CurrentConditions, ForecastSeries, QueryOptions},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Coordinate-based weather source used by the lookup pipeline.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(
        &self,
        at: Coordinates,
        options: &QueryOptions,
    ) -> Result<CurrentConditions, WeatherError>;

    /// Full provider series; callers pick the window they display.
    async fn forecast(
        &self,
        at: Coordinates,
        options: &QueryOptions,
    ) -> Result<ForecastSeries, WeatherError>;
}

/// Cut long error bodies down before they land in messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_untouched() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn long_bodies_are_cut_on_char_boundaries() {
        let body = "é".repeat(300);
        let cut = truncate_body(&body);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
