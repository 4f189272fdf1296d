//! Plain-text rendering of lookup results.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use meteo_core::{
    CityWeather, CurrentConditions, ForecastSeries, LocationRecord, LookupError, Units, icon_url,
};

const BAR_WIDTH: usize = 30;

/// Uppercase the first character, the way descriptions are shown.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn location(record: &LocationRecord) -> String {
    format!(
        "Address:   {}\nLatitude:  {}\nLongitude: {}\n",
        record.label, record.coordinates.latitude, record.coordinates.longitude
    )
}

pub fn current(conditions: &CurrentConditions, units: Units) -> String {
    current_in(conditions, units, &Local)
}

pub fn forecast(series: &ForecastSeries, units: Units) -> String {
    forecast_in(series, units, &Local)
}

fn local<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(fmt).to_string()
}

pub(crate) fn current_in<Tz: TimeZone>(c: &CurrentConditions, units: Units, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let deg = units.temperature_symbol();
    let speed = units.speed_symbol();

    let wind = match c.wind_direction {
        Some(direction) => format!("{} {speed}, direction {direction}°", c.wind_speed),
        None => format!("{} {speed}", c.wind_speed),
    };

    let mut lines = vec![
        format!("Observed {}", local(&c.observed_at, tz, "%d/%m/%Y %H:%M")),
        format!("Place:       {}, {}", c.place_name, c.country_code),
        format!("Conditions:  {}", capitalize(&c.description)),
        format!(
            "Temperature: {}{deg} (feels like {}{deg})",
            c.temperature, c.feels_like
        ),
        format!("Min / Max:   {}{deg} / {}{deg}", c.temp_min, c.temp_max),
        format!("Humidity:    {}% / Pressure: {} hPa", c.humidity, c.pressure),
        format!("Wind:        {wind}"),
        format!(
            "Sunrise:     {} / Sunset: {}",
            local(&c.sunrise, tz, "%H:%M"),
            local(&c.sunset, tz, "%H:%M")
        ),
    ];
    if let Some(code) = &c.icon {
        lines.push(format!("Icon:        {}", icon_url(code)));
    }

    block(lines)
}

/// One row per sample of the display window, with a temperature bar.
pub(crate) fn forecast_in<Tz: TimeZone>(series: &ForecastSeries, units: Units, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let window = series.window();
    if window.is_empty() {
        return "No forecast data.\n".to_string();
    }

    let (min, max) = window.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
        (lo.min(s.temperature), hi.max(s.temperature))
    });

    let deg = units.temperature_symbol();
    let mut lines = vec![format!("5-day forecast ({} samples)", window.len())];

    lines.extend(window.iter().map(|sample| {
        format!(
            "{}  {:>6.1}{deg}  {:>3}%  {:<width$}  {}",
            local(&sample.at, tz, "%d/%m %H:%M"),
            sample.temperature,
            sample.humidity,
            bar(sample.temperature, min, max),
            capitalize(&sample.description),
            width = BAR_WIDTH,
        )
    }));

    block(lines)
}

/// Join lines with a trailing newline.
fn block(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn bar(value: f64, min: f64, max: f64) -> String {
    let span = max - min;
    let len = if span <= f64::EPSILON {
        BAR_WIDTH / 2
    } else {
        (((value - min) / span) * (BAR_WIDTH - 1) as f64).round() as usize + 1
    };
    "█".repeat(len.min(BAR_WIDTH))
}

pub fn city(name: &str, weather: &CityWeather) -> String {
    let mut lines = vec![
        format!("{name}: {}", capitalize(&weather.description)),
        format!("Temperature: {}°C", weather.temp),
        format!("Humidity:    {}%", weather.humidity),
        format!("Wind:        {} m/s", weather.wind_speed),
    ];
    if !weather.icon.is_empty() {
        lines.push(format!("Icon:        {}", icon_url(&weather.icon)));
    }
    block(lines)
}

/// User-facing text for every way a lookup can fail.
pub fn lookup_error(err: &LookupError) -> String {
    let headline = match err {
        LookupError::EmptyAddress => return err.to_string(),
        LookupError::Config(inner) => return inner.to_string(),
        LookupError::Geocode(_) => "Could not search for the address.",
        LookupError::Weather(_) => "Could not retrieve weather data.",
    };

    let mut lines = vec![headline.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        lines.push(format!("  caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use meteo_core::{ConfigError, Coordinates, Endpoint, ForecastSample, WeatherError};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            observed_at: ts(1718366400),
            place_name: "Paris".into(),
            country_code: "FR".into(),
            description: "ciel dégagé".into(),
            icon: Some("01d".into()),
            temperature: 21.4,
            feels_like: 20.9,
            temp_min: 19.8,
            temp_max: 23.1,
            humidity: 52,
            pressure: 1018,
            wind_speed: 3.6,
            wind_direction: Some(240),
            sunrise: ts(1718336700),
            sunset: ts(1718394900),
        }
    }

    #[test]
    fn capitalize_handles_accents_and_empty() {
        assert_eq!(capitalize("éclaircies"), "Éclaircies");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn location_lists_label_and_coordinates() {
        let text = location(&LocationRecord {
            label: "55 Rue du Faubourg Saint-Honoré 75008 Paris".into(),
            city: "Paris".into(),
            postcode: "75008".into(),
            coordinates: Coordinates::new(48.871325, 2.316754),
        });

        assert!(text.contains("75008 Paris"));
        assert!(text.contains("Latitude:  48.871325"));
        assert!(text.contains("Longitude: 2.316754"));
    }

    #[test]
    fn current_shows_every_field_in_utc() {
        let text = current_in(&conditions(), Units::Metric, &Utc);

        assert!(text.contains("Observed 14/06/2024 12:00"));
        assert!(text.contains("Paris, FR"));
        assert!(text.contains("Ciel dégagé"));
        assert!(text.contains("21.4°C (feels like 20.9°C)"));
        assert!(text.contains("52% / Pressure: 1018 hPa"));
        assert!(text.contains("3.6 m/s, direction 240°"));
        assert!(text.contains("Sunrise:     03:45 / Sunset: 19:55"));
        assert!(text.contains("http://openweathermap.org/img/wn/01d@2x.png"));
    }

    #[test]
    fn forecast_renders_only_the_window() {
        let samples = (0..50)
            .map(|i| ForecastSample {
                at: ts(1718366400 + 10800 * i),
                temperature: 10.0 + (i % 8) as f64,
                humidity: 70,
                description: "pluie".into(),
                icon: None,
            })
            .collect();
        let text = forecast_in(&ForecastSeries::new(samples), Units::Metric, &Utc);

        // header plus one row per sample
        assert_eq!(text.lines().count(), 41);
        assert!(text.starts_with("5-day forecast (40 samples)"));
        assert!(text.lines().nth(1).unwrap().starts_with("14/06 12:00"));
    }

    #[test]
    fn forecast_handles_empty_series() {
        let text = forecast_in(&ForecastSeries::default(), Units::Metric, &Utc);
        assert_eq!(text, "No forecast data.\n");
    }

    #[test]
    fn city_block_lists_fields_one_per_line() {
        let text = city(
            "Lyon",
            &CityWeather {
                description: "ciel dégagé".into(),
                temp: 24.5,
                humidity: 40,
                wind_speed: 1.5,
                icon: String::new(),
            },
        );

        assert_eq!(
            text,
            "Lyon: Ciel dégagé\nTemperature: 24.5°C\nHumidity:    40%\nWind:        1.5 m/s\n"
        );
    }

    #[test]
    fn bars_scale_between_min_and_max() {
        assert_eq!(bar(10.0, 10.0, 20.0).chars().count(), 1);
        assert_eq!(bar(20.0, 10.0, 20.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(5.0, 5.0, 5.0).chars().count(), BAR_WIDTH / 2);
    }

    #[test]
    fn every_error_kind_gets_a_message() {
        assert_eq!(
            lookup_error(&LookupError::EmptyAddress),
            "Please enter an address."
        );
        assert!(
            lookup_error(&LookupError::Config(ConfigError::MissingCredential))
                .contains("OPENWEATHERMAP_API_KEY")
        );

        let weather = LookupError::Weather(WeatherError::Malformed {
            endpoint: Endpoint::Forecast,
            what: "`list`",
        });
        let text = lookup_error(&weather);
        assert!(text.starts_with("Could not retrieve weather data."));
        assert!(text.contains("5-day forecast response is missing `list`"));
    }
}
