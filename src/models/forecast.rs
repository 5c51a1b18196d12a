use serde::{Deserialize, Serialize};

/// Hourly rows kept from a forecast payload.
pub const HOURLY_LIMIT: usize = 24;

/// Raw Open-Meteo forecast body. Every field is optional because the
/// provider omits blocks that were not requested and may emit nulls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub current_weather: Option<CurrentBlock>,
    #[serde(default)]
    pub daily: Option<DailyBlock>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentBlock {
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<i32>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyBlock {
    pub time: Option<Vec<String>>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub weathercode: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    pub time: Option<Vec<String>>,
    pub temperature_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub weathercode: Vec<Option<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub weather: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: String,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub weather: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    pub time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub weather: String,
}

/// Display-ready forecast derived from a [`ForecastPayload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub current: CurrentWeather,
    pub daily: Vec<DailyForecast>,
    pub hourly: Vec<HourlyForecast>,
}

/// Human-readable description of a WMO weather code.
/// See: https://open-meteo.com/en/docs#weathervariables
#[must_use]
pub fn describe_weather_code(code: Option<i32>) -> &'static str {
    match code {
        Some(0) => "Clear sky",
        Some(1) => "Mainly clear",
        Some(2) => "Partly cloudy",
        Some(3) => "Overcast",
        Some(45) => "Fog",
        Some(48) => "Depositing rime fog",
        Some(51) => "Light drizzle",
        Some(53) => "Moderate drizzle",
        Some(55) => "Dense drizzle",
        Some(56) => "Light freezing drizzle",
        Some(57) => "Dense freezing drizzle",
        Some(61) => "Slight rain",
        Some(63) => "Moderate rain",
        Some(65) => "Heavy rain",
        Some(66) => "Light freezing rain",
        Some(67) => "Heavy freezing rain",
        Some(71) => "Slight snow fall",
        Some(73) => "Moderate snow fall",
        Some(75) => "Heavy snow fall",
        Some(77) => "Snow grains",
        Some(80) => "Slight rain showers",
        Some(81) => "Moderate rain showers",
        Some(82) => "Violent rain showers",
        Some(85) => "Slight snow showers",
        Some(86) => "Heavy snow showers",
        Some(95) => "Thunderstorm",
        Some(96) => "Thunderstorm with slight hail",
        Some(99) => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

fn nth<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

impl From<ForecastPayload> for Forecast {
    fn from(payload: ForecastPayload) -> Self {
        let current = payload.current_weather.unwrap_or_default();
        let current = CurrentWeather {
            temperature: current.temperature,
            windspeed: current.windspeed,
            winddirection: current.winddirection,
            weather: describe_weather_code(current.weathercode).to_string(),
            time: current.time,
        };

        // A block is only usable when both its time axis and main series are present
        let daily = payload
            .daily
            .and_then(|d| {
                let times = d.time?;
                let max = d.temperature_2m_max?;
                Some(
                    times
                        .into_iter()
                        .enumerate()
                        .map(|(i, date)| DailyForecast {
                            date,
                            max_temp: nth(&max, i),
                            min_temp: nth(&d.temperature_2m_min, i),
                            weather: describe_weather_code(nth(&d.weathercode, i)).to_string(),
                        })
                        .collect(),
                )
            })
            .unwrap_or_default();

        let hourly = payload
            .hourly
            .and_then(|h| {
                let times = h.time?;
                let temps = h.temperature_2m?;
                Some(
                    times
                        .into_iter()
                        .take(HOURLY_LIMIT)
                        .enumerate()
                        .map(|(i, time)| HourlyForecast {
                            time,
                            temperature: nth(&temps, i),
                            humidity: nth(&h.relativehumidity_2m, i),
                            weather: describe_weather_code(nth(&h.weathercode, i)).to_string(),
                        })
                        .collect(),
                )
            })
            .unwrap_or_default();

        Self {
            current,
            daily,
            hourly,
        }
    }
}
