pub mod forecast;
pub mod geocoding;

pub use forecast::{ForecastError, ForecastProvider, OpenMeteoForecast};
pub use geocoding::{GeocodeCandidate, GeocodeError, Geocoder, OpenMeteoGeocoder};
