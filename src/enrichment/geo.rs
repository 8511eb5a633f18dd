use std::net::IpAddr;
use std::path::Path;

use maxminddb::{geoip2, Reader};
use serde::{Deserialize, Serialize};

/// Result of an IP location lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.city, &self.country) {
            (Some(city), Some(country)) => write!(f, "{}, {}", city, country),
            (None, Some(country)) => write!(f, "{}", country),
            (Some(city), None) => write!(f, "{}", city),
            (None, None) => write!(f, "Unknown"),
        }
    }
}

/// Best-effort IP to location lookup.
///
/// A `None` result means "Unknown"; implementations must never block a
/// session beyond a bounded in-memory read and must never fail the caller.
pub trait GeoLocator: Send + Sync {
    fn locate(&self, ip: IpAddr) -> Option<Location>;
}

/// Locator backed by a MaxMind GeoIP2 City database loaded into memory.
pub struct MaxMindLocator {
    reader: Reader<Vec<u8>>,
}

impl MaxMindLocator {
    pub fn open(path: &Path) -> Result<Self, maxminddb::MaxMindDBError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self { reader })
    }
}

impl GeoLocator for MaxMindLocator {
    fn locate(&self, ip: IpAddr) -> Option<Location> {
        let city: geoip2::City = self.reader.lookup(ip).ok()?;

        let country = city
            .country
            .and_then(|c| c.names)
            .and_then(|n| n.get("en").map(|s| s.to_string()));
        let city_name = city
            .city
            .and_then(|c| c.names)
            .and_then(|n| n.get("en").map(|s| s.to_string()));
        let (latitude, longitude) = city
            .location
            .map(|l| (l.latitude, l.longitude))
            .unwrap_or((None, None));

        Some(Location {
            country,
            city: city_name,
            latitude,
            longitude,
        })
    }
}

/// Locator used when no database is configured; every lookup is "Unknown".
pub struct NullLocator;

impl GeoLocator for NullLocator {
    fn locate(&self, _ip: IpAddr) -> Option<Location> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_null_locator_is_unknown() {
        let locator = NullLocator;
        let ip = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));
        assert!(locator.locate(ip).is_none());
    }

    #[test]
    fn test_location_display_fallbacks() {
        let full = Location {
            country: Some(String::from("Netherlands")),
            city: Some(String::from("Amsterdam")),
            latitude: Some(52.37),
            longitude: Some(4.89),
        };
        assert_eq!(full.to_string(), "Amsterdam, Netherlands");

        let country_only = Location {
            country: Some(String::from("Netherlands")),
            city: None,
            latitude: None,
            longitude: None,
        };
        assert_eq!(country_only.to_string(), "Netherlands");

        let empty = Location {
            country: None,
            city: None,
            latitude: None,
            longitude: None,
        };
        assert_eq!(empty.to_string(), "Unknown");
    }

    #[test]
    fn test_open_missing_database_fails() {
        assert!(MaxMindLocator::open(Path::new("/nonexistent/geo.mmdb")).is_err());
    }
}
