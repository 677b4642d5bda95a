use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require, ValidationError, ValidationResult};
use crate::location::GpsCoordinates;

/// One recorded custody transfer.
///
/// A stored transfer always carries a timestamp. Transfers have no identity
/// of their own: they exist only as entries of a product's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub location: String,
    pub transferred_by: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<GpsCoordinates>,
}

/// A transfer as submitted by a caller, before the store stamps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    pub location: String,
    pub transferred_by: String,
    /// Caller-supplied time of the transfer. When absent the store assigns
    /// the append time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<GpsCoordinates>,
}

impl NewTransfer {
    pub fn new(location: impl Into<String>, transferred_by: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            transferred_by: transferred_by.into(),
            timestamp: None,
            gps_coordinates: None,
        }
    }

    pub fn with_gps(mut self, coordinates: GpsCoordinates) -> Self {
        self.gps_coordinates = Some(coordinates);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check required fields and coordinates.
    pub fn validate(&self) -> ValidationResult<()> {
        require("location", &self.location)?;
        require("transferredBy", &self.transferred_by)?;
        if let Some(coords) = &self.gps_coordinates {
            coords.validate()?;
        }
        Ok(())
    }
}

/// Assert that timestamps never decrease along a transfer sequence.
///
/// Equal neighbouring timestamps are allowed.
pub fn check_monotonic(history: &[Transfer]) -> ValidationResult<()> {
    for (offset, pair) in history.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(ValidationError::NonMonotonicTimestamp {
                index: offset + 1,
                previous: pair[0].timestamp,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn stored(location: &str, secs: i64) -> Transfer {
        Transfer {
            location: location.into(),
            transferred_by: "Alice".into(),
            timestamp: at(secs),
            gps_coordinates: None,
        }
    }

    #[test]
    fn validate_requires_location_and_party() {
        assert_eq!(
            NewTransfer::new("", "Alice").validate(),
            Err(ValidationError::MissingField("location"))
        );
        assert_eq!(
            NewTransfer::new("Warehouse 2", "  ").validate(),
            Err(ValidationError::MissingField("transferredBy"))
        );
        assert!(NewTransfer::new("Warehouse 2", "Alice").validate().is_ok());
    }

    #[test]
    fn validate_checks_coordinates() {
        let transfer = NewTransfer {
            gps_coordinates: Some(GpsCoordinates {
                latitude: 120.0,
                longitude: 0.0,
            }),
            ..NewTransfer::new("Dock", "Bob")
        };
        assert!(matches!(
            transfer.validate(),
            Err(ValidationError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn monotonic_allows_equal_timestamps() {
        let history = vec![stored("a", 0), stored("b", 0), stored("c", 5)];
        assert!(check_monotonic(&history).is_ok());
    }

    #[test]
    fn monotonic_reports_first_regression() {
        let history = vec![stored("a", 0), stored("b", 10), stored("c", 3)];
        let err = check_monotonic(&history).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonMonotonicTimestamp {
                index: 2,
                previous: at(10),
                timestamp: at(3),
            }
        );
    }

    #[test]
    fn monotonic_accepts_short_histories() {
        assert!(check_monotonic(&[]).is_ok());
        assert!(check_monotonic(&[stored("a", 0)]).is_ok());
    }

    #[test]
    fn omitted_optionals_stay_off_the_wire() {
        let json = serde_json::to_value(NewTransfer::new("Warehouse 2", "Alice")).unwrap();
        assert_eq!(json["location"], "Warehouse 2");
        assert_eq!(json["transferredBy"], "Alice");
        assert!(json.get("timestamp").is_none());
        assert!(json.get("gpsCoordinates").is_none());
    }

    #[test]
    fn parses_wire_shape_with_coordinates() {
        let transfer: NewTransfer = serde_json::from_str(
            r#"{"location":"Port","transferredBy":"Carol","gpsCoordinates":{"latitude":1.5,"longitude":2.5}}"#,
        )
        .unwrap();
        assert_eq!(
            transfer.gps_coordinates,
            Some(GpsCoordinates {
                latitude: 1.5,
                longitude: 2.5
            })
        );
        assert!(transfer.timestamp.is_none());
    }
}
