//! Coordinate resolution for a single firm record.

use crate::app_config::GpsPolicy;
use crate::error::UnresolvableLocation;
use crate::geocode::Geocoder;
use crate::model::{Coordinate, FirmRecord};

/// Resolves firm records to map coordinates.
///
/// GPS fields on the record are authoritative; the geocoder is only asked
/// when they are missing (or rejected under [`GpsPolicy::Validate`]).
pub struct CoordinateResolver<G> {
    geocoder: G,
    gps_policy: GpsPolicy,
}

impl<G: Geocoder> CoordinateResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self::with_policy(geocoder, GpsPolicy::default())
    }

    pub fn with_policy(geocoder: G, gps_policy: GpsPolicy) -> Self {
        Self {
            geocoder,
            gps_policy,
        }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolve `record` to a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvableLocation`] when the record has no postcode, the
    /// lookup finds nothing, or the lookup itself fails. Lookup failures are
    /// logged here; callers only need to skip the row.
    pub async fn resolve(&self, record: &FirmRecord) -> Result<Coordinate, UnresolvableLocation> {
        let Some(postcode) = record.postcode() else {
            return Err(unresolvable(record, "", "no postcode"));
        };

        if let Some(gps) = record.gps() {
            if gps.is_within_wgs84_bounds() {
                return Ok(gps);
            }
            match self.gps_policy {
                GpsPolicy::Trust => {
                    tracing::warn!(
                        firm = %record.name,
                        lat = gps.lat,
                        lng = gps.lng,
                        "GPS coordinates outside WGS84 bounds; plotting as given"
                    );
                    return Ok(gps);
                }
                GpsPolicy::Validate => {
                    tracing::warn!(
                        firm = %record.name,
                        lat = gps.lat,
                        lng = gps.lng,
                        "GPS coordinates outside WGS84 bounds; falling back to postcode"
                    );
                }
            }
        }

        match self.geocoder.lookup(postcode).await {
            Ok(Some(coordinate)) => Ok(coordinate),
            Ok(None) => {
                tracing::debug!(firm = %record.name, postcode, "no coordinates for postcode");
                Err(unresolvable(record, postcode, "postcode not found"))
            }
            Err(e) => {
                tracing::warn!(
                    firm = %record.name,
                    postcode,
                    error = %e,
                    "postcode lookup failed; skipping firm"
                );
                Err(unresolvable(record, postcode, &e.to_string()))
            }
        }
    }
}

fn unresolvable(record: &FirmRecord, postcode: &str, reason: &str) -> UnresolvableLocation {
    UnresolvableLocation {
        name: record.name.clone(),
        postcode: postcode.to_string(),
        reason: reason.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeGeocoder;
    use super::*;

    fn record(postcode: Option<&str>, gps: Option<(f64, f64)>) -> FirmRecord {
        FirmRecord {
            name: "Acme Ltd".to_string(),
            postcode: postcode.map(str::to_string),
            gps_latitude: gps.map(|g| g.0),
            gps_longitude: gps.map(|g| g.1),
            ..FirmRecord::default()
        }
    }

    #[tokio::test]
    async fn gps_takes_precedence_and_skips_lookup() {
        let resolver = CoordinateResolver::new(FakeGeocoder::with(&[("AB1 2CD", 57.1, -2.1)]));

        let coordinate = resolver
            .resolve(&record(Some("AB1 2CD"), Some((51.5, -0.1))))
            .await
            .expect("gps should resolve");

        assert_eq!(coordinate, Coordinate::new(51.5, -0.1));
        assert!(resolver.geocoder().calls().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_postcode_lookup() {
        let resolver = CoordinateResolver::new(FakeGeocoder::with(&[("AB1 2CD", 57.1, -2.1)]));

        let coordinate = resolver
            .resolve(&record(Some(" AB1 2CD "), None))
            .await
            .expect("postcode should resolve");

        assert_eq!(coordinate, Coordinate::new(57.1, -2.1));
        assert_eq!(resolver.geocoder().calls(), vec!["AB1 2CD"]);
    }

    #[tokio::test]
    async fn unknown_postcode_is_unresolvable() {
        let resolver = CoordinateResolver::new(FakeGeocoder::default());

        let err = resolver
            .resolve(&record(Some("ZZ9 9ZZ"), None))
            .await
            .expect_err("should not resolve");

        assert_eq!(err.postcode, "ZZ9 9ZZ");
        assert_eq!(err.reason, "postcode not found");
    }

    #[tokio::test]
    async fn lookup_error_is_unresolvable() {
        let geocoder = FakeGeocoder {
            failing: vec!["AB1 2CD".to_string()],
            ..FakeGeocoder::default()
        };
        let resolver = CoordinateResolver::new(geocoder);

        let err = resolver
            .resolve(&record(Some("AB1 2CD"), None))
            .await
            .expect_err("should not resolve");

        assert_eq!(err.name, "Acme Ltd");
        assert!(err.reason.contains("unavailable"), "reason: {}", err.reason);
    }

    #[tokio::test]
    async fn blank_postcode_is_never_looked_up_even_with_gps() {
        let resolver = CoordinateResolver::new(FakeGeocoder::default());

        let result = resolver.resolve(&record(Some("  "), Some((51.5, -0.1)))).await;

        assert!(result.is_err());
        assert!(resolver.geocoder().calls().is_empty());
    }

    #[tokio::test]
    async fn trust_policy_plots_out_of_range_gps() {
        let resolver = CoordinateResolver::with_policy(FakeGeocoder::default(), GpsPolicy::Trust);

        let coordinate = resolver
            .resolve(&record(Some("AB1 2CD"), Some((999.0, 999.0))))
            .await
            .expect("trusted gps should resolve");

        assert_eq!(coordinate, Coordinate::new(999.0, 999.0));
    }

    #[tokio::test]
    async fn validate_policy_falls_back_for_out_of_range_gps() {
        let resolver = CoordinateResolver::with_policy(
            FakeGeocoder::with(&[("AB1 2CD", 57.1, -2.1)]),
            GpsPolicy::Validate,
        );

        let coordinate = resolver
            .resolve(&record(Some("AB1 2CD"), Some((999.0, 999.0))))
            .await
            .expect("postcode fallback should resolve");

        assert_eq!(coordinate, Coordinate::new(57.1, -2.1));
        assert_eq!(resolver.geocoder().calls(), vec!["AB1 2CD"]);
    }
}
