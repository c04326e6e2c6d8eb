//! Domain types shared by the consolidation pipeline, the map renderer and
//! the presentation layer.

use serde::{Deserialize, Serialize};

/// Relationship between an appointed representative and its principal.
///
/// Rows without a recognised `AR_relationship` value are styled and counted
/// as [`Relationship::Full`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    #[default]
    Full,
    Introducer,
}

impl Relationship {
    /// Classify a raw `AR_relationship` cell.
    ///
    /// Any value starting with `introducer` (case-insensitive) is an
    /// introducer relationship; everything else, including a missing cell,
    /// maps to [`Relationship::Full`].
    #[must_use]
    pub fn from_field(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().to_ascii_lowercase().starts_with("introducer") => {
                Relationship::Introducer
            }
            _ => Relationship::Full,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Relationship::Full => "Full",
            Relationship::Introducer => "Introducer",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Relationship filter applied by the presentation layer to the rendered
/// subset. Headline statistics are always computed on the unfiltered set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipFilter {
    #[default]
    All,
    Introducer,
    Full,
}

impl RelationshipFilter {
    pub const ALL: [RelationshipFilter; 3] = [
        RelationshipFilter::All,
        RelationshipFilter::Introducer,
        RelationshipFilter::Full,
    ];

    #[must_use]
    pub fn matches(self, relationship: Relationship) -> bool {
        match self {
            RelationshipFilter::All => true,
            RelationshipFilter::Introducer => relationship == Relationship::Introducer,
            RelationshipFilter::Full => relationship == Relationship::Full,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipFilter::All => "all",
            RelationshipFilter::Introducer => "introducer",
            RelationshipFilter::Full => "full",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RelationshipFilter::All => "All",
            RelationshipFilter::Introducer => "Introducer",
            RelationshipFilter::Full => "Full",
        }
    }
}

impl std::str::FromStr for RelationshipFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(RelationshipFilter::All),
            "introducer" => Ok(RelationshipFilter::Introducer),
            "full" => Ok(RelationshipFilter::Full),
            other => Err(format!(
                "unknown relationship filter '{other}' (expected all, introducer or full)"
            )),
        }
    }
}

impl std::fmt::Display for RelationshipFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the pair is finite and inside `[-90, 90] x [-180, 180]`.
    #[must_use]
    pub fn is_within_wgs84_bounds(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// One appointed representative as listed on the regulator register.
///
/// Serialised with exactly these keys inside the `ARDetails` CSV column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub insurance_distribution: String,
    #[serde(default)]
    pub tied_agent: String,
    #[serde(default)]
    pub eea_tied_agent: String,
    #[serde(default)]
    pub ar_relationship: String,
    #[serde(default)]
    pub firm_reference_number: String,
    #[serde(default)]
    pub effective_from: String,
}

/// One row of the firm table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmRecord {
    pub name: String,
    pub regulatory_number: String,
    pub company_number: Option<String>,
    /// Blank postcodes are stored as `None`; such rows are never mapped.
    pub postcode: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub services: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub principal_rep_name: Option<String>,
    pub principal_rep_reg_number: Option<String>,
    pub ar_relationship: Relationship,
    #[serde(default)]
    pub ar_details: Vec<ArDetail>,
}

impl FirmRecord {
    /// Trimmed, non-empty postcode.
    #[must_use]
    pub fn postcode(&self) -> Option<&str> {
        self.postcode
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Eligible for mapping: carries a non-blank postcode.
    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.postcode().is_some()
    }

    /// GPS pair when both fields are present.
    #[must_use]
    pub fn gps(&self) -> Option<Coordinate> {
        match (self.gps_latitude, self.gps_longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }

    /// Whether this firm is an AR of `principal_name` (strict equality).
    #[must_use]
    pub fn is_ar_of(&self, principal_name: &str) -> bool {
        self.principal_rep_name.as_deref() == Some(principal_name)
    }

    /// Website suitable for linking: an absolute `http` or `https` URL.
    /// Blank cells, the `nan` placeholder and other schemes yield `None`.
    #[must_use]
    pub fn website_url(&self) -> Option<&str> {
        self.website
            .as_deref()
            .map(str::trim)
            .filter(|w| has_web_scheme(w))
    }
}

fn has_web_scheme(url: &str) -> bool {
    url.split_once(':').is_some_and(|(scheme, rest)| {
        (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
            && rest.starts_with("//")
    })
}

/// A firm record with a resolved map coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    #[serde(flatten)]
    pub record: FirmRecord,
    pub lat: f64,
    pub lng: f64,
    pub is_principal: bool,
}

impl ResolvedLocation {
    #[must_use]
    pub fn new(record: FirmRecord, coordinate: Coordinate, is_principal: bool) -> Self {
        Self {
            record,
            lat: coordinate.lat,
            lng: coordinate.lng,
            is_principal,
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    #[must_use]
    pub fn relationship(&self) -> Relationship {
        self.record.ar_relationship
    }
}
