//! Appointed representative consolidation and geocoding pipeline.
//!
//! Load a [`FirmTable`], [`consolidate`] the ARs of a principal through a
//! [`CoordinateResolver`], then [`aggregate`] relationship counts.

pub mod app_config;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod geocode;
pub mod model;
pub mod resolver;
pub mod stats;
pub mod table;

pub use app_config::{AppConfig, Environment, GpsPolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use consolidate::{consolidate, ConsolidationResult};
pub use error::{ConfigError, DataLoadError, PrincipalNotFound, UnresolvableLocation};
pub use geocode::{normalize_postcode, CachedGeocoder, Geocoder, MaybeCached};
pub use model::{
    ArDetail, Coordinate, FirmRecord, Relationship, RelationshipFilter, ResolvedLocation,
};
pub use resolver::CoordinateResolver;
pub use stats::{aggregate, RelationshipStats};
pub use table::FirmTable;
