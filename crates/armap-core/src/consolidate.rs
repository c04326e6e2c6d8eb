//! Principal / appointed representative consolidation.

use serde::Serialize;

use crate::error::PrincipalNotFound;
use crate::geocode::Geocoder;
use crate::model::{FirmRecord, RelationshipFilter, ResolvedLocation};
use crate::resolver::CoordinateResolver;
use crate::table::FirmTable;

/// Output of one principal query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidationResult {
    /// The principal name queried; empty in show-all mode.
    pub query: String,
    /// Resolved AR rows in table order. Never contains the principal's own
    /// record unless that record also names the principal as its own.
    pub ar_locations: Vec<ResolvedLocation>,
    /// The principal's own row, when the table has one.
    pub principal_record: Option<FirmRecord>,
    /// The principal's row resolved for the map, when it could be located.
    pub principal_location: Option<ResolvedLocation>,
}

impl ConsolidationResult {
    #[must_use]
    pub fn is_show_all(&self) -> bool {
        self.query.is_empty()
    }

    /// The principal's own record.
    ///
    /// # Errors
    ///
    /// Returns [`PrincipalNotFound`] when the table has no row for the queried
    /// name (including show-all mode).
    pub fn principal(&self) -> Result<&FirmRecord, PrincipalNotFound> {
        self.principal_record.as_ref().ok_or_else(|| PrincipalNotFound {
            name: self.query.clone(),
        })
    }

    /// AR rows passing `filter`.
    pub fn filtered(&self, filter: RelationshipFilter) -> impl Iterator<Item = &ResolvedLocation> {
        self.ar_locations
            .iter()
            .filter(move |loc| filter.matches(loc.relationship()))
    }

    /// Locations to draw on the map: the principal (when located) followed
    /// by the ARs passing `filter`. A principal listed as its own AR is
    /// drawn once.
    #[must_use]
    pub fn map_locations(&self, filter: RelationshipFilter) -> Vec<ResolvedLocation> {
        let principal_drawn = self.principal_location.is_some();
        self.principal_location
            .iter()
            .chain(
                self.filtered(filter)
                    .filter(|loc| !(principal_drawn && loc.is_principal)),
            )
            .cloned()
            .collect()
    }

    /// Whether there is nothing to show at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ar_locations.is_empty() && self.principal_record.is_none()
    }
}

/// Consolidate the ARs of `principal_name` from `table`.
///
/// A blank name selects every eligible row ("show all"). Otherwise only rows
/// whose `principal_rep_name` equals the name exactly are AR sources, and the
/// principal's own row is returned separately. Rows that cannot be located
/// are dropped.
pub async fn consolidate<G: Geocoder>(
    table: &FirmTable,
    principal_name: &str,
    resolver: &CoordinateResolver<G>,
) -> ConsolidationResult {
    let query = principal_name.trim();

    let mut principal_record = None;
    let mut sources: Vec<&FirmRecord> = Vec::new();

    for record in table.eligible() {
        if query.is_empty() {
            sources.push(record);
            continue;
        }
        if record.name == query {
            if principal_record.is_none() {
                principal_record = Some(record.clone());
            } else {
                tracing::warn!(principal = query, "duplicate principal row ignored");
            }
        }
        if record.is_ar_of(query) {
            sources.push(record);
        }
    }

    let mut ar_locations = Vec::with_capacity(sources.len());
    let mut dropped = 0usize;
    for record in sources {
        match resolver.resolve(record).await {
            Ok(coordinate) => {
                let is_principal = !query.is_empty() && record.name == query;
                ar_locations.push(ResolvedLocation::new(record.clone(), coordinate, is_principal));
            }
            Err(_) => dropped += 1,
        }
    }

    let principal_location = match &principal_record {
        Some(record) => match resolver.resolve(record).await {
            Ok(coordinate) => Some(ResolvedLocation::new(record.clone(), coordinate, true)),
            Err(_) => None,
        },
        None => None,
    };

    tracing::info!(
        principal = query,
        located = ar_locations.len(),
        dropped,
        principal_found = principal_record.is_some(),
        "consolidated appointed representatives"
    );

    ConsolidationResult {
        query: query.to_string(),
        ar_locations,
        principal_record,
        principal_location,
    }
}

#[cfg(test)]
#[path = "consolidate_test.rs"]
mod tests;
