use serde::Serialize;

use crate::model::{Relationship, ResolvedLocation};

/// Relationship-type counts for a set of AR locations.
///
/// `total == full_count + introducer_count` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipStats {
    pub total: usize,
    pub full_count: usize,
    pub introducer_count: usize,
}

/// Count relationship types across `ar_locations`.
///
/// Pass the unfiltered AR set; headline counts must not follow the view
/// filter.
#[must_use]
pub fn aggregate(ar_locations: &[ResolvedLocation]) -> RelationshipStats {
    let introducer_count = ar_locations
        .iter()
        .filter(|loc| loc.relationship() == Relationship::Introducer)
        .count();
    let total = ar_locations.len();
    RelationshipStats {
        total,
        full_count: total - introducer_count,
        introducer_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, FirmRecord};

    fn location(relationship: Relationship) -> ResolvedLocation {
        ResolvedLocation::new(
            FirmRecord {
                ar_relationship: relationship,
                ..FirmRecord::default()
            },
            Coordinate::new(51.5, -0.1),
            false,
        )
    }

    #[test]
    fn empty_input_yields_zero_counts() {
        assert_eq!(aggregate(&[]), RelationshipStats::default());
    }

    #[test]
    fn counts_relationship_types() {
        let locations = vec![
            location(Relationship::Full),
            location(Relationship::Introducer),
            location(Relationship::Full),
        ];

        let stats = aggregate(&locations);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.full_count, 2);
        assert_eq!(stats.introducer_count, 1);
        assert_eq!(stats.total, stats.full_count + stats.introducer_count);
    }
}
