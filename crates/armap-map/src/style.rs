//! Marker styling.
//!
//! Styles live in one table; the renderer and the legend both read it, so a
//! new category only needs a new [`MarkerKind`] and a row in
//! [`MARKER_STYLES`].

use armap_core::{Relationship, ResolvedLocation};
use serde::Serialize;

/// What a marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkerKind {
    Principal,
    Appointed(Relationship),
}

impl MarkerKind {
    #[must_use]
    pub fn of(location: &ResolvedLocation) -> Self {
        if location.is_principal {
            MarkerKind::Principal
        } else {
            MarkerKind::Appointed(location.relationship())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub kind: MarkerKind,
    pub label: &'static str,
    pub color: &'static str,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
}

pub const MARKER_STYLES: &[MarkerStyle] = &[
    MarkerStyle {
        kind: MarkerKind::Principal,
        label: "Principal firm",
        color: "red",
        fill_color: "lightcoral",
        fill_opacity: 1.0,
    },
    MarkerStyle {
        kind: MarkerKind::Appointed(Relationship::Full),
        label: "Appointed representative (Full)",
        color: "blue",
        fill_color: "#4682B4",
        fill_opacity: 1.0,
    },
    MarkerStyle {
        kind: MarkerKind::Appointed(Relationship::Introducer),
        label: "Appointed representative (Introducer)",
        color: "orange",
        fill_color: "orange",
        fill_opacity: 0.6,
    },
];

/// Style for `kind`; kinds missing from the table fall back to the Full AR
/// style.
#[must_use]
pub fn style_for(kind: MarkerKind) -> &'static MarkerStyle {
    MARKER_STYLES
        .iter()
        .find(|style| style.kind == kind)
        .unwrap_or(&MARKER_STYLES[1])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use armap_core::{Coordinate, FirmRecord};

    use super::*;

    fn location(is_principal: bool, relationship: Relationship) -> ResolvedLocation {
        ResolvedLocation::new(
            FirmRecord {
                ar_relationship: relationship,
                ..FirmRecord::default()
            },
            Coordinate::new(51.5, -0.1),
            is_principal,
        )
    }

    #[test]
    fn principal_is_red_regardless_of_relationship() {
        let style = style_for(MarkerKind::of(&location(true, Relationship::Introducer)));
        assert_eq!(style.color, "red");
        assert_eq!(style.fill_color, "lightcoral");
    }

    #[test]
    fn introducer_is_translucent_orange() {
        let style = style_for(MarkerKind::of(&location(false, Relationship::Introducer)));
        assert_eq!(style.color, "orange");
        assert!(style.fill_opacity < 1.0);
    }

    #[test]
    fn full_is_opaque_blue() {
        let style = style_for(MarkerKind::of(&location(false, Relationship::Full)));
        assert_eq!(style.color, "blue");
        assert!((style.fill_opacity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn every_kind_has_exactly_one_row() {
        let kinds: HashSet<MarkerKind> = MARKER_STYLES.iter().map(|s| s.kind).collect();
        assert_eq!(kinds.len(), MARKER_STYLES.len());
    }
}
