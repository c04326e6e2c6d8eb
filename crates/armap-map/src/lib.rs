//! Standalone Leaflet map rendering for resolved firm locations.

pub mod error;
pub mod render;
pub mod style;

pub use error::RenderError;
pub use render::{render, render_html, render_html_with_view, MapView, UK_CENTRE, UK_ZOOM};
pub use style::{style_for, MarkerKind, MarkerStyle, MARKER_STYLES};
