//! Map document rendering.
//!
//! The output is a single HTML file: Leaflet from its CDN, OpenStreetMap
//! tiles, one circle marker per location and a static legend. Marker data is
//! embedded as JSON with `<` escaped so no value can close the script block.

use std::path::Path;

use armap_core::{Coordinate, ResolvedLocation};
use askama::Template;
use serde::Serialize;

use crate::error::RenderError;
use crate::style::{style_for, MarkerKind, MarkerStyle, MARKER_STYLES};

/// Geographic centre of the United Kingdom.
pub const UK_CENTRE: Coordinate = Coordinate {
    lat: 54.702_354_5,
    lng: -3.276_575_3,
};
pub const UK_ZOOM: u8 = 6;

const MARKER_RADIUS: u8 = 8;
const MARKER_WEIGHT: u8 = 3;
const POPUP_MAX_WIDTH: u16 = 300;

/// Initial view of the map. Fixed rather than fitted to the data.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub centre: Coordinate,
    pub zoom: u8,
    pub title: String,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            centre: UK_CENTRE,
            zoom: UK_ZOOM,
            title: "Company Locations".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "map.html")]
struct MapTemplate<'a> {
    title: &'a str,
    centre_lat: f64,
    centre_lng: f64,
    zoom: u8,
    popup_max_width: u16,
    marker_count: usize,
    markers_json: &'a str,
    legend: &'a [MarkerStyle],
}

#[derive(Template)]
#[template(path = "popup.html")]
struct PopupTemplate<'a> {
    name: &'a str,
    regulatory_number: &'a str,
    company_number: &'a str,
    postcode: &'a str,
    website: Option<&'a str>,
}

/// Leaflet treats tooltip content as HTML.
#[derive(Template)]
#[template(source = "{{ name }}", ext = "html")]
struct TooltipTemplate<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct MarkerPayload {
    tooltip: String,
    lat: f64,
    lng: f64,
    radius: u8,
    weight: u8,
    color: &'static str,
    fill_color: &'static str,
    fill_opacity: f64,
    popup: String,
}

/// Render `locations` into a map document using the default view.
///
/// # Errors
///
/// Returns [`RenderError::Template`] or [`RenderError::Serialize`] if the
/// document cannot be produced.
pub fn render_html(locations: &[ResolvedLocation]) -> Result<String, RenderError> {
    render_html_with_view(locations, &MapView::default())
}

/// Render `locations` into a map document with an explicit initial view.
///
/// # Errors
///
/// Returns [`RenderError::Template`] or [`RenderError::Serialize`] if the
/// document cannot be produced.
pub fn render_html_with_view(
    locations: &[ResolvedLocation],
    view: &MapView,
) -> Result<String, RenderError> {
    let markers = locations
        .iter()
        .map(marker_payload)
        .collect::<Result<Vec<_>, _>>()?;
    let markers_json = script_safe_json(&markers)?;

    let page = MapTemplate {
        title: &view.title,
        centre_lat: view.centre.lat,
        centre_lng: view.centre.lng,
        zoom: view.zoom,
        popup_max_width: POPUP_MAX_WIDTH,
        marker_count: markers.len(),
        markers_json: &markers_json,
        legend: MARKER_STYLES,
    };
    Ok(page.render()?)
}

/// Render `locations` and write the document to `destination`, replacing
/// any previous content.
///
/// # Errors
///
/// Returns [`RenderError::Write`] if the destination cannot be written, and
/// the errors of [`render_html`] otherwise.
pub fn render(locations: &[ResolvedLocation], destination: &Path) -> Result<(), RenderError> {
    let html = render_html(locations)?;
    std::fs::write(destination, html).map_err(|e| RenderError::Write {
        path: destination.display().to_string(),
        source: e,
    })?;
    tracing::info!(
        path = %destination.display(),
        markers = locations.len(),
        "map saved"
    );
    Ok(())
}

fn marker_payload(location: &ResolvedLocation) -> Result<MarkerPayload, RenderError> {
    let record = &location.record;
    let style = style_for(MarkerKind::of(location));

    let popup = PopupTemplate {
        name: &record.name,
        regulatory_number: &record.regulatory_number,
        company_number: record.company_number.as_deref().unwrap_or("N/A"),
        postcode: record.postcode().unwrap_or_default(),
        website: record.website_url(),
    }
    .render()?;

    let tooltip = TooltipTemplate { name: &record.name }.render()?;

    Ok(MarkerPayload {
        tooltip,
        lat: location.lat,
        lng: location.lng,
        radius: MARKER_RADIUS,
        weight: MARKER_WEIGHT,
        color: style.color,
        fill_color: style.fill_color,
        fill_opacity: style.fill_opacity,
        popup,
    })
}

/// JSON safe to inline inside a `<script>` element.
fn script_safe_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
