//! The render controller: clears the map, geocodes the current result set
//! and places one marker per location, unless a newer pass has started in
//! the meantime.

use crate::cache::CacheStore;
use crate::config::MISSING_VALUE_LABEL;
use crate::geocode::{GeocodeClient, GeocodeResult, Geocoder};
use crate::group::{group_by_location, LocationGroup};
use crate::property::{Property, Status, FALLBACK_BADGE_COLORS};
use crate::session::{RenderSession, RenderToken};
use serde::Serialize;
use std::cell::{Cell, RefCell};

/// Opaque id the map widget assigns to a placed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u32);

/// One row of a marker's info popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupEntry {
    pub status: String,
    pub badge_color: String,
    pub badge_background: String,
    pub reg_date: String,
    pub deposit: String,
    pub monthly_rent: String,
    pub hyperlink: Option<String>,
}

impl PopupEntry {
    fn from_property(property: &Property) -> Self {
        let (badge_color, badge_background) = property
            .parsed_status()
            .map_or(FALLBACK_BADGE_COLORS, Status::badge_colors);
        Self {
            status: or_missing(&property.status, "상태없음"),
            badge_color: badge_color.to_string(),
            badge_background: badge_background.to_string(),
            reg_date: or_missing(&property.reg_date, MISSING_VALUE_LABEL),
            deposit: or_missing(&property.deposit, MISSING_VALUE_LABEL),
            monthly_rent: or_missing(&property.monthly_rent, MISSING_VALUE_LABEL),
            hyperlink: property
                .hyperlink
                .as_ref()
                .filter(|link| !link.trim().is_empty())
                .cloned(),
        }
    }
}

fn or_missing(value: &str, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Everything the map widget needs to draw one marker and its popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    pub color: String,
    pub location: String,
    pub formatted_address: String,
    pub count: usize,
    pub entries: Vec<PopupEntry>,
}

impl MarkerSpec {
    pub fn new(group: &LocationGroup, position: &GeocodeResult) -> Self {
        Self {
            lat: position.lat,
            lng: position.lng,
            label: group.label(),
            color: group.marker_color().to_string(),
            location: group.location.clone(),
            formatted_address: position.formatted_address.clone(),
            count: group.len(),
            entries: group.properties.iter().map(PopupEntry::from_property).collect(),
        }
    }
}

/// The map widget and listing panel, as seen by the controller.
pub trait MapSurface {
    /// Draw a marker; `None` if the widget could not create it.
    fn add_marker(&mut self, spec: &MarkerSpec) -> Option<MarkerHandle>;
    fn remove_marker(&mut self, marker: MarkerHandle);
    fn set_popup_open(&mut self, marker: MarkerHandle, open: bool);
    fn clear_listing(&mut self);
    fn show_empty_state(&mut self);
}

/// Where the controller is within a render pass.
///
/// A pass ends back in `Idle` when it completes. A pass whose token is
/// cancelled stops wherever it was and leaves the phase to the newer pass;
/// that aborted ending is reported as [`RenderOutcome::Superseded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Clearing,
    Geocoding,
    Placing,
}

/// How a render pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing matched; the empty state is shown and nothing was geocoded.
    Empty,
    Placed { markers: usize, unresolved: usize },
    /// A newer pass started while this one was waiting; nothing was placed.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub handle: MarkerHandle,
    pub spec: MarkerSpec,
    pub popup_open: bool,
}

/// Owns the map state for one viewer: the surface, the placed markers with
/// their popups, and the render session.
pub struct RenderController<M, G, S> {
    surface: RefCell<M>,
    markers: RefCell<Vec<PlacedMarker>>,
    session: RenderSession,
    phase: Cell<RenderPhase>,
    geocoder: GeocodeClient<G, S>,
}

impl<M, G, S> RenderController<M, G, S>
where
    M: MapSurface,
    G: Geocoder,
    S: CacheStore,
{
    pub fn new(surface: M, geocoder: GeocodeClient<G, S>) -> Self {
        Self {
            surface: RefCell::new(surface),
            markers: RefCell::new(Vec::new()),
            session: RenderSession::new(),
            phase: Cell::new(RenderPhase::Idle),
            geocoder,
        }
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase.get()
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn geocoder(&self) -> &GeocodeClient<G, S> {
        &self.geocoder
    }

    pub fn markers(&self) -> std::cell::Ref<'_, Vec<PlacedMarker>> {
        self.markers.borrow()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.borrow().len()
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.surface.borrow())
    }

    /// Remove every marker, close every popup, clear the listing and start a
    /// new session. Any pass still waiting on geocoding is invalidated.
    pub fn clear(&self) -> RenderToken {
        self.phase.set(RenderPhase::Clearing);
        let token = self.session.advance();

        let removed = std::mem::take(&mut *self.markers.borrow_mut());
        let mut surface = self.surface.borrow_mut();
        for marker in &removed {
            if marker.popup_open {
                surface.set_popup_open(marker.handle, false);
            }
            surface.remove_marker(marker.handle);
        }
        surface.clear_listing();

        log::debug!(
            "Cleared {} markers, session now {}",
            removed.len(),
            token.id()
        );
        self.phase.set(RenderPhase::Idle);
        token
    }

    /// Draw `properties` on the map, replacing whatever was there.
    pub async fn render(&self, properties: &[Property]) -> RenderOutcome {
        let token = self.clear();

        if properties.is_empty() {
            self.surface.borrow_mut().show_empty_state();
            log::info!("No properties match the current filters");
            return RenderOutcome::Empty;
        }

        let groups = group_by_location(properties);
        let locations: Vec<String> = groups.iter().map(|g| g.location.clone()).collect();

        self.phase.set(RenderPhase::Geocoding);
        let resolved = self.geocoder.resolve_batch(&locations, &token).await;

        if token.is_cancelled() {
            log::debug!("Render pass {} superseded during geocoding", token.id());
            return RenderOutcome::Superseded;
        }

        self.phase.set(RenderPhase::Placing);
        let mut unresolved = 0usize;
        let mut placed = Vec::with_capacity(groups.len());
        {
            let mut surface = self.surface.borrow_mut();
            for group in &groups {
                let position = resolved
                    .get(&group.location)
                    .and_then(Option::as_ref)
                    .filter(|r| r.has_coordinates());
                let Some(position) = position else {
                    unresolved += 1;
                    continue;
                };
                let spec = MarkerSpec::new(group, position);
                let Some(handle) = surface.add_marker(&spec) else {
                    unresolved += 1;
                    continue;
                };
                placed.push(PlacedMarker {
                    handle,
                    spec,
                    popup_open: false,
                });
            }
        }

        let count = placed.len();
        self.markers.borrow_mut().extend(placed);
        self.phase.set(RenderPhase::Idle);

        if unresolved > 0 {
            log::warn!("{} locations could not be placed", unresolved);
        }
        log::info!("Placed {} markers", count);
        RenderOutcome::Placed {
            markers: count,
            unresolved,
        }
    }

    /// Marker click: close every popup, then open this marker's popup unless
    /// it was the one already open.
    pub fn toggle_popup(&self, handle: MarkerHandle) {
        let mut markers = self.markers.borrow_mut();
        let Some(was_open) = markers
            .iter()
            .find(|m| m.handle == handle)
            .map(|m| m.popup_open)
        else {
            log::debug!("Click on unknown marker {:?}", handle);
            return;
        };

        let mut surface = self.surface.borrow_mut();
        for marker in markers.iter_mut() {
            if marker.popup_open {
                surface.set_popup_open(marker.handle, false);
                marker.popup_open = false;
            }
        }
        if !was_open {
            if let Some(marker) = markers.iter_mut().find(|m| m.handle == handle) {
                surface.set_popup_open(handle, true);
                marker.popup_open = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(location: &str, statuses: &[&str]) -> LocationGroup {
        LocationGroup {
            location: location.into(),
            properties: statuses
                .iter()
                .map(|s| Property {
                    location: location.into(),
                    status: s.to_string(),
                    deposit: "1억".into(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn marker_spec_uses_group_label_and_color() {
        let g = group("강남역", &["공클", "갠매"]);
        let pos = GeocodeResult {
            lat: 37.49,
            lng: 127.02,
            formatted_address: "서울 강남구".into(),
        };
        let spec = MarkerSpec::new(&g, &pos);
        assert_eq!(spec.label, "강남역 (2)");
        assert_eq!(spec.color, Status::Gaenmae.marker_color());
        assert_eq!(spec.count, 2);
        assert_eq!(spec.entries[0].badge_color, Status::Gongkeul.badge_colors().0);
    }

    #[test]
    fn popup_entries_fill_missing_values() {
        let entry = PopupEntry::from_property(&Property {
            hyperlink: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(entry.status, "상태없음");
        assert_eq!(entry.reg_date, MISSING_VALUE_LABEL);
        assert_eq!(entry.monthly_rent, MISSING_VALUE_LABEL);
        assert_eq!(entry.hyperlink, None);
        assert_eq!(entry.badge_color, FALLBACK_BADGE_COLORS.0);
    }
}
