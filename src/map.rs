//! JavaScript interop for the map widget.
//! Provides Rust bindings to the helpers defined in map_helpers.js and the
//! [`MapSurface`] the render controller draws through.

use crate::components::ListingState;
use listing_map::render::{MapSurface, MarkerHandle, MarkerSpec};
use wasm_bindgen::prelude::*;
use yew::Callback;

#[wasm_bindgen(module = "/map_helpers.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    pub fn init_map(element_id: &str, on_marker_click: &js_sys::Function) -> bool;

    #[wasm_bindgen(js_name = addMarker)]
    fn js_add_marker(spec: JsValue) -> i32;

    #[wasm_bindgen(js_name = removeMarker)]
    fn js_remove_marker(id: u32);

    #[wasm_bindgen(js_name = setPopupOpen)]
    fn js_set_popup_open(id: u32, open: bool);
}

/// The Naver map plus the listing panel below the form.
pub struct NaverMapSurface {
    listing: Callback<ListingState>,
}

impl NaverMapSurface {
    pub fn new(listing: Callback<ListingState>) -> Self {
        Self { listing }
    }
}

impl MapSurface for NaverMapSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Option<MarkerHandle> {
        let value = match serde_wasm_bindgen::to_value(spec) {
            Ok(v) => v,
            Err(e) => {
                log::error!("Could not pass marker '{}' to the map: {}", spec.label, e);
                return None;
            }
        };
        // The helper answers -1 when the map is not initialized
        u32::try_from(js_add_marker(value)).ok().map(MarkerHandle)
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        js_remove_marker(marker.0);
    }

    fn set_popup_open(&mut self, marker: MarkerHandle, open: bool) {
        js_set_popup_open(marker.0, open);
    }

    fn clear_listing(&mut self) {
        self.listing.emit(ListingState::Cleared);
    }

    fn show_empty_state(&mut self) {
        self.listing.emit(ListingState::Empty);
    }
}
