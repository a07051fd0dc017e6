//! Core of the listing map viewer: filtering, location grouping, cached
//! geocoding and the render controller that places markers.
//!
//! Nothing in here touches the DOM directly. The UI layer implements
//! [`render::MapSurface`] for the map widget, turns form state into a
//! [`filter::FilterCriteria`] and drives a [`viewer::Viewer`].

pub mod api;
pub mod cache;
pub mod config;
pub mod filter;
pub mod geocode;
pub mod group;
pub mod property;
pub mod render;
pub mod session;
pub mod utils;
pub mod viewer;

pub use filter::{filter_properties, FilterCriteria, FilterForm};
pub use geocode::{GeocodeClient, GeocodeResult, Geocoder};
pub use group::{group_by_location, LocationGroup};
pub use property::{Property, SheetType, Status};
pub use render::{MapSurface, MarkerHandle, MarkerSpec, RenderController, RenderOutcome};
pub use session::{RenderSession, RenderToken};
pub use utils::parse_amount;
pub use viewer::{Viewer, ViewerEvent};
