//! Command interface the UI layer drives: search, filter change, sheet
//! change and reset.

use crate::api::PropertySource;
use crate::cache::CacheStore;
use crate::filter::{filter_properties, FilterCriteria};
use crate::geocode::Geocoder;
use crate::property::{Property, SheetType};
use crate::render::{MapSurface, RenderController, RenderOutcome};
use std::cell::RefCell;
use std::rc::Rc;

/// What a command did, for the UI to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Properties were loaded and rendered.
    Loaded { total: usize, matched: usize, outcome: RenderOutcome },
    /// The fetch failed; the list is empty and the map is clear.
    LoadFailed(String),
    /// Filters were applied to the already loaded properties.
    Filtered { matched: usize, outcome: RenderOutcome },
    /// Nothing is loaded yet, so there is nothing to filter.
    NothingLoaded,
    /// A later command cleared the map while this one was loading.
    Superseded,
    Cleared,
}

/// One map viewer: the loaded listings plus the render controller.
pub struct Viewer<P, M, G, S> {
    source: P,
    controller: RenderController<M, G, S>,
    properties: RefCell<Rc<Vec<Property>>>,
}

impl<P, M, G, S> Viewer<P, M, G, S>
where
    P: PropertySource,
    M: MapSurface,
    G: Geocoder,
    S: CacheStore,
{
    pub fn new(source: P, controller: RenderController<M, G, S>) -> Self {
        Self {
            source,
            controller,
            properties: RefCell::new(Rc::new(Vec::new())),
        }
    }

    pub fn controller(&self) -> &RenderController<M, G, S> {
        &self.controller
    }

    pub fn properties(&self) -> Rc<Vec<Property>> {
        self.properties.borrow().clone()
    }

    pub fn loaded_count(&self) -> usize {
        self.properties.borrow().len()
    }

    fn drop_properties(&self) {
        *self.properties.borrow_mut() = Rc::new(Vec::new());
    }

    /// Fetch `sheet` from scratch, then filter and render it.
    pub async fn on_search(&self, sheet: SheetType, criteria: &FilterCriteria) -> ViewerEvent {
        let token = self.controller.clear();
        self.drop_properties();

        let fetched = self.source.fetch(sheet).await;
        if token.is_cancelled() {
            log::debug!("Discarding the {} response: superseded", sheet);
            return ViewerEvent::Superseded;
        }
        let loaded = match fetched {
            Ok(list) => list,
            Err(e) => {
                log::error!("Loading {} failed: {}", sheet, e);
                return ViewerEvent::LoadFailed(e.to_string());
            }
        };

        log::info!("{}: {} listings loaded", sheet, loaded.len());
        let total = loaded.len();
        *self.properties.borrow_mut() = Rc::new(loaded);

        let all = self.properties();
        let matched = filter_properties(&all, criteria);
        let count = matched.len();
        let outcome = self.controller.render(&matched).await;
        ViewerEvent::Loaded {
            total,
            matched: count,
            outcome,
        }
    }

    /// Re-filter the loaded listings and render the result.
    pub async fn on_filter_changed(&self, criteria: &FilterCriteria) -> ViewerEvent {
        let all = self.properties();
        if all.is_empty() {
            log::info!("No listings loaded yet; search first");
            return ViewerEvent::NothingLoaded;
        }
        let matched = filter_properties(&all, criteria);
        let count = matched.len();
        let outcome = self.controller.render(&matched).await;
        ViewerEvent::Filtered {
            matched: count,
            outcome,
        }
    }

    /// The sheet selection changed: the loaded listings belong to the old
    /// sheet, so drop them along with their markers.
    pub fn on_sheet_changed(&self, sheet: SheetType) -> ViewerEvent {
        log::info!("Sheet changed to {}; search again to load it", sheet);
        self.controller.clear();
        self.drop_properties();
        ViewerEvent::Cleared
    }

    pub fn on_reset(&self) -> ViewerEvent {
        log::info!("Resetting viewer");
        self.controller.clear();
        self.drop_properties();
        ViewerEvent::Cleared
    }
}
