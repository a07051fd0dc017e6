use futures::channel::oneshot;
use futures::executor::{block_on, LocalPool};
use futures::future::{LocalBoxFuture, Shared};
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use listing_map::api::{FetchError, PropertySource};
use listing_map::cache::{CacheStore, GeocodeCache, MemoryStore};
use listing_map::geocode::GeocodeError;
use listing_map::render::RenderPhase;
use listing_map::{
    filter_properties, group_by_location, FilterCriteria, GeocodeClient, GeocodeResult, Geocoder,
    MapSurface, MarkerHandle, MarkerSpec, Property, RenderController, RenderOutcome, SheetType,
    Viewer, ViewerEvent,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

const HOUR_MS: u64 = 3_600_000;

type Gate = Shared<oneshot::Receiver<()>>;

fn gate() -> (oneshot::Sender<()>, Gate) {
    let (tx, rx) = oneshot::channel();
    (tx, rx.shared())
}

fn property(location: &str, status: &str, deposit: &str, rent: &str) -> Property {
    Property {
        location: location.into(),
        status: status.into(),
        deposit: deposit.into(),
        monthly_rent: rent.into(),
        ..Default::default()
    }
}

/// Geocoder answering from a fixed table, optionally held until a gate opens.
#[derive(Default)]
struct TableGeocoder {
    table: HashMap<String, (f64, f64)>,
    gate: Option<Gate>,
    calls: Rc<Cell<usize>>,
}

impl TableGeocoder {
    fn with(entries: &[(&str, f64, f64)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|&(addr, lat, lng)| (addr.to_string(), (lat, lng)))
                .collect(),
            ..Default::default()
        }
    }

    fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Geocoder for TableGeocoder {
    fn lookup<'a>(
        &'a self,
        address: &'a str,
    ) -> LocalBoxFuture<'a, Result<GeocodeResult, GeocodeError>> {
        Box::pin(async move {
            self.calls.set(self.calls.get() + 1);
            if let Some(gate) = &self.gate {
                let _ = gate.clone().await;
            }
            self.table
                .get(address)
                .map(|&(lat, lng)| GeocodeResult {
                    lat,
                    lng,
                    formatted_address: address.to_string(),
                })
                .ok_or_else(|| GeocodeError::NotFound("ZERO_RESULT".into()))
        })
    }
}

/// Map surface that records every call.
#[derive(Default)]
struct RecordingSurface {
    next: u32,
    added: Vec<MarkerSpec>,
    removed: Vec<MarkerHandle>,
    popups: Vec<(MarkerHandle, bool)>,
    listing_clears: usize,
    empty_shown: usize,
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Option<MarkerHandle> {
        self.added.push(spec.clone());
        self.next += 1;
        Some(MarkerHandle(self.next))
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.removed.push(marker);
    }

    fn set_popup_open(&mut self, marker: MarkerHandle, open: bool) {
        self.popups.push((marker, open));
    }

    fn clear_listing(&mut self) {
        self.listing_clears += 1;
    }

    fn show_empty_state(&mut self) {
        self.empty_shown += 1;
    }
}

/// Property source serving canned sheets.
#[derive(Default)]
struct CannedSource {
    sheets: HashMap<SheetType, Vec<Property>>,
    failing: bool,
    gate: Option<Gate>,
}

impl PropertySource for CannedSource {
    fn fetch<'a>(
        &'a self,
        sheet: SheetType,
    ) -> LocalBoxFuture<'a, Result<Vec<Property>, FetchError>> {
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                let _ = gate.clone().await;
            }
            if self.failing {
                return Err(FetchError::HttpStatus(500));
            }
            Ok(self.sheets.get(&sheet).cloned().unwrap_or_default())
        })
    }
}

fn controller(
    geocoder: TableGeocoder,
) -> RenderController<RecordingSurface, TableGeocoder, MemoryStore> {
    let cache = GeocodeCache::new(MemoryStore::new(), "geocoding_cache", 48 * HOUR_MS);
    RenderController::new(
        RecordingSurface::default(),
        GeocodeClient::new(geocoder, cache, 20, 0),
    )
}

#[test]
fn single_listing_is_filtered_grouped_and_placed() {
    let all = vec![property("A", "공클", "1억", "50만원")];
    let criteria = FilterCriteria::for_status("공클");

    let matched = filter_properties(&all, &criteria);
    assert_eq!(matched, all);

    let groups = group_by_location(&matched);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label(), "A");

    let ctl = controller(TableGeocoder::with(&[("A", 1.0, 1.0)]));
    let outcome = block_on(ctl.render(&matched));

    assert_eq!(
        outcome,
        RenderOutcome::Placed {
            markers: 1,
            unresolved: 0
        }
    );
    ctl.with_surface(|s| {
        assert_eq!(s.added.len(), 1);
        assert_eq!((s.added[0].lat, s.added[0].lng), (1.0, 1.0));
        assert_eq!(s.added[0].label, "A");
    });
    assert_eq!(ctl.phase(), RenderPhase::Idle);
}

#[test]
fn clear_during_geocoding_discards_the_pass() {
    let (open, gate) = gate();
    let ctl = Rc::new(controller(
        TableGeocoder::with(&[("강남역", 37.49, 127.02)]).gated(gate),
    ));
    let listing = vec![property("강남역", "공클", "", "")];
    let outcome = Rc::new(RefCell::new(None));

    let mut pool = LocalPool::new();
    {
        let ctl = ctl.clone();
        let outcome = outcome.clone();
        pool.spawner()
            .spawn_local(async move {
                *outcome.borrow_mut() = Some(ctl.render(&listing).await);
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(ctl.phase(), RenderPhase::Geocoding);

    ctl.clear();
    let clears_after_reset = ctl.with_surface(|s| s.listing_clears);
    open.send(()).unwrap();
    pool.run();

    assert_eq!(*outcome.borrow(), Some(RenderOutcome::Superseded));
    assert_eq!(ctl.marker_count(), 0);
    ctl.with_surface(|s| {
        assert!(s.added.is_empty());
        assert!(s.popups.is_empty());
        assert_eq!(s.listing_clears, clears_after_reset);
    });
}

#[test]
fn newer_render_wins_over_an_older_one() {
    let (open, gate) = gate();
    let ctl = Rc::new(controller(
        TableGeocoder::with(&[("강남역", 37.49, 127.02), ("역삼역", 37.50, 127.03)])
            .gated(gate),
    ));
    let outcomes = Rc::new(RefCell::new(Vec::new()));

    let mut pool = LocalPool::new();
    for location in ["강남역", "역삼역"] {
        let ctl = ctl.clone();
        let outcomes = outcomes.clone();
        let listing = vec![property(location, "공클", "", "")];
        pool.spawner()
            .spawn_local(async move {
                let outcome = ctl.render(&listing).await;
                outcomes.borrow_mut().push((location, outcome));
            })
            .unwrap();
        pool.run_until_stalled();
    }
    open.send(()).unwrap();
    pool.run();

    let outcomes = outcomes.borrow();
    assert!(outcomes.contains(&("강남역", RenderOutcome::Superseded)));
    assert!(outcomes.contains(&(
        "역삼역",
        RenderOutcome::Placed {
            markers: 1,
            unresolved: 0
        }
    )));
    let markers = ctl.markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].spec.location, "역삼역");
}

#[test]
fn empty_result_skips_geocoding() {
    let geocoder = TableGeocoder::with(&[("A", 1.0, 1.0)]);
    let calls = geocoder.calls.clone();
    let ctl = controller(geocoder);

    let all = vec![property("A", "온하", "", "")];
    let matched = filter_properties(&all, &FilterCriteria::for_status("공클"));
    assert!(matched.is_empty());

    assert_eq!(block_on(ctl.render(&matched)), RenderOutcome::Empty);
    assert_eq!(calls.get(), 0);
    ctl.with_surface(|s| {
        assert_eq!(s.empty_shown, 1);
        assert!(s.added.is_empty());
    });
}

#[test]
fn unresolved_locations_are_skipped() {
    let ctl = controller(TableGeocoder::with(&[("A", 1.0, 1.0)]));
    let listing = vec![
        property("A", "공클", "", ""),
        property("nowhere", "공클", "", ""),
    ];

    let outcome = block_on(ctl.render(&listing));

    assert_eq!(
        outcome,
        RenderOutcome::Placed {
            markers: 1,
            unresolved: 1
        }
    );
}

#[test]
fn second_render_is_served_from_cache() {
    let geocoder = TableGeocoder::with(&[("A", 1.0, 1.0)]);
    let calls = geocoder.calls.clone();
    let ctl = controller(geocoder);
    let listing = vec![property("A", "공클", "", "")];

    block_on(ctl.render(&listing));
    block_on(ctl.render(&listing));

    assert_eq!(calls.get(), 1);
    assert_eq!(ctl.marker_count(), 1);
    ctl.with_surface(|s| {
        assert_eq!(s.added.len(), 2);
        assert_eq!(s.removed.len(), 1);
    });
}

fn open_flags<M: MapSurface, G: Geocoder, S: CacheStore>(
    ctl: &RenderController<M, G, S>,
) -> Vec<bool> {
    ctl.markers().iter().map(|m| m.popup_open).collect()
}

#[test]
fn marker_click_toggles_its_popup_and_closes_others() {
    let ctl = controller(TableGeocoder::with(&[("A", 1.0, 1.0), ("B", 2.0, 2.0)]));
    let listing = vec![property("A", "공클", "", ""), property("B", "갠매", "", "")];
    block_on(ctl.render(&listing));

    let handles: Vec<MarkerHandle> = ctl.markers().iter().map(|m| m.handle).collect();

    ctl.toggle_popup(handles[0]);
    assert_eq!(open_flags(&ctl), vec![true, false]);

    ctl.toggle_popup(handles[1]);
    assert_eq!(open_flags(&ctl), vec![false, true]);

    ctl.toggle_popup(handles[1]);
    assert_eq!(open_flags(&ctl), vec![false, false]);

    ctl.with_surface(|s| {
        assert_eq!(
            s.popups,
            vec![
                (handles[0], true),
                (handles[0], false),
                (handles[1], true),
                (handles[1], false),
            ]
        );
    });
}

#[test]
fn clear_closes_open_popups_and_removes_markers() {
    let ctl = controller(TableGeocoder::with(&[("A", 1.0, 1.0)]));
    block_on(ctl.render(&[property("A", "공클", "", "")]));
    let handle = ctl.markers()[0].handle;
    ctl.toggle_popup(handle);

    let before = ctl.session().current_id();
    ctl.clear();

    assert_eq!(ctl.session().current_id(), before + 1);
    assert_eq!(ctl.marker_count(), 0);
    ctl.with_surface(|s| {
        assert_eq!(s.popups.last(), Some(&(handle, false)));
        assert_eq!(s.removed, vec![handle]);
    });
}

fn viewer(
    source: CannedSource,
    geocoder: TableGeocoder,
) -> Viewer<CannedSource, RecordingSurface, TableGeocoder, MemoryStore> {
    Viewer::new(source, controller(geocoder))
}

#[test]
fn search_replaces_listings_wholesale() {
    let mut source = CannedSource::default();
    source.sheets.insert(
        SheetType::GangnamMonthly,
        vec![property("A", "공클", "1억", "50만원"), property("B", "갠매", "", "")],
    );
    source
        .sheets
        .insert(SheetType::SongpaJeonse, vec![property("C", "공클", "", "")]);
    let v = viewer(
        source,
        TableGeocoder::with(&[("A", 1.0, 1.0), ("C", 3.0, 3.0)]),
    );
    let criteria = FilterCriteria::for_status("공클");

    let event = block_on(v.on_search(SheetType::GangnamMonthly, &criteria));
    assert_eq!(
        event,
        ViewerEvent::Loaded {
            total: 2,
            matched: 1,
            outcome: RenderOutcome::Placed {
                markers: 1,
                unresolved: 0
            }
        }
    );

    block_on(v.on_search(SheetType::SongpaJeonse, &criteria));
    let locations: Vec<String> = v.properties().iter().map(|p| p.location.clone()).collect();
    assert_eq!(locations, vec!["C".to_string()]);
    assert_eq!(v.controller().markers()[0].spec.location, "C");
}

#[test]
fn failed_load_leaves_nothing_loaded() {
    let source = CannedSource {
        failing: true,
        ..Default::default()
    };
    let v = viewer(source, TableGeocoder::default());

    let event = block_on(v.on_search(SheetType::GangnamMonthly, &FilterCriteria::for_status("공클")));

    assert!(matches!(event, ViewerEvent::LoadFailed(_)));
    assert_eq!(v.loaded_count(), 0);
    assert_eq!(v.controller().marker_count(), 0);
}

#[test]
fn filter_change_needs_loaded_listings() {
    let v = viewer(CannedSource::default(), TableGeocoder::default());
    let event = block_on(v.on_filter_changed(&FilterCriteria::for_status("공클")));
    assert_eq!(event, ViewerEvent::NothingLoaded);
}

#[test]
fn filter_change_rerenders_loaded_listings() {
    let mut source = CannedSource::default();
    source.sheets.insert(
        SheetType::GangnamMonthly,
        vec![property("A", "공클", "", ""), property("B", "갠매", "", "")],
    );
    let v = viewer(
        source,
        TableGeocoder::with(&[("A", 1.0, 1.0), ("B", 2.0, 2.0)]),
    );
    block_on(v.on_search(SheetType::GangnamMonthly, &FilterCriteria::for_status("공클")));

    let event = block_on(v.on_filter_changed(&FilterCriteria::for_status("갠매")));

    assert_eq!(
        event,
        ViewerEvent::Filtered {
            matched: 1,
            outcome: RenderOutcome::Placed {
                markers: 1,
                unresolved: 0
            }
        }
    );
    assert_eq!(v.controller().markers()[0].spec.location, "B");
}

#[test]
fn reset_during_fetch_discards_the_response() {
    let (open, gate) = gate();
    let mut source = CannedSource {
        gate: Some(gate),
        ..Default::default()
    };
    source
        .sheets
        .insert(SheetType::GangnamMonthly, vec![property("A", "공클", "", "")]);
    let v = Rc::new(viewer(source, TableGeocoder::with(&[("A", 1.0, 1.0)])));
    let event = Rc::new(RefCell::new(None));

    let mut pool = LocalPool::new();
    {
        let v = v.clone();
        let event = event.clone();
        pool.spawner()
            .spawn_local(async move {
                let criteria = FilterCriteria::for_status("공클");
                *event.borrow_mut() = Some(v.on_search(SheetType::GangnamMonthly, &criteria).await);
            })
            .unwrap();
    }
    pool.run_until_stalled();

    assert_eq!(v.on_reset(), ViewerEvent::Cleared);
    open.send(()).unwrap();
    pool.run();

    assert_eq!(*event.borrow(), Some(ViewerEvent::Superseded));
    assert_eq!(v.loaded_count(), 0);
    assert_eq!(v.controller().marker_count(), 0);
}

#[test]
fn failed_fetch_after_reset_is_superseded() {
    let (open, gate) = gate();
    let source = CannedSource {
        failing: true,
        gate: Some(gate),
        ..Default::default()
    };
    let v = Rc::new(viewer(source, TableGeocoder::default()));
    let event = Rc::new(RefCell::new(None));

    let mut pool = LocalPool::new();
    {
        let v = v.clone();
        let event = event.clone();
        pool.spawner()
            .spawn_local(async move {
                let criteria = FilterCriteria::for_status("공클");
                *event.borrow_mut() = Some(v.on_search(SheetType::GangnamMonthly, &criteria).await);
            })
            .unwrap();
    }
    pool.run_until_stalled();

    assert_eq!(v.on_reset(), ViewerEvent::Cleared);
    open.send(()).unwrap();
    pool.run();

    assert_eq!(*event.borrow(), Some(ViewerEvent::Superseded));
    assert_eq!(v.loaded_count(), 0);
}

#[test]
fn sheet_change_drops_loaded_listings() {
    let mut source = CannedSource::default();
    source
        .sheets
        .insert(SheetType::GangnamMonthly, vec![property("A", "공클", "", "")]);
    let v = viewer(source, TableGeocoder::with(&[("A", 1.0, 1.0)]));
    block_on(v.on_search(SheetType::GangnamMonthly, &FilterCriteria::for_status("공클")));
    assert_eq!(v.loaded_count(), 1);

    assert_eq!(v.on_sheet_changed(SheetType::GangnamJeonse), ViewerEvent::Cleared);
    assert_eq!(v.loaded_count(), 0);
    assert_eq!(v.controller().marker_count(), 0);
}
