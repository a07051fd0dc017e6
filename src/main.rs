//! Listing map application using Yew.
//! Wires the filter form, the map widget and the viewer commands.

use listing_map::api::HttpBackend;
use listing_map::cache::LocalStorageStore;
use listing_map::config::{ViewerConfig, CONFIG_GLOBAL, MAP_ELEMENT_ID};
use listing_map::{
    FilterForm, GeocodeClient, MarkerHandle, RenderController, RenderOutcome, SheetType, Status,
    Viewer, ViewerEvent,
};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;
use yew::prelude::*;

mod components;
mod hooks;
mod map;

use components::{
    render_listing, render_notice, AmountInput, ListingState, PropertyCount, SheetSelector,
    StatusSelector,
};
use hooks::{use_amount_field, AmountField};
use map::NaverMapSurface;

type AppViewer = Viewer<HttpBackend, NaverMapSurface, HttpBackend, LocalStorageStore>;

/// Read `window.LISTING_MAP_CONFIG`, falling back to defaults.
fn load_config() -> ViewerConfig {
    let global = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(CONFIG_GLOBAL))
        .unwrap_or(JsValue::UNDEFINED);
    if global.is_undefined() || global.is_null() {
        return ViewerConfig::default();
    }
    match serde_wasm_bindgen::from_value::<ViewerConfig>(global) {
        Ok(config) => config.validated(),
        Err(e) => {
            log::warn!("Ignoring malformed {}: {}", CONFIG_GLOBAL, e);
            ViewerConfig::default()
        }
    }
}

fn build_viewer(config: &ViewerConfig, listing: Callback<ListingState>) -> AppViewer {
    let backend = HttpBackend::new(config.api_base.clone());
    let geocoder = GeocodeClient::from_config(backend.clone(), LocalStorageStore, config);
    let controller = RenderController::new(NaverMapSurface::new(listing), geocoder);
    Viewer::new(backend, controller)
}

/// The six amount inputs in form order.
#[derive(Clone)]
struct AmountFields {
    deposit_billion_start: AmountField,
    deposit_million_start: AmountField,
    deposit_billion_end: AmountField,
    deposit_million_end: AmountField,
    rent_start: AmountField,
    rent_end: AmountField,
}

impl AmountFields {
    fn form(&self, status: Status, search_text: &str) -> FilterForm {
        FilterForm {
            status: status.label().to_string(),
            search_text: search_text.to_string(),
            deposit_billion_start: self.deposit_billion_start.text.clone(),
            deposit_million_start: self.deposit_million_start.text.clone(),
            deposit_billion_end: self.deposit_billion_end.text.clone(),
            deposit_million_end: self.deposit_million_end.text.clone(),
            rent_start: self.rent_start.text.clone(),
            rent_end: self.rent_end.text.clone(),
        }
    }

    fn reset(&self) {
        for field in [
            &self.deposit_billion_start,
            &self.deposit_million_start,
            &self.deposit_billion_end,
            &self.deposit_million_end,
            &self.rent_start,
            &self.rent_end,
        ] {
            field.reset.emit(());
        }
    }
}

/// Handles the UI keeps updated from viewer events.
#[derive(Clone)]
struct StatusHandles {
    count: UseStateHandle<usize>,
    notice: UseStateHandle<Option<String>>,
    loading: UseStateHandle<bool>,
}

impl StatusHandles {
    fn report(&self, event: ViewerEvent) {
        match event {
            ViewerEvent::Loaded { matched, outcome, .. }
            | ViewerEvent::Filtered { matched, outcome } => {
                if outcome != RenderOutcome::Superseded {
                    self.count.set(matched);
                    self.notice.set(None);
                }
            }
            ViewerEvent::LoadFailed(reason) => {
                self.count.set(0);
                self.notice
                    .set(Some(format!("매물 정보를 불러오지 못했습니다: {}", reason)));
            }
            ViewerEvent::Cleared => {
                self.count.set(0);
                self.notice.set(None);
            }
            ViewerEvent::NothingLoaded | ViewerEvent::Superseded => {}
        }
        self.loading.set(false);
    }
}

#[function_component(App)]
fn app() -> Html {
    let listing = use_state(ListingState::default);
    let viewer: Rc<AppViewer> = {
        let setter = listing.setter();
        use_memo((), move |_| {
            let config = load_config();
            log::info!("Starting listing map with {:?}", config);
            build_viewer(&config, Callback::from(move |state| setter.set(state)))
        })
    };

    let sheet = use_state(SheetType::default);
    let status = use_state(Status::default);
    let search_text = use_state(String::new);
    let fields = AmountFields {
        deposit_billion_start: use_amount_field("보증금 시작(억)"),
        deposit_million_start: use_amount_field("보증금 시작(만원)"),
        deposit_billion_end: use_amount_field("보증금 끝(억)"),
        deposit_million_end: use_amount_field("보증금 끝(만원)"),
        rent_start: use_amount_field("월세 시작"),
        rent_end: use_amount_field("월세 끝"),
    };
    let handles = StatusHandles {
        count: use_state(|| 0usize),
        notice: use_state(|| None::<String>),
        loading: use_state(|| false),
    };

    // Map widget setup; marker clicks come back with the handle addMarker returned
    {
        let viewer = viewer.clone();
        use_effect_with((), move |_| {
            let on_click = Closure::<dyn Fn(u32)>::new(move |id: u32| {
                viewer.controller().toggle_popup(MarkerHandle(id));
            });
            if !map::init_map(MAP_ELEMENT_ID, on_click.as_ref().unchecked_ref()) {
                log::error!("Map widget unavailable; markers will not be drawn");
            }
            on_click.forget();
            || ()
        });
    }

    // Re-filter the loaded listings with the given status
    let refilter = {
        let viewer = viewer.clone();
        let handles = handles.clone();
        let form_fields = fields.form(Status::default(), &search_text);
        Callback::from(move |selected: Status| {
            let form = FilterForm {
                status: selected.label().to_string(),
                ..form_fields.clone()
            };
            let criteria = match form.to_criteria() {
                Ok(c) => c,
                Err(e) => {
                    handles.notice.set(Some(e.to_string()));
                    return;
                }
            };
            let viewer = viewer.clone();
            let handles = handles.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = viewer.on_filter_changed(&criteria).await;
                handles.report(event);
            });
        })
    };

    let on_search = {
        let viewer = viewer.clone();
        let handles = handles.clone();
        let sheet = *sheet;
        let form = fields.form(*status, &search_text);
        Callback::from(move |_: MouseEvent| {
            let criteria = match form.to_criteria() {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Search blocked by invalid input: {}", e);
                    handles.notice.set(Some(e.to_string()));
                    return;
                }
            };
            handles.loading.set(true);
            let viewer = viewer.clone();
            let handles = handles.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = viewer.on_search(sheet, &criteria).await;
                handles.report(event);
            });
        })
    };

    let on_sheet_change = {
        let viewer = viewer.clone();
        let handles = handles.clone();
        let sheet = sheet.clone();
        Callback::from(move |selected: SheetType| {
            sheet.set(selected);
            handles.report(viewer.on_sheet_changed(selected));
        })
    };

    let on_status_change = {
        let status = status.clone();
        let refilter = refilter.clone();
        Callback::from(move |selected: Status| {
            status.set(selected);
            refilter.emit(selected);
        })
    };

    let search_oninput = {
        let search_text = search_text.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            search_text.set(input.value());
        })
    };
    let search_onkeydown = {
        let status = *status;
        let refilter = refilter.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                refilter.emit(status);
            }
        })
    };

    let on_reset = {
        let viewer = viewer.clone();
        let handles = handles.clone();
        let sheet = sheet.clone();
        let status = status.clone();
        let search_text = search_text.clone();
        let fields = fields.clone();
        Callback::from(move |_: MouseEvent| {
            sheet.set(SheetType::default());
            status.set(Status::default());
            search_text.set(String::new());
            fields.reset();
            handles.report(viewer.on_reset());
        })
    };

    let on_clear_fields = {
        let search_text = search_text.clone();
        let fields = fields.clone();
        Callback::from(move |_: MouseEvent| {
            search_text.set(String::new());
            fields.reset();
        })
    };

    let dismiss_notice = {
        let notice = handles.notice.clone();
        Callback::from(move |_: MouseEvent| notice.set(None))
    };

    html! {
        <div class="container">
            <aside class="filter-panel">
                <h1>{ "매물 지도" }</h1>

                <SheetSelector selected={*sheet} onchange={on_sheet_change} />
                <StatusSelector selected={*status} onchange={on_status_change} />

                <div class="form-group">
                    <label for="searchInput">{ "검색" }</label>
                    <input type="text"
                        id="searchInput"
                        placeholder="위치 검색"
                        value={(*search_text).clone()}
                        oninput={search_oninput}
                        onkeydown={search_onkeydown}
                    />
                </div>

                <div class="form-group">
                    <label>{ "보증금" }</label>
                    <div class="form-row">
                        <AmountInput id="depositBillionStart" field={fields.deposit_billion_start.clone()} suffix="억" />
                        <AmountInput id="depositMillionStart" field={fields.deposit_million_start.clone()} suffix="만원" />
                        { "~" }
                        <AmountInput id="depositBillionEnd" field={fields.deposit_billion_end.clone()} suffix="억" />
                        <AmountInput id="depositMillionEnd" field={fields.deposit_million_end.clone()} suffix="만원" />
                    </div>
                </div>

                <div class="form-group">
                    <label>{ "월세" }</label>
                    <div class="form-row">
                        <AmountInput id="rentStart" field={fields.rent_start.clone()} suffix="만원" />
                        { "~" }
                        <AmountInput id="rentEnd" field={fields.rent_end.clone()} suffix="만원" />
                    </div>
                </div>

                <div class="form-row buttons">
                    <button class="btn-primary" disabled={*handles.loading} onclick={on_search}>
                        if *handles.loading { { "검색 중..." } } else { { "검색" } }
                    </button>
                    <button class="btn-secondary" onclick={on_clear_fields}>{ "조건 초기화" }</button>
                    <button class="btn-secondary" onclick={on_reset}>{ "전체 초기화" }</button>
                </div>

                <PropertyCount count={*handles.count} />
                { render_notice(&handles.notice, dismiss_notice) }
                { render_listing(*listing) }
            </aside>

            <div id={MAP_ELEMENT_ID} class="map"></div>
        </div>
    }
}

/// Entry point: installs logging and renders the app.
fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    yew::Renderer::<App>::new().render();
}
