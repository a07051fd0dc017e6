//! Pure Yew view components for the listing map UI.
//!
//! This module contains stateless components that render based on props,
//! making them easy to test and reuse.

use crate::hooks::AmountField;
use listing_map::config::EMPTY_RESULTS_MESSAGE;
use listing_map::{SheetType, Status};
use yew::prelude::*;

/// What the listing panel under the form shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingState {
    #[default]
    Cleared,
    /// The last render matched nothing.
    Empty,
}

#[derive(Properties, PartialEq)]
pub struct SheetSelectorProps {
    pub selected: SheetType,
    pub onchange: Callback<SheetType>,
}

/// Radio group choosing which sheet to load.
#[function_component(SheetSelector)]
pub fn sheet_selector(props: &SheetSelectorProps) -> Html {
    html! {
        <div class="form-group sheet-types">
            <label>{ "매물 유형" }</label>
            { SheetType::ALL.iter().map(|&sheet| {
                let onchange = props.onchange.reform(move |_: Event| sheet);
                html! {
                    <label class="radio" for={sheet.dom_id()}>
                        <input type="radio"
                            name="sheetType"
                            id={sheet.dom_id()}
                            value={sheet.label()}
                            checked={props.selected == sheet}
                            {onchange}
                        />
                        { sheet.label() }
                    </label>
                }
            }).collect::<Html>() }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusSelectorProps {
    pub selected: Status,
    pub onchange: Callback<Status>,
}

/// Radio group choosing the status filter, each option in its marker color.
#[function_component(StatusSelector)]
pub fn status_selector(props: &StatusSelectorProps) -> Html {
    html! {
        <div class="form-group status-filter">
            <label>{ "매물 상태" }</label>
            { Status::ALL.iter().map(|&status| {
                let onchange = props.onchange.reform(move |_: Event| status);
                html! {
                    <label class="radio" for={status.dom_id()}>
                        <input type="radio"
                            name="statusFilter"
                            id={status.dom_id()}
                            value={status.label()}
                            checked={props.selected == status}
                            {onchange}
                        />
                        <span class="status-dot"
                            style={format!("background: {}", status.marker_color())}></span>
                        { status.label() }
                    </label>
                }
            }).collect::<Html>() }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct AmountInputProps {
    pub id: AttrValue,
    pub field: AmountField,
    #[prop_or_default]
    pub suffix: AttrValue,
}

#[function_component(AmountInput)]
pub fn amount_input(props: &AmountInputProps) -> Html {
    let field = &props.field;
    html! {
        <span class="amount-input">
            <input type="text"
                inputmode="numeric"
                id={props.id.clone()}
                placeholder="0"
                value={field.text.clone()}
                class={if field.error.is_some() { "invalid" } else { "" }}
                oninput={field.on_input.clone()}
            />
            { props.suffix.clone() }
            if let Some(ref err) = field.error {
                <div class="input-error">{ err }</div>
            }
        </span>
    }
}

/// Displays the number of listings on the map.
#[derive(Properties, PartialEq)]
pub struct PropertyCountProps {
    pub count: usize,
}

#[function_component(PropertyCount)]
pub fn property_count(props: &PropertyCountProps) -> Html {
    html! {
        <div class="property-count">{ format!("매물 {}개", props.count) }</div>
    }
}

/// Renders the listing panel for the current state.
pub fn render_listing(state: ListingState) -> Html {
    match state {
        ListingState::Cleared => html! { <div id="propertyList"></div> },
        ListingState::Empty => html! {
            <div id="propertyList">
                <div class="empty-list">{ EMPTY_RESULTS_MESSAGE }</div>
            </div>
        },
    }
}

/// Renders a dismissable notice, e.g. a failed load.
pub fn render_notice(notice: &Option<String>, ondismiss: Callback<MouseEvent>) -> Html {
    match notice {
        Some(message) => html! {
            <div class="current-error compact">
                { message }
                <button class="btn-secondary small" onclick={ondismiss}>{ "닫기" }</button>
            </div>
        },
        None => html! {},
    }
}
