use listing_map::utils::validate_amount_field;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// State and callbacks for one amount field of the filter form.
#[derive(Clone, PartialEq)]
pub struct AmountField {
    /// The current text content of the input field.
    pub text: String,
    /// Validation message shown under the field, if the text is not a number.
    pub error: Option<String>,
    /// Callback for the input's `oninput` event. Stores the text and
    /// re-validates it.
    pub on_input: Callback<InputEvent>,
    /// Empties the field and clears its error.
    pub reset: Callback<()>,
}

/// Custom hook to manage the text and validation state of an amount field.
#[hook]
pub fn use_amount_field(field_name: &'static str) -> AmountField {
    let text_handle: UseStateHandle<String> = use_state(String::new);
    let error_handle: UseStateHandle<Option<String>> = use_state(|| None::<String>);

    let on_input = {
        let text_setter = text_handle.clone();
        let error_setter = error_handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let value = input.value();
            error_setter.set(
                validate_amount_field(&value, field_name)
                    .err()
                    .map(|err| err.to_string()),
            );
            text_setter.set(value);
        })
    };

    let reset = {
        let text_setter = text_handle.clone();
        let error_setter = error_handle.clone();
        Callback::from(move |_| {
            text_setter.set(String::new());
            error_setter.set(None);
        })
    };

    AmountField {
        text: (*text_handle).clone(),
        error: (*error_handle).clone(),
        on_input,
        reset,
    }
}
