use once_cell::sync::Lazy;
use regex::Regex;
use std::num::IntErrorKind;

// Everything that is not an ASCII digit
static NON_DIGIT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").unwrap());

/// Normalize a formatted currency string into integer units.
///
/// All non-digit characters are stripped and the remainder is read as a
/// base-10 integer. Anything that leaves no digits yields 0; a digit run too
/// long for `u64` saturates to `u64::MAX`. A missing value is handled by the
/// caller with `value.map_or(0, parse_amount)`.
///
/// # Examples
/// ```
/// use listing_map::utils::parse_amount;
/// assert_eq!(parse_amount("1,234,000원"), 1_234_000);
/// assert_eq!(parse_amount("협의"), 0);
/// ```
pub fn parse_amount(text: &str) -> u64 {
    let digits = NON_DIGIT_REGEX.replace_all(text, "");
    match digits.parse::<u64>() {
        Ok(value) => value,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
        Err(_) => 0,
    }
}

/// Form field parsing error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    NotANumber(String),
    TooLarge { field: String, max: u64 },
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::NotANumber(field) => write!(f, "{} must be a whole number", field),
            FieldError::TooLarge { field, max } => {
                write!(f, "{} cannot exceed {}", field, max)
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// Generic numeric input validation
pub fn validate_numeric_input<T>(
    input: &str,
    max: Option<T>,
    field_name: &str,
) -> Result<T, FieldError>
where
    T: std::str::FromStr + std::fmt::Display + PartialOrd + Into<u64> + Copy,
{
    let trimmed = input.trim();
    match trimmed.parse::<T>() {
        Ok(val) => {
            if let Some(max_val) = max {
                if val > max_val {
                    return Err(FieldError::TooLarge {
                        field: field_name.to_string(),
                        max: max_val.into(),
                    });
                }
            }
            Ok(val)
        }
        Err(_) => Err(FieldError::NotANumber(field_name.to_string())),
    }
}

/// Validate an amount field from the filter form. Blank means 0 (unbounded).
pub fn validate_amount_field(input: &str, field_name: &str) -> Result<u64, FieldError> {
    if input.trim().is_empty() {
        return Ok(0);
    }
    validate_numeric_input(input, Some(u64::from(u32::MAX)), field_name)
}

/// Milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Yield to the event loop for `ms` milliseconds.
#[cfg(target_arch = "wasm32")]
pub async fn pause_ms(ms: u32) {
    if ms > 0 {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }
}

// Host builds have no browser timer; the pause only matters against the live API.
#[cfg(not(target_arch = "wasm32"))]
pub async fn pause_ms(_ms: u32) {}
