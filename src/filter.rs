//! The property filter predicate and the form-to-criteria marshaling.

use crate::config::MANWON_PER_EOK;
use crate::property::Property;
use crate::utils::{parse_amount, validate_amount_field, FieldError};

/// Filter values in comparable form. A min/max of 0 is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub status: String,
    /// Lower-cased, trimmed substring to look for in the location.
    pub search_text: String,
    pub deposit_min: u64,
    pub deposit_max: u64,
    pub rent_min: u64,
    pub rent_max: u64,
}

impl FilterCriteria {
    pub fn for_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, text: &str) -> Self {
        self.search_text = text.trim().to_lowercase();
        self
    }

    pub fn with_deposit(mut self, min: u64, max: u64) -> Self {
        self.deposit_min = min;
        self.deposit_max = max;
        self
    }

    pub fn with_rent(mut self, min: u64, max: u64) -> Self {
        self.rent_min = min;
        self.rent_max = max;
        self
    }

    /// Whether a single property passes every clause. Clauses run in order
    /// and stop at the first failure.
    pub fn matches(&self, property: &Property) -> bool {
        if property.status.trim() != self.status.trim() {
            return false;
        }

        if !self.search_text.is_empty() {
            let location = property.location.trim();
            if location.is_empty() || !location.to_lowercase().contains(&self.search_text) {
                return false;
            }
        }

        let deposit = parse_amount(&property.deposit);
        if !within_bounds(deposit, self.deposit_min, self.deposit_max) {
            return false;
        }

        let rent = parse_amount(&property.monthly_rent);
        within_bounds(rent, self.rent_min, self.rent_max)
    }
}

#[inline]
fn within_bounds(value: u64, min: u64, max: u64) -> bool {
    !(min > 0 && value < min) && !(max > 0 && value > max)
}

/// Select the properties matching `criteria`, preserving input order.
pub fn filter_properties(all: &[Property], criteria: &FilterCriteria) -> Vec<Property> {
    let matched: Vec<Property> = all
        .iter()
        .filter(|p| criteria.matches(p))
        .cloned()
        .collect();
    log::debug!("Filter kept {}/{} properties", matched.len(), all.len());
    matched
}

/// Raw text of the filter form controls, as the UI layer reads them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterForm {
    pub status: String,
    pub search_text: String,
    pub deposit_billion_start: String,
    pub deposit_million_start: String,
    pub deposit_billion_end: String,
    pub deposit_million_end: String,
    pub rent_start: String,
    pub rent_end: String,
}

impl FilterForm {
    /// Convert the form into criteria. Deposits combine 억 and 만원 fields
    /// into 만원; rents are already in 만원.
    pub fn to_criteria(&self) -> Result<FilterCriteria, FieldError> {
        let deposit_min = combine_deposit(
            validate_amount_field(&self.deposit_billion_start, "보증금 시작(억)")?,
            validate_amount_field(&self.deposit_million_start, "보증금 시작(만원)")?,
        );
        let deposit_max = combine_deposit(
            validate_amount_field(&self.deposit_billion_end, "보증금 끝(억)")?,
            validate_amount_field(&self.deposit_million_end, "보증금 끝(만원)")?,
        );
        let rent_min = validate_amount_field(&self.rent_start, "월세 시작")?;
        let rent_max = validate_amount_field(&self.rent_end, "월세 끝")?;

        Ok(FilterCriteria::for_status(self.status.trim())
            .with_search(&self.search_text)
            .with_deposit(deposit_min, deposit_max)
            .with_rent(rent_min, rent_max))
    }

    /// Clear the search text and every amount field, keeping the status.
    pub fn reset_search_fields(&mut self) {
        *self = FilterForm {
            status: std::mem::take(&mut self.status),
            ..Default::default()
        };
    }
}

#[inline]
fn combine_deposit(billion: u64, million: u64) -> u64 {
    billion.saturating_mul(MANWON_PER_EOK).saturating_add(million)
}
