//! Groups filtered listings by location so each address gets one marker.

use crate::property::{status_priority, Property, Status, FALLBACK_MARKER_COLOR};
use std::collections::HashMap;

/// Properties sharing one trimmed location. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationGroup {
    pub location: String,
    pub properties: Vec<Property>,
}

impl LocationGroup {
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The raw status label of the highest-priority property. On equal
    /// priority the earlier property wins.
    pub fn representative_status(&self) -> &str {
        self.properties
            .iter()
            .reduce(|best, current| {
                if status_priority(&current.status) > status_priority(&best.status) {
                    current
                } else {
                    best
                }
            })
            .map_or("", |p| p.status.as_str())
    }

    pub fn marker_color(&self) -> &'static str {
        Status::from_label(self.representative_status())
            .map_or(FALLBACK_MARKER_COLOR, Status::marker_color)
    }

    /// `location` alone for a single listing, `"{location} ({count})"` otherwise.
    pub fn label(&self) -> String {
        if self.properties.len() > 1 {
            format!("{} ({})", self.location, self.properties.len())
        } else {
            self.location.clone()
        }
    }
}

/// Bucket properties by trimmed location, in first-seen order.
///
/// Listings with a blank location cannot be placed; they are logged and
/// left out.
pub fn group_by_location(properties: &[Property]) -> Vec<LocationGroup> {
    let mut groups: Vec<LocationGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut skipped = 0usize;

    for property in properties {
        let Some(key) = property.location_key() else {
            skipped += 1;
            log::warn!("Property {} has no location, skipping marker", property.id);
            continue;
        };
        match index.get(key) {
            Some(&pos) => groups[pos].properties.push(property.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(LocationGroup {
                    location: key.to_string(),
                    properties: vec![property.clone()],
                });
            }
        }
    }

    if skipped > 0 {
        log::warn!("{} properties without a location were not grouped", skipped);
    }
    log::debug!(
        "Grouped {} properties into {} locations",
        properties.len() - skipped,
        groups.len()
    );
    groups
}
