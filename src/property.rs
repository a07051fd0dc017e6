//! Listing records as served by the backend, plus the closed sets of
//! statuses and sheet types the viewer understands.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One property listing. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Property {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub deposit: String,
    #[serde(default)]
    pub monthly_rent: String,
    #[serde(default)]
    pub reg_date: String,
    #[serde(default)]
    pub hyperlink: Option<String>,
    #[serde(default)]
    pub sheet_type: Option<String>,
}

impl Property {
    /// The grouping key, or `None` when the location is blank.
    pub fn location_key(&self) -> Option<&str> {
        let trimmed = self.location.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn parsed_status(&self) -> Option<Status> {
        Status::from_label(&self.status)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Marker color for statuses outside the known set.
pub const FALLBACK_MARKER_COLOR: &str = "#8B95A1";
/// Badge colors (text, background) for statuses outside the known set.
pub const FALLBACK_BADGE_COLORS: (&str, &str) = ("#6B7280", "#F3F4F6");

/// Availability status of a listing, ordered by marker priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Status {
    /// 온하
    Onha,
    /// 공클
    #[default]
    Gongkeul,
    /// 갠매
    Gaenmae,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Gaenmae, Status::Gongkeul, Status::Onha];

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "갠매" => Some(Status::Gaenmae),
            "공클" => Some(Status::Gongkeul),
            "온하" => Some(Status::Onha),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Gaenmae => "갠매",
            Status::Gongkeul => "공클",
            Status::Onha => "온하",
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            Status::Gaenmae => 3,
            Status::Gongkeul => 2,
            Status::Onha => 1,
        }
    }

    pub fn marker_color(self) -> &'static str {
        match self {
            Status::Gaenmae => "#3182F6",
            Status::Gongkeul => "#10B981",
            Status::Onha => "#F59E0B",
        }
    }

    /// (text, background) colors of the popup badge.
    pub fn badge_colors(self) -> (&'static str, &'static str) {
        match self {
            Status::Gaenmae => ("#3182F6", "#EBF8FF"),
            Status::Gongkeul => ("#10B981", "#ECFDF5"),
            Status::Onha => ("#F59E0B", "#FFFBEB"),
        }
    }

    /// DOM id of the matching radio button.
    pub fn dom_id(self) -> &'static str {
        match self {
            Status::Gaenmae => "gaenmae",
            Status::Gongkeul => "gongkeul",
            Status::Onha => "onha",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Priority of a raw status label; unknown labels rank 0.
pub fn status_priority(label: &str) -> u8 {
    Status::from_label(label).map_or(0, Status::priority)
}

/// Which backend collection to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SheetType {
    #[default]
    GangnamMonthly,
    GangnamJeonse,
    SongpaMonthly,
    SongpaJeonse,
}

impl SheetType {
    pub const ALL: [SheetType; 4] = [
        SheetType::GangnamMonthly,
        SheetType::GangnamJeonse,
        SheetType::SongpaMonthly,
        SheetType::SongpaJeonse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SheetType::GangnamMonthly => "강남월세",
            SheetType::GangnamJeonse => "강남전세",
            SheetType::SongpaMonthly => "송파월세",
            SheetType::SongpaJeonse => "송파전세",
        }
    }

    pub fn dom_id(self) -> &'static str {
        match self {
            SheetType::GangnamMonthly => "gangnam-monthly",
            SheetType::GangnamJeonse => "gangnam-jeonse",
            SheetType::SongpaMonthly => "songpa-monthly",
            SheetType::SongpaJeonse => "songpa-jeonse",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }
}

impl fmt::Display for SheetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
