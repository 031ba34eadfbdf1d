//! Serializable export of a cloud.
//!
//! A [`CloudSnapshot`] carries everything a consumer needs to redraw or
//! upload the cloud: the surface size, the time of the last bulk change,
//! and every tracked word with its count, last update and logical bounds.
//! Words appear in name order.

use serde::{Deserialize, Serialize};

use cumulus_core::geometry::Bounds;

/// The exported state of a cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudSnapshot {
    pub layout: LayoutRecord,
    pub words: Vec<WordRecord>,
}

/// Surface size in logical units and the time of the last bulk change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub width: f32,
    pub height: f32,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub name: String,
    pub count: i64,
    pub timestamp: String,
    /// Absent for words that never got a position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundsRecord>,
}

/// Edges of a rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsRecord {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl From<Bounds> for BoundsRecord {
    fn from(bounds: Bounds) -> Self {
        Self {
            top: bounds.min_y(),
            left: bounds.min_x(),
            right: bounds.max_x(),
            bottom: bounds.max_y(),
        }
    }
}

impl From<BoundsRecord> for Bounds {
    fn from(record: BoundsRecord) -> Self {
        Bounds::new_from_edges(record.left, record.top, record.right, record.bottom)
    }
}

impl CloudSnapshot {
    /// Renders the snapshot as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, if any.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a snapshot previously produced by [`to_json_pretty`](Self::to_json_pretty).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn word(&self, name: &str) -> Option<&WordRecord> {
        self.words.iter().find(|word| word.name == name)
    }
}
