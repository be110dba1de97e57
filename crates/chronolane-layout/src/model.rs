use crate::grouping::LaneKind;
use crate::route::Path;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

/// Pixel interval covered by a group on its lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickLayout {
    /// Epoch milliseconds for time axes, narrative time for narrative axes.
    pub value: f64,
    /// Position along the axis.
    pub position: f64,
    pub label: String,
    pub label_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderReason {
    /// The view needs real time and the event has none.
    MissingRealTime,
    /// The event has no value for the lane category (no entities, topic or polarity).
    MissingCategory,
}

/// Fallback placement for an event that cannot join grouping or routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    pub event_index: usize,
    pub x: f64,
    pub y: f64,
    pub reason: PlaceholderReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLayout {
    pub event_index: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub entity_id: String,
    pub name: String,
    pub column_x: f64,
    pub nodes: Vec<NodeLayout>,
    pub path: Path,
    pub path_d: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityColumnsLayout {
    pub columns: Vec<ColumnLayout>,
    /// Events that mention no entity.
    pub placeholders: Vec<Placeholder>,
    /// Narrative-time ticks along the vertical axis.
    pub ticks: Vec<TickLayout>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedChild {
    pub event_index: usize,
    pub rect: LayoutRect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedGeometry {
    pub container: LayoutRect,
    pub children: Vec<ExpandedChild>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLayout {
    pub key: String,
    pub lane: String,
    pub member_event_indexes: Vec<usize>,
    pub bounds: SpanBounds,
    pub centroid: LayoutPoint,
    pub expanded: bool,
    pub collapsed_geometry: LayoutRect,
    /// Present for multi-member groups only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_child_geometries: Option<ExpandedGeometry>,
}

impl GroupLayout {
    pub fn is_aggregate(&self) -> bool {
        self.member_event_indexes.len() > 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneRow {
    pub id: String,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneLayout {
    pub kind: LaneKind,
    pub lanes: Vec<LaneRow>,
    pub groups: Vec<GroupLayout>,
    pub placeholders: Vec<Placeholder>,
    pub ticks: Vec<TickLayout>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCurveLayout {
    pub points: Vec<NodeLayout>,
    pub path: Path,
    pub path_d: String,
    pub placeholders: Vec<Placeholder>,
    pub ticks: Vec<TickLayout>,
    pub width: f64,
    pub height: f64,
}
