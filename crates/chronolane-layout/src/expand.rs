//! Caller-owned expand/collapse state for aggregate groups.
//!
//! At most one group is open at a time. Layout functions only read the state; transitions go
//! through the methods below, so a host can persist the map between recomputations.

use crate::model::{ExpandedChild, ExpandedGeometry, GroupLayout, LayoutRect, SpanBounds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandState {
    groups: BTreeMap<String, bool>,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.groups.get(key).copied().unwrap_or(false)
    }

    /// Key of the open group, if any.
    pub fn expanded_key(&self) -> Option<&str> {
        self.groups
            .iter()
            .find_map(|(k, &open)| open.then_some(k.as_str()))
    }

    /// Toggles the group. Opening it closes every other group. Single-member groups have nothing
    /// to expand and are left alone.
    pub fn activate(&mut self, key: &str, member_count: usize) {
        if member_count < 2 {
            return;
        }
        if self.is_expanded(key) {
            self.collapse(key);
        } else {
            self.open_exclusive(key);
        }
    }

    pub fn collapse(&mut self, key: &str) {
        if let Some(open) = self.groups.get_mut(key) {
            *open = false;
        }
    }

    /// Background click or deselection.
    pub fn collapse_all(&mut self) {
        for open in self.groups.values_mut() {
            *open = false;
        }
    }

    /// Opens the collapsed aggregate containing `event_index`. Returns the key when a group was
    /// opened; an already open group or a single-member group leaves the state unchanged.
    pub fn select_event(&mut self, event_index: usize, groups: &[GroupLayout]) -> Option<String> {
        let group = groups
            .iter()
            .find(|g| g.member_event_indexes.contains(&event_index))?;
        if !group.is_aggregate() || self.is_expanded(&group.key) {
            return None;
        }
        self.open_exclusive(&group.key);
        Some(group.key.clone())
    }

    /// Copies the state onto freshly computed groups. Unknown groups stay collapsed; stored keys
    /// that match no group are ignored.
    pub fn apply_to(&self, groups: &mut [GroupLayout]) {
        for g in groups {
            g.expanded = g.is_aggregate() && self.is_expanded(&g.key);
        }
    }

    /// Drops stored keys that are no longer produced by the layout.
    pub fn retain_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::BTreeSet<&str> = keys.into_iter().collect();
        self.groups.retain(|k, _| keep.contains(k.as_str()));
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn open_exclusive(&mut self, key: &str) {
        self.collapse_all();
        self.groups.insert(key.to_string(), true);
    }
}

/// Collapsed shape of a group: the group's span over a lane band of `2 * radius`, fully rounded.
pub fn collapsed_rect(bounds: SpanBounds, lane_y: f64, radius: f64) -> LayoutRect {
    LayoutRect {
        x: bounds.min,
        y: lane_y - radius,
        width: bounds.max - bounds.min,
        height: 2.0 * radius,
        corner_radius: radius,
    }
}

/// Expanded shape of an aggregate: a container as wide as the collapsed group, tall enough for
/// one row per member and centered on `center_y`, plus one child per member.
///
/// `members` pairs each event index with its own span, in row order.
pub fn expanded_geometry(
    bounds: SpanBounds,
    center_y: f64,
    members: &[(usize, SpanBounds)],
    row_spacing: f64,
    radius: f64,
) -> ExpandedGeometry {
    let height = members.len() as f64 * row_spacing;
    let top = center_y - height / 2.0;
    let child_height = (2.0 * radius).min(row_spacing);
    let children = members
        .iter()
        .enumerate()
        .map(|(row, &(event_index, span))| {
            let row_center = top + (row as f64 + 0.5) * row_spacing;
            ExpandedChild {
                event_index,
                rect: LayoutRect {
                    x: span.min,
                    y: row_center - child_height / 2.0,
                    width: span.max - span.min,
                    height: child_height,
                    corner_radius: child_height / 2.0,
                },
            }
        })
        .collect();
    ExpandedGeometry {
        container: LayoutRect {
            x: bounds.min,
            y: top,
            width: bounds.max - bounds.min,
            height,
            corner_radius: radius,
        },
        children,
    }
}
