//! Lane view: one horizontal band per entity, topic or sentiment bucket, with nearby events
//! merged into expandable groups.

use crate::Result;
use crate::expand::{ExpandState, collapsed_rect, expanded_geometry};
use crate::grouping::{LaneKind, Span, group_key, group_lanes, partition_lanes};
use crate::model::{
    GroupLayout, LaneLayout, LaneRow, LayoutPoint, Placeholder, PlaceholderReason, SpanBounds,
    TickLayout,
};
use crate::scale::{AxisOrientation, NarrativeScale, TimeScale, narrative_ticks, time_ticks};
use crate::text::TextMeasurer;
use chrono::{DateTime, Utc};
use chronolane_core::Event;
use chronolane_core::config::LayoutConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which time drives the horizontal axis of a lane view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneAxis {
    #[default]
    Real,
    Narrative,
}

impl std::str::FromStr for LaneAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "real" | "time" => Ok(Self::Real),
            "narrative" => Ok(Self::Narrative),
            other => Err(format!("unknown lane axis: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneOptions {
    pub kind: LaneKind,
    pub axis: LaneAxis,
    /// Instant of the reference line that hosts events without real time.
    pub reference: Option<DateTime<Utc>>,
}

impl Default for LaneOptions {
    fn default() -> Self {
        Self {
            kind: LaneKind::Entity,
            axis: LaneAxis::Real,
            reference: None,
        }
    }
}

enum AxisScale {
    Time(TimeScale),
    Narrative(NarrativeScale),
    /// Real-time axis with no real time anywhere in the input.
    Missing,
}

impl AxisScale {
    fn build(events: &[Event], axis: LaneAxis, cfg: &LayoutConfig) -> Self {
        let width = cfg.scale.width;
        let scale = match axis {
            LaneAxis::Real => {
                TimeScale::from_events(events, 0.0, width, cfg.scale.exponent).map(Self::Time)
            }
            LaneAxis::Narrative => {
                NarrativeScale::from_events(events, 0.0, width).map(Self::Narrative)
            }
        };
        scale.unwrap_or(Self::Missing)
    }

    /// Pixel start/end of the event along the axis, before the round caps are added.
    fn extent(&self, event: &Event) -> Option<(f64, f64)> {
        match self {
            Self::Time(scale) => {
                let rt = event.real_time.as_ref()?;
                Some((scale.map(rt.start()), scale.map(rt.end())))
            }
            Self::Narrative(scale) => {
                let x = scale.map(event.narrative_time);
                Some((x, x))
            }
            Self::Missing => None,
        }
    }

    fn reference_x(&self, reference: Option<DateTime<Utc>>, width: f64) -> f64 {
        match self {
            Self::Time(scale) => scale.reference_position(reference),
            Self::Narrative(_) | Self::Missing => width,
        }
    }

    fn ticks(&self, cfg: &LayoutConfig, measurer: &dyn TextMeasurer) -> Vec<TickLayout> {
        match self {
            Self::Time(scale) => time_ticks(scale, &cfg.scale, measurer),
            Self::Narrative(scale) => {
                narrative_ticks(scale, &cfg.scale, measurer, AxisOrientation::Horizontal)
            }
            Self::Missing => Vec::new(),
        }
    }
}

fn lane_y(cfg: &LayoutConfig, row: usize) -> f64 {
    cfg.lanes.padding_top + row as f64 * cfg.lanes.height + cfg.lanes.height / 2.0
}

/// Partitions events into lanes, groups nearby events per lane and attaches expand state.
///
/// Events lacking the lane category land on a trailing row; events lacking real time on a
/// real-time axis sit on the reference line of each lane they belong to. Neither joins a group.
pub fn layout_lanes(
    events: &[Event],
    opts: &LaneOptions,
    cfg: &LayoutConfig,
    state: &ExpandState,
    measurer: &dyn TextMeasurer,
) -> Result<LaneLayout> {
    cfg.validate()?;

    let radius = cfg.nodes.radius;
    let axis = AxisScale::build(events, opts.axis, cfg);
    let reference_x = axis.reference_x(opts.reference, cfg.scale.width);
    let (lanes, missing_category) = partition_lanes(events, opts.kind, &cfg.grouping);

    let mut placeholders: Vec<Placeholder> = Vec::new();
    let mut spans_by_lane: IndexMap<String, Vec<Span>> = IndexMap::with_capacity(lanes.len());
    for (row, (lane, members)) in lanes.iter().enumerate() {
        let mut spans: Vec<Span> = Vec::with_capacity(members.len());
        for &pos in members {
            let event = &events[pos];
            match axis.extent(event) {
                Some((start, end)) => spans.push(Span::capsule(start, end, radius, pos)),
                None => {
                    tracing::warn!(
                        event = event.index,
                        lane = lane.as_str(),
                        "event has no real time; placed on the reference line"
                    );
                    placeholders.push(Placeholder {
                        event_index: event.index,
                        x: reference_x,
                        y: lane_y(cfg, row),
                        reason: PlaceholderReason::MissingRealTime,
                    });
                }
            }
        }
        spans_by_lane.insert(lane.clone(), spans);
    }

    let trailing_y = lane_y(cfg, lanes.len());
    for &pos in &missing_category {
        let event = &events[pos];
        tracing::warn!(event = event.index, kind = ?opts.kind, "event has no lane category");
        let x = axis
            .extent(event)
            .map_or(reference_x, |(start, end)| (start + end) / 2.0);
        placeholders.push(Placeholder {
            event_index: event.index,
            x,
            y: trailing_y,
            reason: PlaceholderReason::MissingCategory,
        });
    }

    let grouped = group_lanes(&spans_by_lane, &cfg.grouping);
    let mut groups: Vec<GroupLayout> = Vec::new();
    for (row, (lane, lane_groups)) in grouped.iter().enumerate() {
        let y = lane_y(cfg, row);
        for g in lane_groups {
            let bounds = SpanBounds {
                min: g.start,
                max: g.end,
            };
            let centroid_x = g.spans.iter().map(Span::center).sum::<f64>() / g.len() as f64;
            let expanded_child_geometries = (g.len() > 1).then(|| {
                let members: Vec<(usize, SpanBounds)> = g
                    .spans
                    .iter()
                    .map(|s| {
                        let span = SpanBounds {
                            min: s.start,
                            max: s.end,
                        };
                        (events[s.member].index, span)
                    })
                    .collect();
                expanded_geometry(bounds, y, &members, cfg.lanes.expanded_row_spacing, radius)
            });
            groups.push(GroupLayout {
                key: group_key(lane, events[g.representative()].index),
                lane: lane.clone(),
                member_event_indexes: g.members().map(|pos| events[pos].index).collect(),
                bounds,
                centroid: LayoutPoint::new(centroid_x, y),
                expanded: false,
                collapsed_geometry: collapsed_rect(bounds, y, radius),
                expanded_child_geometries,
            });
        }
    }
    state.apply_to(&mut groups);

    let rows = lanes.len() + usize::from(!missing_category.is_empty());
    let lane_rows: Vec<LaneRow> = lanes
        .keys()
        .enumerate()
        .map(|(row, id)| LaneRow {
            id: id.clone(),
            y: lane_y(cfg, row),
        })
        .collect();

    tracing::debug!(
        events = events.len(),
        lanes = lane_rows.len(),
        groups = groups.len(),
        placeholders = placeholders.len(),
        "lanes laid out"
    );

    Ok(LaneLayout {
        kind: opts.kind,
        lanes: lane_rows,
        groups,
        placeholders,
        ticks: axis.ticks(cfg, measurer),
        width: cfg.scale.width,
        height: 2.0 * cfg.lanes.padding_top + rows as f64 * cfg.lanes.height,
    })
}
