//! Time curve: events placed by real time horizontally and narrative time vertically, joined in
//! narrative order.

use crate::Result;
use crate::model::{LayoutPoint, NodeLayout, Placeholder, PlaceholderReason, TimeCurveLayout};
use crate::route::route;
use crate::scale::{NarrativeScale, TimeScale, time_ticks};
use crate::text::TextMeasurer;
use chrono::{DateTime, Utc};
use chronolane_core::Event;
use chronolane_core::config::LayoutConfig;

pub fn layout_time_curve(
    events: &[Event],
    cfg: &LayoutConfig,
    reference: Option<DateTime<Utc>>,
    measurer: &dyn TextMeasurer,
) -> Result<TimeCurveLayout> {
    cfg.validate()?;

    let width = cfg.scale.width;
    let height = cfg.scale.height;
    let y_start = cfg.columns.padding_top;
    let y_end = (height - cfg.columns.padding_bottom).max(y_start);
    let time = TimeScale::from_events(events, 0.0, width, cfg.scale.exponent);
    let Some(narrative) = NarrativeScale::from_events(events, y_start, y_end) else {
        return Ok(TimeCurveLayout {
            points: Vec::new(),
            path: Default::default(),
            path_d: String::new(),
            placeholders: Vec::new(),
            ticks: Vec::new(),
            width,
            height,
        });
    };
    let reference_x = time.map_or(width, |s| s.reference_position(reference));

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        events[a]
            .narrative_time
            .total_cmp(&events[b].narrative_time)
            .then(events[a].index.cmp(&events[b].index))
    });

    let mut points: Vec<NodeLayout> = Vec::with_capacity(events.len());
    let mut placeholders: Vec<Placeholder> = Vec::new();
    for pos in order {
        let event = &events[pos];
        let y = narrative.map(event.narrative_time);
        let x = time.zip(event.real_time.as_ref()).map(|(scale, rt)| {
            // Intervals sit at the midpoint of their mapped extent.
            (scale.map(rt.start()) + scale.map(rt.end())) / 2.0
        });
        match x {
            Some(x) => points.push(NodeLayout {
                event_index: event.index,
                x,
                y,
            }),
            None => {
                tracing::warn!(
                    event = event.index,
                    "event has no real time; placed on the reference line"
                );
                placeholders.push(Placeholder {
                    event_index: event.index,
                    x: reference_x,
                    y,
                    reason: PlaceholderReason::MissingRealTime,
                });
            }
        }
    }

    let vertices: Vec<LayoutPoint> = points.iter().map(|p| LayoutPoint::new(p.x, p.y)).collect();
    let path = route(&vertices, &cfg.route, true);

    tracing::debug!(
        events = events.len(),
        points = points.len(),
        placeholders = placeholders.len(),
        "time curve laid out"
    );

    Ok(TimeCurveLayout {
        points,
        path_d: path.to_svg_d(),
        path,
        placeholders,
        ticks: time
            .map(|s| time_ticks(&s, &cfg.scale, measurer))
            .unwrap_or_default(),
        width,
        height,
    })
}
