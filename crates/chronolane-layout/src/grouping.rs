//! Proximity grouping: per-lane sweep that merges spans closer than a pixel gap threshold.

use chronolane_core::Event;
use chronolane_core::config::GroupingConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Pixel interval of one member on a lane. `member` indexes the caller's event slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
    pub member: usize,
}

impl Span {
    /// Capsule around `[start_px, end_px]` with round caps of `radius`, so instants get a
    /// minimum width of `2 * radius`.
    pub fn capsule(start_px: f64, end_px: f64, radius: f64, member: usize) -> Self {
        Self {
            start: start_px - radius,
            end: end_px + radius,
            member,
        }
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// A finalized run of merged spans. `start`/`end` are the union of the member spans.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanGroup {
    pub start: f64,
    pub end: f64,
    /// Members in sweep order; the first one is the group's representative.
    pub spans: Vec<Span>,
}

impl SpanGroup {
    fn open(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
            spans: vec![span],
        }
    }

    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.spans.iter().map(|s| s.member)
    }

    pub fn representative(&self) -> usize {
        self.spans[0].member
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Groups the spans of one lane.
///
/// Spans are visited by ascending `start` (ties by `member`). A span joins the open group when
/// `span.start - group.end <= threshold`; overlapping spans have a negative gap and always join.
pub fn group_spans(spans: &[Span], threshold: f64) -> Vec<SpanGroup> {
    let mut sorted: Vec<Span> = spans.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.member.cmp(&b.member)));

    let mut out: Vec<SpanGroup> = Vec::new();
    let mut acc: Option<SpanGroup> = None;
    for span in sorted {
        match acc.as_mut() {
            Some(group) if span.start - group.end <= threshold => {
                group.end = group.end.max(span.end);
                group.spans.push(span);
            }
            _ => {
                if let Some(done) = acc.replace(SpanGroup::open(span)) {
                    out.push(done);
                }
            }
        }
    }
    out.extend(acc);
    out
}

/// Groups every lane independently, honoring per-lane threshold overrides.
pub fn group_lanes(
    lanes: &IndexMap<String, Vec<Span>>,
    cfg: &GroupingConfig,
) -> IndexMap<String, Vec<SpanGroup>> {
    lanes
        .iter()
        .map(|(lane, spans)| (lane.clone(), group_spans(spans, cfg.threshold_for(lane))))
        .collect()
}

/// Stable across recomputation for the same lane and representative event.
pub fn group_key(lane: &str, representative_event_index: usize) -> String {
    format!("{lane}#{representative_event_index}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneKind {
    #[default]
    Entity,
    Topic,
    Sentiment,
}

impl std::str::FromStr for LaneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entity" | "entities" => Ok(Self::Entity),
            "topic" | "topics" => Ok(Self::Topic),
            "sentiment" => Ok(Self::Sentiment),
            other => Err(format!("unknown lane kind: {other}")),
        }
    }
}

pub const SENTIMENT_NEGATIVE: &str = "negative";
pub const SENTIMENT_NEUTRAL: &str = "neutral";
pub const SENTIMENT_POSITIVE: &str = "positive";

pub fn sentiment_bucket(polarity: f64, threshold: f64) -> &'static str {
    if polarity < -threshold {
        SENTIMENT_NEGATIVE
    } else if polarity > threshold {
        SENTIMENT_POSITIVE
    } else {
        SENTIMENT_NEUTRAL
    }
}

/// Lanes an event belongs to under `kind`. Empty when the event lacks the category.
pub fn lanes_of(event: &Event, kind: LaneKind, cfg: &GroupingConfig) -> Vec<String> {
    match kind {
        LaneKind::Entity => event.entity_ids().map(str::to_string).collect(),
        LaneKind::Topic => event.topic.iter().cloned().collect(),
        LaneKind::Sentiment => event
            .sentiment_polarity
            .map(|p| sentiment_bucket(p, cfg.sentiment_threshold).to_string())
            .into_iter()
            .collect(),
    }
}

/// Lane id → positions (into `events`) of the events on that lane, plus the positions of events
/// that belong to no lane.
///
/// Entity and topic lanes appear in first-mention order; sentiment lanes in
/// negative/neutral/positive order, empty buckets omitted.
pub fn partition_lanes(
    events: &[Event],
    kind: LaneKind,
    cfg: &GroupingConfig,
) -> (IndexMap<String, Vec<usize>>, Vec<usize>) {
    let mut lanes: IndexMap<String, Vec<usize>> = IndexMap::new();
    if kind == LaneKind::Sentiment {
        for bucket in [SENTIMENT_NEGATIVE, SENTIMENT_NEUTRAL, SENTIMENT_POSITIVE] {
            lanes.insert(bucket.to_string(), Vec::new());
        }
    }
    let mut missing: Vec<usize> = Vec::new();
    for (pos, event) in events.iter().enumerate() {
        let ids = lanes_of(event, kind, cfg);
        if ids.is_empty() {
            missing.push(pos);
            continue;
        }
        for id in ids {
            lanes.entry(id).or_default().push(pos);
        }
    }
    lanes.retain(|_, members| !members.is_empty());
    (lanes, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64, member: usize) -> Span {
        Span { start, end, member }
    }

    #[test]
    fn touching_spans_within_threshold_merge() {
        let groups = group_spans(&[span(0.0, 10.0, 0), span(15.0, 20.0, 1)], 5.0);
        assert_eq!(groups.len(), 1);
        assert_eq!((groups[0].start, groups[0].end), (0.0, 20.0));
    }

    #[test]
    fn gap_above_threshold_splits() {
        let groups = group_spans(&[span(0.0, 10.0, 0), span(15.1, 20.0, 1)], 5.0);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn contained_span_does_not_shrink_the_group() {
        let groups = group_spans(
            &[span(0.0, 100.0, 0), span(10.0, 20.0, 1), span(104.0, 110.0, 2)],
            5.0,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].end, 110.0);
    }

    #[test]
    fn ties_break_by_member_index() {
        let groups = group_spans(&[span(5.0, 6.0, 7), span(5.0, 6.0, 2)], 0.0);
        assert_eq!(groups[0].members().collect::<Vec<_>>(), vec![2, 7]);
        assert_eq!(groups[0].representative(), 2);
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_spans(&[], 10.0).is_empty());
    }

    #[test]
    fn sentiment_buckets_respect_threshold() {
        assert_eq!(sentiment_bucket(-0.5, 0.1), SENTIMENT_NEGATIVE);
        assert_eq!(sentiment_bucket(-0.1, 0.1), SENTIMENT_NEUTRAL);
        assert_eq!(sentiment_bucket(0.0, 0.1), SENTIMENT_NEUTRAL);
        assert_eq!(sentiment_bucket(0.3, 0.1), SENTIMENT_POSITIVE);
    }

    #[test]
    fn lane_kind_parses_loosely() {
        assert_eq!("Topics".parse::<LaneKind>(), Ok(LaneKind::Topic));
        assert!("mood".parse::<LaneKind>().is_err());
    }
}
