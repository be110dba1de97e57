//! Temporal scales: calendar time and narrative (ordinal) time mapped onto pixels.

use crate::model::TickLayout;
use crate::text::{TextMeasurer, TextStyle};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chronolane_core::Event;
use chronolane_core::config::ScaleConfig;
use chronolane_core::time::{MS_PER_DAY, MS_PER_YEAR, from_millis};
use serde::{Deserialize, Serialize};

const MAX_TICKS: usize = 2_000;

/// Maps calendar instants onto `[range_start, range_end]`, with optional power-law distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    min_ms: i64,
    max_ms: i64,
    range_start: f64,
    range_end: f64,
    exponent: f64,
}

impl TimeScale {
    pub fn new(min_ms: i64, max_ms: i64, range_start: f64, range_end: f64, exponent: f64) -> Self {
        let (min_ms, max_ms) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        let exponent = if exponent.is_finite() && exponent > 0.0 {
            exponent
        } else {
            1.0
        };
        Self {
            min_ms,
            max_ms,
            range_start,
            range_end,
            exponent,
        }
    }

    /// Domain over every event with real time (interval endpoints included).
    ///
    /// Returns `None` when no event carries real time.
    pub fn from_events(
        events: &[Event],
        range_start: f64,
        range_end: f64,
        exponent: f64,
    ) -> Option<Self> {
        let mut bounds: Option<(i64, i64)> = None;
        for rt in events.iter().filter_map(|e| e.real_time.as_ref()) {
            let (a, b) = (rt.start_ms(), rt.end_ms());
            let (lo, hi) = (a.min(b), a.max(b));
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(lo), max.max(hi)),
                None => (lo, hi),
            });
        }
        let (min_ms, max_ms) = bounds?;
        Some(Self::new(min_ms, max_ms, range_start, range_end, exponent))
    }

    pub fn domain_ms(&self) -> (i64, i64) {
        (self.min_ms, self.max_ms)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    /// Zero or one distinct domain value.
    pub fn is_degenerate(&self) -> bool {
        self.max_ms <= self.min_ms
    }

    pub fn map(&self, at: DateTime<Utc>) -> f64 {
        self.map_ms(at.timestamp_millis())
    }

    pub fn map_ms(&self, ms: i64) -> f64 {
        if self.is_degenerate() {
            return (self.range_start + self.range_end) / 2.0;
        }
        let t = (ms - self.min_ms) as f64 / (self.max_ms - self.min_ms) as f64;
        let t = signed_pow(t, self.exponent);
        self.range_start + t * (self.range_end - self.range_start)
    }

    pub fn invert_ms(&self, px: f64) -> i64 {
        let span = self.range_end - self.range_start;
        if self.is_degenerate() || span == 0.0 {
            return self.min_ms;
        }
        let t = signed_pow((px - self.range_start) / span, 1.0 / self.exponent);
        self.min_ms + (t * (self.max_ms - self.min_ms) as f64).round() as i64
    }

    pub fn invert(&self, px: f64) -> Option<DateTime<Utc>> {
        from_millis(self.invert_ms(px))
    }

    /// Position of the reference line used for events without real time: the reference instant
    /// clamped into the range, or the range end when no reference is given.
    pub fn reference_position(&self, reference: Option<DateTime<Utc>>) -> f64 {
        match reference {
            Some(at) => {
                let lo = self.range_start.min(self.range_end);
                let hi = self.range_start.max(self.range_end);
                self.map(at).clamp(lo, hi)
            }
            None => self.range_end,
        }
    }

    pub fn tick_interval(&self) -> TickInterval {
        TickInterval::for_span_ms(self.max_ms - self.min_ms)
    }

    /// Tick instants (epoch ms) aligned to the adaptive interval boundaries.
    pub fn tick_values(&self) -> Vec<i64> {
        if self.is_degenerate() {
            return vec![self.min_ms];
        }
        let interval = self.tick_interval();
        match interval.months() {
            Some(step) => month_ticks(self.min_ms, self.max_ms, step),
            None => {
                let step_days = if interval == TickInterval::Week { 7 } else { 1 };
                day_ticks(self.min_ms, self.max_ms, step_days, interval == TickInterval::Week)
            }
        }
    }
}

fn signed_pow(t: f64, exponent: f64) -> f64 {
    if exponent == 1.0 {
        return t;
    }
    if t < 0.0 {
        -(-t).powf(exponent)
    } else {
        t.powf(exponent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TickInterval {
    Day,
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
    TwoYears,
    Decade,
}

impl TickInterval {
    pub fn for_span_ms(span_ms: i64) -> Self {
        let days = span_ms as f64 / MS_PER_DAY as f64;
        let years = span_ms as f64 / MS_PER_YEAR;
        if days <= 15.0 {
            Self::Day
        } else if days <= 91.0 {
            Self::Week
        } else if years <= 1.0 {
            Self::Month
        } else if years <= 2.0 {
            Self::Quarter
        } else if years <= 5.0 {
            Self::HalfYear
        } else if years <= 10.0 {
            Self::Year
        } else if years <= 20.0 {
            Self::TwoYears
        } else {
            Self::Decade
        }
    }

    fn months(self) -> Option<i32> {
        match self {
            Self::Day | Self::Week => None,
            Self::Month => Some(1),
            Self::Quarter => Some(3),
            Self::HalfYear => Some(6),
            Self::Year => Some(12),
            Self::TwoYears => Some(24),
            Self::Decade => Some(120),
        }
    }

    pub fn label_format(self) -> &'static str {
        match self {
            Self::Day | Self::Week => "%b %-d",
            Self::Month | Self::Quarter | Self::HalfYear => "%b %Y",
            Self::Year | Self::TwoYears | Self::Decade => "%Y",
        }
    }

    pub fn format_label(self, ms: i64) -> String {
        from_millis(ms)
            .map(|dt| dt.format(self.label_format()).to_string())
            .unwrap_or_default()
    }
}

fn midnight_ms(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

fn day_ticks(min_ms: i64, max_ms: i64, step_days: i64, monday_aligned: bool) -> Vec<i64> {
    let mut out = Vec::new();
    let Some(start) = from_millis(min_ms) else {
        return out;
    };
    let mut date = start.date_naive();
    if midnight_ms(date).is_some_and(|m| m < min_ms) {
        let Some(next) = date.succ_opt() else {
            return out;
        };
        date = next;
    }
    if monday_aligned {
        let offset = (7 - date.weekday().num_days_from_monday() as i64) % 7;
        let Some(aligned) = date.checked_add_signed(Duration::days(offset)) else {
            return out;
        };
        date = aligned;
    }
    while out.len() < MAX_TICKS {
        let Some(ms) = midnight_ms(date) else {
            break;
        };
        if ms > max_ms {
            break;
        }
        out.push(ms);
        let Some(next) = date.checked_add_signed(Duration::days(step_days)) else {
            break;
        };
        date = next;
    }
    out
}

fn month_ticks(min_ms: i64, max_ms: i64, step_months: i32) -> Vec<i64> {
    let mut out = Vec::new();
    let Some(start) = from_millis(min_ms) else {
        return out;
    };
    let mut idx = start.year() * 12 + start.month0() as i32;
    let first_of_month = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).and_then(midnight_ms);
    if first_of_month.is_some_and(|m| m < min_ms) {
        idx += 1;
    }
    let rem = idx.rem_euclid(step_months);
    if rem != 0 {
        idx += step_months - rem;
    }
    while out.len() < MAX_TICKS {
        let year = idx.div_euclid(12);
        let month = idx.rem_euclid(12) as u32 + 1;
        let Some(ms) = NaiveDate::from_ymd_opt(year, month, 1).and_then(midnight_ms) else {
            break;
        };
        if ms > max_ms {
            break;
        }
        out.push(ms);
        idx += step_months;
    }
    out
}

/// Linear scale over narrative (ordinal) time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrativeScale {
    min: f64,
    max: f64,
    range_start: f64,
    range_end: f64,
}

impl NarrativeScale {
    pub fn new(min: f64, max: f64, range_start: f64, range_end: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            range_start,
            range_end,
        }
    }

    /// Returns `None` for an empty event list.
    pub fn from_events(events: &[Event], range_start: f64, range_end: f64) -> Option<Self> {
        let mut it = events.iter().map(|e| e.narrative_time);
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some(Self::new(min, max, range_start, range_end))
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    pub fn map(&self, t: f64) -> f64 {
        if self.is_degenerate() {
            return (self.range_start + self.range_end) / 2.0;
        }
        let u = (t - self.min) / (self.max - self.min);
        self.range_start + u * (self.range_end - self.range_start)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let span = self.range_end - self.range_start;
        if self.is_degenerate() || span == 0.0 {
            return self.min;
        }
        self.min + (px - self.range_start) / span * (self.max - self.min)
    }

    pub fn tick_values(&self) -> Vec<f64> {
        if self.is_degenerate() {
            return vec![self.min];
        }
        let step = nice_step(self.max - self.min, 10.0);
        let first = (self.min / step).ceil();
        let mut out = Vec::new();
        let mut k = 0.0;
        while out.len() < MAX_TICKS {
            let v = (first + k) * step;
            if v > self.max + step * 1e-9 {
                break;
            }
            out.push(v);
            k += 1.0;
        }
        out
    }
}

/// A "nice" step (1, 2 or 5 × 10^k) splitting `span` into about `count` pieces.
fn nice_step(span: f64, count: f64) -> f64 {
    if !(span.is_finite() && span > 0.0 && count > 0.0) {
        return 1.0;
    }
    let step0 = span / count;
    let power = 10f64.powf(step0.log10().floor());
    let error = step0 / power;
    let factor = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    factor * power
}

fn format_narrative_value(v: f64) -> String {
    let nearest = v.round();
    let v = if (v - nearest).abs() < 1e-9 { nearest } else { v };
    if v == 0.0 {
        return "0".to_string();
    }
    format!("{v}")
}

/// Which extent of a label competes for space along the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    Horizontal,
    Vertical,
}

pub fn time_ticks(
    scale: &TimeScale,
    cfg: &ScaleConfig,
    measurer: &dyn TextMeasurer,
) -> Vec<TickLayout> {
    let interval = scale.tick_interval();
    let mut ticks: Vec<TickLayout> = scale
        .tick_values()
        .into_iter()
        .map(|ms| TickLayout {
            value: ms as f64,
            position: scale.map_ms(ms),
            label: interval.format_label(ms),
            label_visible: true,
        })
        .collect();
    hide_overlapping_labels(&mut ticks, cfg, measurer, AxisOrientation::Horizontal);
    ticks
}

pub fn narrative_ticks(
    scale: &NarrativeScale,
    cfg: &ScaleConfig,
    measurer: &dyn TextMeasurer,
    orientation: AxisOrientation,
) -> Vec<TickLayout> {
    let mut ticks: Vec<TickLayout> = scale
        .tick_values()
        .into_iter()
        .map(|v| TickLayout {
            value: v,
            position: scale.map(v),
            label: format_narrative_value(v),
            label_visible: true,
        })
        .collect();
    hide_overlapping_labels(&mut ticks, cfg, measurer, orientation);
    ticks
}

/// Walks ticks in axis order and hides every label that would come closer than
/// `cfg.label_padding` to the previous visible label. Tick marks are kept.
pub fn hide_overlapping_labels(
    ticks: &mut [TickLayout],
    cfg: &ScaleConfig,
    measurer: &dyn TextMeasurer,
    orientation: AxisOrientation,
) {
    let style = TextStyle {
        font_size: cfg.label_font_size,
    };
    let mut prev_end = f64::NEG_INFINITY;
    for tick in ticks.iter_mut() {
        let metrics = measurer.measure(&tick.label, &style);
        let extent = match orientation {
            AxisOrientation::Horizontal => metrics.width,
            AxisOrientation::Vertical => metrics.height,
        };
        let start = tick.position - extent / 2.0;
        if start < prev_end + cfg.label_padding {
            tick.label_visible = false;
            continue;
        }
        tick.label_visible = true;
        prev_end = tick.position + extent / 2.0;
    }
}
