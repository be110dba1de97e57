#![forbid(unsafe_code)]

//! Headless layout for temporal event visualizations.
//!
//! Every entry point is a pure function of the events, the configuration and (for lanes) the
//! caller-owned [`expand::ExpandState`]. Output types carry geometry only and serialize to
//! camelCase JSON.

pub mod columns;
pub mod curve;
pub mod expand;
pub mod grouping;
pub mod lanes;
pub mod model;
pub mod route;
pub mod scale;
pub mod text;

use crate::expand::ExpandState;
use crate::grouping::LaneKind;
use crate::lanes::{LaneAxis, LaneOptions};
use crate::model::{EntityColumnsLayout, LaneLayout, TimeCurveLayout};
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use chrono::{DateTime, Utc};
use chronolane_core::Event;
use chronolane_core::config::LayoutConfig;
use serde::Serialize;
use std::sync::Arc;

pub use columns::layout_entity_columns;
pub use curve::layout_time_curve;
pub use lanes::layout_lanes;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] chronolane_core::Error),
    #[error(transparent)]
    Force(#[from] chronolane_force::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    /// Reference instant for events without real time; defaults to the end of the time axis.
    pub reference: Option<DateTime<Utc>>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            reference: None,
        }
    }
}

impl LayoutOptions {
    /// Deterministic measurer using the configured character width factor.
    pub fn for_config(cfg: &LayoutConfig) -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::with_char_width_factor(
                cfg.scale.char_width_factor,
            )),
            reference: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Columns,
    Lanes { kind: LaneKind, axis: LaneAxis },
    TimeCurve,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ViewLayout {
    Columns(EntityColumnsLayout),
    Lanes(LaneLayout),
    TimeCurve(TimeCurveLayout),
}

pub fn layout_view(
    events: &[Event],
    view: View,
    cfg: &LayoutConfig,
    state: &ExpandState,
    options: &LayoutOptions,
) -> Result<ViewLayout> {
    let measurer = options.text_measurer.as_ref();
    Ok(match view {
        View::Columns => ViewLayout::Columns(layout_entity_columns(events, cfg, measurer)?),
        View::Lanes { kind, axis } => {
            let opts = LaneOptions {
                kind,
                axis,
                reference: options.reference,
            };
            ViewLayout::Lanes(layout_lanes(events, &opts, cfg, state, measurer)?)
        }
        View::TimeCurve => ViewLayout::TimeCurve(layout_time_curve(
            events,
            cfg,
            options.reference,
            measurer,
        )?),
    })
}
