#![forbid(unsafe_code)]

//! `chronolane` is a headless layout engine for temporal event visualizations.
//!
//! The core crate (re-exported at the root) holds the event model, lenient JSON loading and the
//! layout configuration. Geometry lives behind the `layout` feature.
//!
//! # Features
//!
//! - `layout`: enable scales, grouping, column relaxation and routing (`chronolane::layout`)

pub use chronolane_core::*;

#[cfg(feature = "layout")]
pub mod layout {
    pub use chronolane_layout::expand::ExpandState;
    pub use chronolane_layout::grouping::LaneKind;
    pub use chronolane_layout::lanes::{LaneAxis, LaneOptions};
    pub use chronolane_layout::model;
    pub use chronolane_layout::route::{Path, PathCommand};
    pub use chronolane_layout::scale;
    pub use chronolane_layout::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use chronolane_layout::{
        LayoutOptions, View, ViewLayout, layout_entity_columns, layout_lanes, layout_time_curve,
        layout_view,
    };

    use chronolane_core::LayoutConfig;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Input(#[from] chronolane_core::Error),
        #[error(transparent)]
        Layout(#[from] chronolane_layout::Error),
        #[error("failed to serialize layout: {0}")]
        Serialize(#[from] serde_json::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Loads events from JSON text and lays out `view` in one call.
    pub fn layout_json(
        text: &str,
        view: View,
        config: &LayoutConfig,
        state: &ExpandState,
        options: &LayoutOptions,
    ) -> Result<ViewLayout> {
        let events = chronolane_core::events_from_json_str(text)?;
        Ok(layout_view(&events, view, config, state, options)?)
    }

    /// Like [`layout_json`], returning the layout as a JSON value ready to hand to a renderer.
    pub fn layout_json_value(
        text: &str,
        view: View,
        config: &LayoutConfig,
        state: &ExpandState,
        options: &LayoutOptions,
    ) -> Result<serde_json::Value> {
        let layout = layout_json(text, view, config, state, options)?;
        Ok(serde_json::to_value(&layout)?)
    }
}
