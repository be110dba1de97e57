//! Layout configuration.
//!
//! Every knob has a representative default. Callers usually start from
//! [`LayoutConfig::default`] and layer a partial JSON document on top with
//! [`LayoutConfig::with_overrides`]; the merged result is validated before it is returned.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub nodes: NodeConfig,
    pub scale: ScaleConfig,
    pub grouping: GroupingConfig,
    pub force: ForceConfig,
    pub route: RouteConfig,
    pub columns: ColumnConfig,
    pub lanes: LaneConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    pub radius: f64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { radius: 6.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScaleConfig {
    /// Pixel extent of the horizontal (time) axis.
    pub width: f64,
    /// Pixel extent of the vertical (narrative) axis.
    pub height: f64,
    /// Power-law distortion applied to the normalized time position; `1.0` is linear.
    pub exponent: f64,
    pub label_font_size: f64,
    pub char_width_factor: f64,
    /// Minimum horizontal gap between two visible tick labels.
    pub label_padding: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
            exponent: 1.0,
            label_font_size: 11.0,
            char_width_factor: 0.6,
            label_padding: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupingConfig {
    pub gap_threshold: f64,
    /// Per-lane overrides of `gap_threshold`, keyed by lane id.
    pub lane_thresholds: IndexMap<String, f64>,
    /// Polarity magnitude at or below which an event lands in the `neutral` sentiment lane.
    pub sentiment_threshold: f64,
}

impl GroupingConfig {
    pub fn threshold_for(&self, lane: &str) -> f64 {
        self.lane_thresholds
            .get(lane)
            .copied()
            .unwrap_or(self.gap_threshold)
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            gap_threshold: 10.0,
            lane_thresholds: IndexMap::new(),
            sentiment_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
    pub iterations: usize,
    pub x_force_base: f64,
    pub x_force_max: f64,
    pub horizontal_link_base: f64,
    pub horizontal_link_max: f64,
    pub chain_strength: f64,
    pub collision_margin: f64,
    pub collision_strength: f64,
    pub min_node_spacing: f64,
    pub max_node_spacing: f64,
    /// Two mentions closer than this in narrative time count as simultaneous.
    pub time_epsilon: f64,
    pub velocity_decay: f64,
    pub alpha_min: f64,
    /// Keep relaxed nodes inside their entity column.
    pub clamp_to_column: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            x_force_base: 0.1,
            x_force_max: 0.5,
            horizontal_link_base: 0.2,
            horizontal_link_max: 0.8,
            chain_strength: 0.05,
            collision_margin: 2.0,
            collision_strength: 0.7,
            min_node_spacing: 14.0,
            max_node_spacing: 40.0,
            time_epsilon: 0.5,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            clamp_to_column: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteConfig {
    pub grid_size: f64,
    pub corner_radius: f64,
    /// Cap on the corner radius, and on the cut it takes from each leg, as a fraction of the
    /// shorter adjacent segment.
    pub corner_fraction: f64,
    /// Preferred segment directions in degrees, within `[0, 180]`.
    pub preferred_angles: Vec<f64>,
    pub min_segment_length: f64,
    pub smoothing: bool,
    /// Segments within this many degrees of a preferred angle are drawn straight.
    pub angle_tolerance: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            corner_radius: 8.0,
            corner_fraction: 0.5,
            preferred_angles: vec![0.0, 45.0, 90.0, 135.0, 180.0],
            min_segment_length: 12.0,
            smoothing: true,
            angle_tolerance: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnConfig {
    pub width: f64,
    pub gap: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            width: 80.0,
            gap: 20.0,
            padding_top: 24.0,
            padding_bottom: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaneConfig {
    pub height: f64,
    pub padding_top: f64,
    pub expanded_row_spacing: f64,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            height: 48.0,
            padding_top: 24.0,
            expanded_row_spacing: 18.0,
        }
    }
}

impl LayoutConfig {
    /// Deep-merges `overrides` onto the defaults and validates the result.
    pub fn with_overrides(overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(Self::default())?;
        deep_merge_value(&mut base, overrides);
        let cfg: Self = serde_json::from_value(base)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(text)?;
        Self::with_overrides(&overrides)
    }

    pub fn validate(&self) -> Result<()> {
        positive("nodes.radius", self.nodes.radius)?;

        let s = &self.scale;
        positive("scale.width", s.width)?;
        positive("scale.height", s.height)?;
        positive("scale.exponent", s.exponent)?;
        positive("scale.labelFontSize", s.label_font_size)?;
        positive("scale.charWidthFactor", s.char_width_factor)?;
        non_negative("scale.labelPadding", s.label_padding)?;

        let g = &self.grouping;
        non_negative("grouping.gapThreshold", g.gap_threshold)?;
        for (lane, v) in &g.lane_thresholds {
            non_negative(&format!("grouping.laneThresholds.{lane}"), *v)?;
        }
        non_negative("grouping.sentimentThreshold", g.sentiment_threshold)?;

        let f = &self.force;
        if f.iterations == 0 {
            return Err(Error::invalid_config("force.iterations", "must be at least 1"));
        }
        non_negative("force.xForceBase", f.x_force_base)?;
        non_negative("force.xForceMax", f.x_force_max)?;
        non_negative("force.horizontalLinkBase", f.horizontal_link_base)?;
        non_negative("force.horizontalLinkMax", f.horizontal_link_max)?;
        non_negative("force.chainStrength", f.chain_strength)?;
        non_negative("force.collisionMargin", f.collision_margin)?;
        unit_interval("force.collisionStrength", f.collision_strength)?;
        positive("force.minNodeSpacing", f.min_node_spacing)?;
        positive("force.maxNodeSpacing", f.max_node_spacing)?;
        if f.max_node_spacing < f.min_node_spacing {
            return Err(Error::invalid_config(
                "force.maxNodeSpacing",
                "must not be smaller than force.minNodeSpacing",
            ));
        }
        non_negative("force.timeEpsilon", f.time_epsilon)?;
        unit_interval("force.velocityDecay", f.velocity_decay)?;
        positive("force.alphaMin", f.alpha_min)?;
        if f.alpha_min >= 1.0 {
            return Err(Error::invalid_config("force.alphaMin", "must be below 1"));
        }

        let r = &self.route;
        positive("route.gridSize", r.grid_size)?;
        non_negative("route.cornerRadius", r.corner_radius)?;
        non_negative("route.cornerFraction", r.corner_fraction)?;
        if r.corner_fraction > 0.5 {
            return Err(Error::invalid_config(
                "route.cornerFraction",
                "must not exceed 0.5 (adjacent corners would overlap)",
            ));
        }
        if r.preferred_angles.is_empty() {
            return Err(Error::invalid_config(
                "route.preferredAngles",
                "must list at least one angle",
            ));
        }
        for a in &r.preferred_angles {
            if !a.is_finite() || !(0.0..=180.0).contains(a) {
                return Err(Error::invalid_config(
                    "route.preferredAngles",
                    format!("{a} is outside [0, 180]"),
                ));
            }
        }
        non_negative("route.minSegmentLength", r.min_segment_length)?;
        non_negative("route.angleTolerance", r.angle_tolerance)?;

        let c = &self.columns;
        positive("columns.width", c.width)?;
        non_negative("columns.gap", c.gap)?;
        non_negative("columns.paddingTop", c.padding_top)?;
        non_negative("columns.paddingBottom", c.padding_bottom)?;

        let l = &self.lanes;
        positive("lanes.height", l.height)?;
        non_negative("lanes.paddingTop", l.padding_top)?;
        positive("lanes.expandedRowSpacing", l.expanded_row_spacing)?;

        Ok(())
    }
}

fn positive(field: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(
            field,
            format!("{v} must be positive and finite"),
        ))
    }
}

fn non_negative(field: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(
            field,
            format!("{v} must be non-negative and finite"),
        ))
    }
}

fn unit_interval(field: &str, v: f64) -> Result<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(Error::invalid_config(field, format!("{v} must be within [0, 1]")))
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
