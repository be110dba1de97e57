use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

/// Nodes in a flat array; links address them by index.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn validate(&self) -> Result<()> {
        for n in &self.nodes {
            let bounds_ok = n.min_x.is_none_or(f64::is_finite) && n.max_x.is_none_or(f64::is_finite);
            if !(n.x.is_finite() && n.y.is_finite() && n.target_x.is_finite() && bounds_ok) {
                return Err(Error::NonFiniteCoordinate { node: n.id.clone() });
            }
        }
        for (idx, l) in self.links.iter().enumerate() {
            if l.a >= self.nodes.len() || l.b >= self.nodes.len() {
                return Err(Error::LinkOutOfRange {
                    link: idx,
                    node_count: self.nodes.len(),
                });
            }
        }
        Ok(())
    }

    /// Id → index lookup, built once per pass so links never hold ids.
    pub fn index_by_id(&self) -> FxHashMap<&str, usize> {
        let mut out: FxHashMap<&str, usize> = FxHashMap::default();
        out.reserve(self.nodes.len());
        for (idx, n) in self.nodes.iter().enumerate() {
            out.insert(n.id.as_str(), idx);
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    /// Starting horizontal position.
    pub x: f64,
    /// Pinned vertical position. Never relaxed.
    pub y: f64,
    /// Column center the node is attracted to.
    pub target_x: f64,
    pub target_strength: f64,
    /// Fixed nodes act as obstacles but never move.
    pub fixed: bool,
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            target_x: x,
            target_strength: 0.0,
            fixed: false,
            min_x: None,
            max_x: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Two mentions at (nearly) the same narrative time.
    SameTime,
    /// Two time-consecutive mentions of one entity.
    SameEntity,
}

#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub kind: LinkKind,
    /// Link strength.
    pub weight: f64,
    /// Target center-to-center distance.
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct LayoutResult {
    /// Final positions, in node order.
    pub positions: Vec<Point>,
    pub iterations: usize,
}
